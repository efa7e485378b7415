//! Parsing of the provider's redirect back to the storefront.

use url::Url;

/// Query parameters of an OAuth callback.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallbackQuery {
    /// Authorization code.
    pub code: Option<String>,
    /// State nonce echoed by the provider.
    pub state: Option<String>,
    /// Error reported by the provider (e.g. `access_denied`).
    pub error: Option<String>,
    /// Human-readable error detail.
    pub error_description: Option<String>,
}

impl CallbackQuery {
    /// Parse a query string, with or without the leading `?`.
    ///
    /// Empty values count as absent.
    pub fn parse(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        let mut out = Self::default();

        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            if value.is_empty() {
                continue;
            }
            let slot = match key.as_ref() {
                "code" => &mut out.code,
                "state" => &mut out.state,
                "error" => &mut out.error,
                "error_description" => &mut out.error_description,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value.into_owned());
            }
        }

        out
    }

    /// Parse the query of a full callback URL.
    pub fn from_url(url: &Url) -> Self {
        Self::parse(url.query().unwrap_or(""))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_code_and_state() {
        let query = CallbackQuery::parse("?code=abc%2F123&state=twitter_connect");
        assert_eq!(query.code.as_deref(), Some("abc/123"));
        assert_eq!(query.state.as_deref(), Some("twitter_connect"));
        assert!(query.error.is_none());
    }

    #[test]
    fn test_parse_error() {
        let query = CallbackQuery::parse("error=access_denied&error_description=User+denied");
        assert_eq!(query.error.as_deref(), Some("access_denied"));
        assert_eq!(query.error_description.as_deref(), Some("User denied"));
        assert!(query.code.is_none());
    }

    #[test]
    fn test_empty_values_are_absent() {
        let query = CallbackQuery::parse("code=&state=x");
        assert!(query.code.is_none());
        assert_eq!(query.state.as_deref(), Some("x"));
    }

    #[test]
    fn test_first_value_wins() {
        let query = CallbackQuery::parse("code=first&code=second");
        assert_eq!(query.code.as_deref(), Some("first"));
    }

    #[test]
    fn test_from_url() {
        let url = Url::parse("http://localhost:3000/oauth/facebook/callback?code=xyz").unwrap();
        assert_eq!(
            CallbackQuery::from_url(&url),
            CallbackQuery {
                code: Some("xyz".to_string()),
                ..Default::default()
            }
        );

        let bare = Url::parse("http://localhost:3000/oauth/facebook/callback").unwrap();
        assert_eq!(CallbackQuery::from_url(&bare), CallbackQuery::default());
    }
}
