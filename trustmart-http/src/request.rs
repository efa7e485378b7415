//! Per-request options.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, AUTHORIZATION};
use std::time::Duration;
use trustmart_core::{codes, HttpError, HttpResult};

/// Options for a single request.
///
/// Headers set here win over the client defaults, and an explicit
/// `Authorization` header suppresses token injection.
#[derive(Debug, Clone, Default)]
pub struct RequestConfig {
    /// Extra headers.
    pub headers: HeaderMap,
    /// Query parameters appended to the URL.
    pub query: Vec<(String, String)>,
    /// Timeout override.
    pub timeout: Option<Duration>,
    /// Skip token injection even when a token is held.
    pub anonymous: bool,
}

impl RequestConfig {
    /// Empty options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Options for an unauthenticated call (login, signup, verification).
    pub fn anonymous() -> Self {
        Self {
            anonymous: true,
            ..Default::default()
        }
    }

    /// Add a header.
    #[must_use]
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Add a header from strings, rejecting invalid names or values.
    pub fn try_with_header(self, name: &str, value: &str) -> HttpResult<Self> {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| HttpError::transport(codes::INVALID_HEADER, format!("{}: {}", name, e)))?;
        let value = HeaderValue::from_str(value).map_err(|e| {
            HttpError::transport(codes::INVALID_HEADER, format!("{}: {}", name, e))
        })?;
        Ok(self.with_header(name, value))
    }

    /// Send an explicit bearer token instead of the stored one.
    pub fn with_bearer(self, token: &str) -> HttpResult<Self> {
        self.try_with_header(AUTHORIZATION.as_str(), &format!("Bearer {}", token))
    }

    /// Add a query parameter.
    #[must_use]
    pub fn with_query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    /// Override the timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Whether the caller set `Authorization` explicitly.
    pub fn has_authorization(&self) -> bool {
        self.headers.contains_key(AUTHORIZATION)
    }
}
