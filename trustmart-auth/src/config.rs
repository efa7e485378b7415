//! Connect provider configuration.

use std::collections::BTreeMap;
use trustmart_http::ClientConfig;

/// How the authorization URL is obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorizationStrategy {
    /// Build the provider URL on the client.
    Direct {
        /// Provider authorization endpoint.
        authorize_url: String,
        /// OAuth client id. `None` until configured.
        client_id: Option<String>,
    },
    /// Ask the backend's `connect/start` endpoint for the URL.
    Backend,
}

/// Configuration for one connect provider.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Provider key, used in endpoint paths and storage keys.
    pub name: String,
    /// Name shown in notices.
    pub display_name: String,
    /// Where the authorization URL comes from.
    pub strategy: AuthorizationStrategy,
    /// OAuth scopes, in the provider's own separator convention.
    pub scope: String,
    /// Expected `state` nonce, for providers that use a fixed one.
    pub state: Option<String>,
    /// Callback path on the storefront.
    pub redirect_path: String,
}

impl ProviderConfig {
    /// Create a provider that builds its URL on the client.
    pub fn direct(
        name: impl Into<String>,
        display_name: impl Into<String>,
        authorize_url: impl Into<String>,
    ) -> Self {
        let name = name.into();
        Self {
            redirect_path: format!("oauth/{}/callback", name),
            name,
            display_name: display_name.into(),
            strategy: AuthorizationStrategy::Direct {
                authorize_url: authorize_url.into(),
                client_id: None,
            },
            scope: String::new(),
            state: None,
        }
    }

    /// Create a provider whose URL comes from the backend.
    pub fn backend(name: impl Into<String>, display_name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            redirect_path: format!("oauth/{}/callback", name),
            name,
            display_name: display_name.into(),
            strategy: AuthorizationStrategy::Backend,
            scope: String::new(),
            state: None,
        }
    }

    /// Set the client id. Ignored for backend-started providers.
    #[must_use]
    pub fn with_client_id(mut self, id: impl Into<String>) -> Self {
        if let AuthorizationStrategy::Direct { client_id, .. } = &mut self.strategy {
            *client_id = Some(id.into());
        }
        self
    }

    /// Set scopes.
    #[must_use]
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }

    /// Require a fixed `state` nonce on the callback.
    #[must_use]
    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }

    /// Set the callback path.
    #[must_use]
    pub fn with_redirect_path(mut self, path: impl Into<String>) -> Self {
        self.redirect_path = path.into();
        self
    }

    /// Redirect URI under the given storefront origin.
    pub fn redirect_uri(&self, app_url: &str) -> String {
        let host = app_url.trim_end_matches('/');
        let path = self.redirect_path.trim_start_matches('/');
        format!("{}/{}", host, path)
    }
}

/// Twitter (X) OAuth 2.0 configuration.
pub fn twitter_config() -> ProviderConfig {
    ProviderConfig::direct("twitter", "Twitter", "https://twitter.com/i/oauth2/authorize")
        .with_scope("tweet.read users.read offline.access")
        .with_state("twitter_connect")
}

/// Facebook configuration; the backend builds the URL.
pub fn facebook_config() -> ProviderConfig {
    ProviderConfig::backend("facebook", "Facebook")
}

/// Instagram basic display configuration.
pub fn instagram_config() -> ProviderConfig {
    ProviderConfig::direct("instagram", "Instagram", "https://api.instagram.com/oauth/authorize")
        .with_scope("user_profile,user_media")
}

/// All connect providers plus the storefront origin.
#[derive(Debug, Clone)]
pub struct ConnectConfig {
    /// Storefront origin, for redirect URIs.
    pub app_url: String,
    providers: BTreeMap<String, ProviderConfig>,
}

impl ConnectConfig {
    /// Create an empty configuration.
    pub fn new(app_url: impl Into<String>) -> Self {
        Self {
            app_url: app_url.into(),
            providers: BTreeMap::new(),
        }
    }

    /// Built-in providers under the client's origins.
    ///
    /// Client ids are read from `TRUSTMART_<PROVIDER>_CLIENT_ID`.
    pub fn from_client_config(config: &ClientConfig) -> Self {
        let mut connect = Self::new(&config.app_url);
        for provider in [twitter_config(), facebook_config(), instagram_config()] {
            let var = format!("TRUSTMART_{}_CLIENT_ID", provider.name.to_uppercase());
            let provider = match std::env::var(var) {
                Ok(id) => provider.with_client_id(id),
                Err(_) => provider,
            };
            connect.register(provider);
        }
        connect
    }

    /// Add or replace a provider.
    pub fn register(&mut self, provider: ProviderConfig) {
        self.providers.insert(provider.name.clone(), provider);
    }

    /// Add a provider, builder style.
    #[must_use]
    pub fn with_provider(mut self, provider: ProviderConfig) -> Self {
        self.register(provider);
        self
    }

    /// Look up a provider.
    pub fn provider(&self, name: &str) -> Option<&ProviderConfig> {
        self.providers.get(name)
    }

    /// Registered provider names.
    pub fn provider_names(&self) -> impl Iterator<Item = &str> {
        self.providers.keys().map(String::as_str)
    }
}
