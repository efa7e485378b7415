//! Client configuration.

use reqwest::Client;
use std::time::Duration;
use trustmart_core::ConfigError;
use url::Url;

/// Default API base, including the version prefix.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:3033/api/v1";
/// Default backend origin, used for the social connect endpoints.
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:3033";
/// Default origin of the storefront, used to build OAuth redirect URIs.
pub const DEFAULT_APP_URL: &str = "http://localhost:3000";
/// Default public IPFS gateway.
pub const DEFAULT_GATEWAY_URL: &str = "https://gateway.pinata.cloud";
/// Fixed request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Where the client talks to and how long it waits.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL request paths are appended to.
    pub api_base_url: String,
    /// Backend origin for endpoints outside the versioned API.
    pub backend_url: String,
    /// Storefront origin.
    pub app_url: String,
    /// Image pinning endpoint. Defaults to `{app_url}/api/upload/pinata`.
    pub upload_url: Option<String>,
    /// Public gateway serving pinned content.
    pub gateway_url: String,
    /// Request timeout.
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            app_url: DEFAULT_APP_URL.to_string(),
            upload_url: None,
            gateway_url: DEFAULT_GATEWAY_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl ClientConfig {
    /// Create a config with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the API base URL.
    #[must_use]
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    /// Set the backend origin.
    #[must_use]
    pub fn with_backend_url(mut self, url: impl Into<String>) -> Self {
        self.backend_url = url.into();
        self
    }

    /// Set the storefront origin.
    #[must_use]
    pub fn with_app_url(mut self, url: impl Into<String>) -> Self {
        self.app_url = url.into();
        self
    }

    /// Set the pinning endpoint.
    #[must_use]
    pub fn with_upload_url(mut self, url: impl Into<String>) -> Self {
        self.upload_url = Some(url.into());
        self
    }

    /// Set the gateway.
    #[must_use]
    pub fn with_gateway_url(mut self, url: impl Into<String>) -> Self {
        self.gateway_url = url.into();
        self
    }

    /// Set the timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Effective pinning endpoint.
    pub fn upload_url(&self) -> String {
        match &self.upload_url {
            Some(url) => url.clone(),
            None => format!("{}/api/upload/pinata", self.app_url.trim_end_matches('/')),
        }
    }

    /// Load from environment variables, falling back to defaults.
    ///
    /// Looks for:
    /// - `TRUSTMART_API_BASE_URL`
    /// - `TRUSTMART_BACKEND_URL`
    /// - `TRUSTMART_APP_URL`
    /// - `TRUSTMART_UPLOAD_URL`
    /// - `TRUSTMART_GATEWAY_URL` (a bare host is accepted)
    /// - `TRUSTMART_TIMEOUT_SECS`
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(url) = env_url("TRUSTMART_API_BASE_URL")? {
            config.api_base_url = url;
        }
        if let Some(url) = env_url("TRUSTMART_BACKEND_URL")? {
            config.backend_url = url;
        }
        if let Some(url) = env_url("TRUSTMART_APP_URL")? {
            config.app_url = url;
        }
        if let Some(url) = env_url("TRUSTMART_UPLOAD_URL")? {
            config.upload_url = Some(url);
        }
        if let Ok(gateway) = std::env::var("TRUSTMART_GATEWAY_URL") {
            config.gateway_url = if gateway.contains("://") {
                gateway
            } else {
                format!("https://{}", gateway)
            };
        }
        if let Ok(secs) = std::env::var("TRUSTMART_TIMEOUT_SECS") {
            let parsed = secs.parse::<u64>().map_err(|_| ConfigError::InvalidValue {
                var: "TRUSTMART_TIMEOUT_SECS".to_string(),
                value: secs.clone(),
            })?;
            config.timeout = Duration::from_secs(parsed);
        }

        Ok(config)
    }

    /// Build an HTTP client with this config.
    pub fn build_client(&self) -> Result<Client, ConfigError> {
        Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))
    }
}

fn env_url(var: &str) -> Result<Option<String>, ConfigError> {
    match std::env::var(var) {
        Ok(value) => {
            Url::parse(&value).map_err(|e| ConfigError::InvalidUrl {
                var: var.to_string(),
                reason: e.to_string(),
            })?;
            Ok(Some(value))
        }
        Err(_) => Ok(None),
    }
}
