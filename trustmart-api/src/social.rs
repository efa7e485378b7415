//! Backend half of social account linking.

use async_trait::async_trait;
use serde::de::IgnoredAny;
use serde::Deserialize;
use trustmart_auth::{Challenge, FinishConnect, SocialConnector};
use trustmart_core::{Envelope, HttpResult};
use trustmart_http::HttpClient;

/// Payload of `connect/start`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectStartData {
    /// Provider URL to send the user to.
    pub authorization_url: String,
}

/// Social connect endpoints under `{backend}/api/v1/social/{provider}`.
///
/// These live on the backend origin rather than under the API base URL, so
/// requests go out with absolute URLs.
#[derive(Debug, Clone)]
pub struct SocialApi {
    http: HttpClient,
    backend_url: String,
}

impl SocialApi {
    /// Create over a request layer and the backend origin.
    pub fn new(http: HttpClient, backend_url: impl Into<String>) -> Self {
        Self {
            http,
            backend_url: backend_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn endpoint(&self, provider: &str, action: &str) -> String {
        format!(
            "{}/api/v1/social/{}/connect/{}",
            self.backend_url,
            urlencoding::encode(provider),
            action
        )
    }

    /// Ask the backend for an authorization URL carrying `challenge`.
    pub async fn start_connect(
        &self,
        provider: &str,
        challenge: &str,
        redirect_uri: &str,
    ) -> HttpResult<String> {
        let url = format!(
            "{}?code_challenge={}&redirect_uri={}",
            self.endpoint(provider, "start"),
            urlencoding::encode(challenge),
            urlencoding::encode(redirect_uri)
        );
        let response: Envelope<ConnectStartData> = self.http.get(&url, None).await?;
        Ok(response.data.authorization_url)
    }

    /// Complete the exchange with the authorization code and verifier.
    pub async fn finish_connect(&self, provider: &str, request: &FinishConnect) -> HttpResult<()> {
        let _: IgnoredAny = self
            .http
            .post(&self.endpoint(provider, "finish"), Some(request), None)
            .await?;
        Ok(())
    }
}

#[async_trait]
impl SocialConnector for SocialApi {
    async fn start_connect(
        &self,
        provider: &str,
        challenge: &Challenge,
        redirect_uri: &str,
    ) -> HttpResult<String> {
        SocialApi::start_connect(self, provider, challenge.as_str(), redirect_uri).await
    }

    async fn finish_connect(&self, provider: &str, request: &FinishConnect) -> HttpResult<()> {
        SocialApi::finish_connect(self, provider, request).await
    }
}
