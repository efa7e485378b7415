//! OAuth connect flow execution.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};
use trustmart_core::{ConnectError, HttpError, HttpResult};
use trustmart_http::SessionStore;
use url::Url;

use crate::callback::CallbackQuery;
use crate::config::{AuthorizationStrategy, ConnectConfig, ProviderConfig};
use crate::pkce::{Challenge, PkceGenerator, Verifier, CHALLENGE_METHOD};

/// Route the UI returns to once a handshake ends, whatever the outcome.
pub const RETURN_ROUTE: &str = "/dashboard";

/// Storage key holding the verifier for a provider's in-flight handshake.
pub fn verifier_key(provider: &str) -> String {
    format!("{}_pkce_verifier", provider)
}

/// Body of the backend's `connect/finish` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinishConnect {
    /// Authorization code from the callback.
    pub code: String,
    /// Verifier stored by [`ConnectFlow::begin`].
    pub code_verifier: String,
    /// Redirect URI sent with the authorization request.
    pub redirect_uri: String,
}

/// Backend side of the handshake.
#[async_trait]
pub trait SocialConnector: Send + Sync {
    /// Ask the backend for a provider authorization URL.
    async fn start_connect(
        &self,
        provider: &str,
        challenge: &Challenge,
        redirect_uri: &str,
    ) -> HttpResult<String>;

    /// Hand the authorization code and verifier to the backend.
    async fn finish_connect(&self, provider: &str, request: &FinishConnect) -> HttpResult<()>;
}

/// Result of [`ConnectFlow::begin`]: where to send the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectStart {
    /// Provider name.
    pub provider: String,
    /// URL to open in the user agent.
    pub authorization_url: String,
    /// Where the provider sends the user back.
    pub redirect_uri: String,
}

/// Severity of a user-facing notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    /// The action succeeded.
    Success,
    /// Informational, nothing went wrong.
    Info,
    /// The action failed.
    Error,
}

/// Non-blocking message for the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// Severity.
    pub level: NoticeLevel,
    /// Text shown to the user.
    pub message: String,
}

impl Notice {
    fn new(level: NoticeLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }
}

/// How a handshake ended.
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectStatus {
    /// Backend accepted the code; the verifier was discarded.
    Connected,
    /// The provider reported an error, usually the user declining. The
    /// verifier is left in place.
    Cancelled,
    /// No code, or the state nonce did not match. The backend was not called.
    InvalidCallback,
    /// No verifier stored for the provider. The backend was not called.
    MissingVerifier,
    /// Backend refused the exchange.
    Failed {
        /// The normalized backend error.
        error: HttpError,
        /// Whether the verifier was kept for a user retry.
        verifier_retained: bool,
    },
}

/// Outcome of [`ConnectFlow::complete`].
///
/// Every outcome returns the UI to an interactive state; none is fatal.
#[derive(Debug, Clone, PartialEq)]
pub struct ConnectOutcome {
    /// Provider name.
    pub provider: String,
    /// How the handshake ended.
    pub status: ConnectStatus,
    /// Message for the UI.
    pub notice: Notice,
}

impl ConnectOutcome {
    /// Whether the account is now linked.
    pub fn is_connected(&self) -> bool {
        matches!(self.status, ConnectStatus::Connected)
    }

    /// Route to navigate to next.
    pub fn redirect_to(&self) -> &'static str {
        RETURN_ROUTE
    }
}

/// Orchestrates the account-linking handshake.
///
/// Verifiers are kept in the injected session store under
/// [`verifier_key`]. Two concurrent attempts for the same provider overwrite
/// each other's verifier; the last one started is the one that can finish.
#[derive(Clone)]
pub struct ConnectFlow {
    config: ConnectConfig,
    verifiers: Arc<dyn SessionStore>,
    connector: Arc<dyn SocialConnector>,
    pkce: PkceGenerator,
}

impl std::fmt::Debug for ConnectFlow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectFlow")
            .field("config", &self.config)
            .field("pkce", &self.pkce)
            .finish_non_exhaustive()
    }
}

impl ConnectFlow {
    /// Create a flow.
    pub fn new(
        config: ConnectConfig,
        verifiers: Arc<dyn SessionStore>,
        connector: Arc<dyn SocialConnector>,
    ) -> Self {
        Self {
            config,
            verifiers,
            connector,
            pkce: PkceGenerator::system(),
        }
    }

    /// Use a custom PKCE generator.
    #[must_use]
    pub fn with_pkce(mut self, pkce: PkceGenerator) -> Self {
        self.pkce = pkce;
        self
    }

    /// Provider configuration.
    pub fn config(&self) -> &ConnectConfig {
        &self.config
    }

    /// Verifier currently stored for a provider.
    pub fn pending_verifier(&self, provider: &str) -> Option<Verifier> {
        self.verifiers.get(&verifier_key(provider)).map(Verifier::new)
    }

    fn provider(&self, name: &str) -> Result<&ProviderConfig, ConnectError> {
        self.config
            .provider(name)
            .ok_or_else(|| ConnectError::UnknownProvider(name.to_string()))
    }

    /// Start a handshake.
    ///
    /// Generates a PKCE pair, obtains the authorization URL carrying the
    /// challenge, and stores the verifier for [`complete`](Self::complete).
    /// The verifier is only stored once the URL exists, so a failed start
    /// leaves no stale state.
    pub async fn begin(&self, provider: &str) -> Result<ConnectStart, ConnectError> {
        let config = self.provider(provider)?;
        if let AuthorizationStrategy::Direct { client_id: None, .. } = config.strategy {
            return Err(ConnectError::MissingClientId(provider.to_string()));
        }

        let pair = self.pkce.create_pair()?;
        let redirect_uri = config.redirect_uri(&self.config.app_url);

        let authorization_url = match &config.strategy {
            AuthorizationStrategy::Direct {
                authorize_url,
                client_id,
            } => build_authorization_url(
                authorize_url,
                client_id.as_deref().unwrap_or_default(),
                config,
                &pair.challenge,
                &redirect_uri,
            )?,
            AuthorizationStrategy::Backend => {
                let url = self
                    .connector
                    .start_connect(provider, &pair.challenge, &redirect_uri)
                    .await?;
                Url::parse(&url)
                    .map_err(|e| ConnectError::InvalidAuthorizationUrl(format!("{}: {}", url, e)))?;
                url
            }
        };

        self.verifiers
            .set(&verifier_key(provider), pair.verifier.as_str());
        info!(provider = %provider, "Connect handshake started");

        Ok(ConnectStart {
            provider: provider.to_string(),
            authorization_url,
            redirect_uri,
        })
    }

    /// Finish a handshake from the provider's callback query.
    ///
    /// Only configuration faults are errors. Cancellation, forged or
    /// incomplete callbacks and backend refusals come back as outcomes.
    pub async fn complete(
        &self,
        provider: &str,
        query: &CallbackQuery,
    ) -> Result<ConnectOutcome, ConnectError> {
        let config = self.provider(provider)?;
        let name = config.display_name.as_str();
        let key = verifier_key(provider);

        let outcome = |status, level, message: String| ConnectOutcome {
            provider: provider.to_string(),
            status,
            notice: Notice::new(level, message),
        };

        // Leaves the verifier for a genuine callback still in flight; the
        // next `begin` overwrites it.
        if let Some(error) = &query.error {
            info!(provider = %provider, error = %error, "Connect cancelled by provider");
            return Ok(outcome(
                ConnectStatus::Cancelled,
                NoticeLevel::Info,
                format!("{} connect cancelled", name),
            ));
        }

        let state_ok = match &config.state {
            Some(expected) => query.state.as_deref() == Some(expected.as_str()),
            None => true,
        };
        let code = match &query.code {
            Some(code) if state_ok => code.clone(),
            _ => {
                warn!(provider = %provider, has_code = query.code.is_some(), state_ok, "Rejected connect callback");
                return Ok(outcome(
                    ConnectStatus::InvalidCallback,
                    NoticeLevel::Error,
                    format!("Invalid {} callback", name),
                ));
            }
        };

        let Some(verifier) = self.verifiers.get(&key) else {
            warn!(provider = %provider, "No stored verifier for connect callback");
            return Ok(outcome(
                ConnectStatus::MissingVerifier,
                NoticeLevel::Error,
                "Missing verification code".to_string(),
            ));
        };

        let request = FinishConnect {
            code,
            code_verifier: verifier,
            redirect_uri: config.redirect_uri(&self.config.app_url),
        };

        debug!(provider = %provider, "Finishing connect handshake");
        match self.connector.finish_connect(provider, &request).await {
            Ok(()) => {
                self.verifiers.remove(&key);
                info!(provider = %provider, "Connect handshake completed");
                Ok(outcome(
                    ConnectStatus::Connected,
                    NoticeLevel::Success,
                    format!("{} account connected", name),
                ))
            }
            Err(error) => {
                let verifier_retained = error.is_retryable();
                if !verifier_retained {
                    self.verifiers.remove(&key);
                }
                warn!(
                    provider = %provider,
                    status = ?error.status,
                    verifier_retained,
                    message = %error.message,
                    "Connect handshake failed"
                );
                let message = error.message.clone();
                Ok(outcome(
                    ConnectStatus::Failed {
                        error,
                        verifier_retained,
                    },
                    NoticeLevel::Error,
                    message,
                ))
            }
        }
    }
}

fn build_authorization_url(
    authorize_url: &str,
    client_id: &str,
    config: &ProviderConfig,
    challenge: &Challenge,
    redirect_uri: &str,
) -> Result<String, ConnectError> {
    let mut params = vec![
        ("response_type", "code"),
        ("client_id", client_id),
        ("redirect_uri", redirect_uri),
    ];
    if !config.scope.is_empty() {
        params.push(("scope", config.scope.as_str()));
    }
    if let Some(state) = &config.state {
        params.push(("state", state.as_str()));
    }
    params.push(("code_challenge", challenge.as_str()));
    params.push(("code_challenge_method", CHALLENGE_METHOD));

    Url::parse_with_params(authorize_url, &params)
        .map(String::from)
        .map_err(|e| ConnectError::InvalidAuthorizationUrl(format!("{}: {}", authorize_url, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{facebook_config, twitter_config};
    use crate::pkce::{derive_challenge, EntropySource};
    use parking_lot::Mutex;
    use pretty_assertions::assert_eq;
    use trustmart_core::PkceError;
    use trustmart_http::MemoryStore;

    #[derive(Default)]
    struct RecordingConnector {
        started: Mutex<Vec<(String, String, String)>>,
        finished: Mutex<Vec<(String, FinishConnect)>>,
        start_url: Option<String>,
        finish_error: Option<HttpError>,
    }

    #[async_trait]
    impl SocialConnector for RecordingConnector {
        async fn start_connect(
            &self,
            provider: &str,
            challenge: &Challenge,
            redirect_uri: &str,
        ) -> HttpResult<String> {
            self.started.lock().push((
                provider.to_string(),
                challenge.to_string(),
                redirect_uri.to_string(),
            ));
            self.start_url
                .clone()
                .ok_or_else(|| HttpError::new("start unavailable").with_status(503))
        }

        async fn finish_connect(&self, provider: &str, request: &FinishConnect) -> HttpResult<()> {
            self.finished.lock().push((provider.to_string(), request.clone()));
            match &self.finish_error {
                Some(err) => Err(err.clone()),
                None => Ok(()),
            }
        }
    }

    fn connect_config() -> ConnectConfig {
        ConnectConfig::new("http://localhost:3000")
            .with_provider(twitter_config().with_client_id("tw-client"))
            .with_provider(facebook_config())
    }

    fn flow_with(connector: Arc<RecordingConnector>) -> (ConnectFlow, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let flow = ConnectFlow::new(connect_config(), store.clone(), connector);
        (flow, store)
    }

    #[tokio::test]
    async fn test_cancelled_callback_skips_backend() {
        let connector = Arc::new(RecordingConnector::default());
        let (flow, store) = flow_with(connector.clone());
        store.set(&verifier_key("twitter"), "v");

        let outcome = flow
            .complete("twitter", &CallbackQuery::parse("?error=access_denied"))
            .await
            .unwrap();

        assert_eq!(outcome.status, ConnectStatus::Cancelled);
        assert_eq!(outcome.notice.level, NoticeLevel::Info);
        assert_eq!(outcome.notice.message, "Twitter connect cancelled");
        assert_eq!(outcome.redirect_to(), "/dashboard");
        assert!(connector.finished.lock().is_empty());
        assert_eq!(store.get(&verifier_key("twitter")).as_deref(), Some("v"));
    }

    #[tokio::test]
    async fn test_cancel_does_not_spoil_pending_handshake() {
        let connector = Arc::new(RecordingConnector::default());
        let (flow, _store) = flow_with(connector.clone());
        flow.begin("twitter").await.unwrap();
        let pending = flow.pending_verifier("twitter").unwrap();

        let cancelled = flow
            .complete("twitter", &CallbackQuery::parse("?error=access_denied"))
            .await
            .unwrap();
        assert_eq!(cancelled.status, ConnectStatus::Cancelled);

        let outcome = flow
            .complete("twitter", &CallbackQuery::parse("?code=abc&state=twitter_connect"))
            .await
            .unwrap();
        assert!(outcome.is_connected());
        let finished = connector.finished.lock();
        assert_eq!(finished[0].1.code_verifier, pending.as_str());
        assert!(flow.pending_verifier("twitter").is_none());
    }

    #[tokio::test]
    async fn test_missing_verifier_skips_backend() {
        let connector = Arc::new(RecordingConnector::default());
        let (flow, _store) = flow_with(connector.clone());

        let outcome = flow
            .complete("twitter", &CallbackQuery::parse("code=abc&state=twitter_connect"))
            .await
            .unwrap();

        assert_eq!(outcome.status, ConnectStatus::MissingVerifier);
        assert_eq!(outcome.notice.level, NoticeLevel::Error);
        assert_eq!(outcome.notice.message, "Missing verification code");
        assert!(connector.finished.lock().is_empty());
    }

    #[tokio::test]
    async fn test_state_mismatch_is_invalid() {
        let connector = Arc::new(RecordingConnector::default());
        let (flow, store) = flow_with(connector.clone());
        store.set(&verifier_key("twitter"), "v");

        for query in ["code=abc&state=forged", "code=abc", "state=twitter_connect"] {
            let outcome = flow
                .complete("twitter", &CallbackQuery::parse(query))
                .await
                .unwrap();
            assert_eq!(outcome.status, ConnectStatus::InvalidCallback, "query {}", query);
            assert_eq!(outcome.notice.message, "Invalid Twitter callback");
        }
        assert!(connector.finished.lock().is_empty());
        // A forged callback must not destroy the genuine attempt.
        assert_eq!(store.get(&verifier_key("twitter")).as_deref(), Some("v"));
    }

    #[tokio::test]
    async fn test_happy_path_sends_stored_verifier() {
        let connector = Arc::new(RecordingConnector::default());
        let (flow, store) = flow_with(connector.clone());

        let start = flow.begin("twitter").await.unwrap();
        let stored = store.get(&verifier_key("twitter")).unwrap();

        let url = Url::parse(&start.authorization_url).unwrap();
        let params: std::collections::HashMap<_, _> = url.query_pairs().into_owned().collect();
        assert_eq!(params["state"], "twitter_connect");
        assert_eq!(params["client_id"], "tw-client");
        assert_eq!(params["code_challenge_method"], "S256");
        assert_eq!(
            params["code_challenge"],
            derive_challenge(&Verifier::new(stored.clone())).as_str()
        );
        assert!(!start.authorization_url.contains(&stored));

        let outcome = flow
            .complete("twitter", &CallbackQuery::parse("?state=twitter_connect&code=the-code"))
            .await
            .unwrap();

        assert!(outcome.is_connected());
        assert_eq!(outcome.notice.message, "Twitter account connected");

        let finished = connector.finished.lock();
        assert_eq!(finished.len(), 1);
        assert_eq!(
            finished[0],
            (
                "twitter".to_string(),
                FinishConnect {
                    code: "the-code".to_string(),
                    code_verifier: stored,
                    redirect_uri: "http://localhost:3000/oauth/twitter/callback".to_string(),
                }
            )
        );
        assert!(store.get(&verifier_key("twitter")).is_none());
    }

    #[tokio::test]
    async fn test_backend_started_provider() {
        let connector = Arc::new(RecordingConnector {
            start_url: Some("https://www.facebook.com/v19.0/dialog/oauth?client_id=1".to_string()),
            ..Default::default()
        });
        let (flow, store) = flow_with(connector.clone());

        let start = flow.begin("facebook").await.unwrap();
        assert_eq!(start.authorization_url, "https://www.facebook.com/v19.0/dialog/oauth?client_id=1");

        let stored = Verifier::new(store.get(&verifier_key("facebook")).unwrap());
        let started = connector.started.lock();
        assert_eq!(started[0].0, "facebook");
        assert_eq!(started[0].1, derive_challenge(&stored).to_string());
        assert_eq!(started[0].2, "http://localhost:3000/oauth/facebook/callback");
    }

    #[tokio::test]
    async fn test_failed_start_stores_nothing() {
        let connector = Arc::new(RecordingConnector::default());
        let (flow, store) = flow_with(connector);

        let err = flow.begin("facebook").await.unwrap_err();
        assert!(matches!(err, ConnectError::Http(_)));
        assert!(store.get(&verifier_key("facebook")).is_none());
    }

    #[tokio::test]
    async fn test_retryable_failure_keeps_verifier() {
        let connector = Arc::new(RecordingConnector {
            finish_error: Some(HttpError::from_response(503, br#"{"message":"Try later"}"#)),
            ..Default::default()
        });
        let (flow, store) = flow_with(connector);
        store.set(&verifier_key("facebook"), "v");

        let outcome = flow
            .complete("facebook", &CallbackQuery::parse("code=abc"))
            .await
            .unwrap();

        assert_eq!(outcome.notice.message, "Try later");
        assert!(matches!(
            outcome.status,
            ConnectStatus::Failed { verifier_retained: true, .. }
        ));
        assert_eq!(store.get(&verifier_key("facebook")).as_deref(), Some("v"));
    }

    #[tokio::test]
    async fn test_fatal_failure_clears_verifier() {
        let connector = Arc::new(RecordingConnector {
            finish_error: Some(HttpError::from_response(400, br#"{"error":"Code expired"}"#)),
            ..Default::default()
        });
        let (flow, store) = flow_with(connector);
        store.set(&verifier_key("facebook"), "v");

        let outcome = flow
            .complete("facebook", &CallbackQuery::parse("code=abc"))
            .await
            .unwrap();

        assert_eq!(outcome.notice.message, "Code expired");
        assert!(matches!(
            outcome.status,
            ConnectStatus::Failed { verifier_retained: false, .. }
        ));
        assert!(store.get(&verifier_key("facebook")).is_none());
    }

    #[tokio::test]
    async fn test_unknown_provider_and_missing_client_id() {
        let connector = Arc::new(RecordingConnector::default());
        let store = Arc::new(MemoryStore::new());
        let config = ConnectConfig::new("http://localhost:3000").with_provider(twitter_config());
        let flow = ConnectFlow::new(config, store.clone(), connector);

        assert!(matches!(
            flow.begin("myspace").await,
            Err(ConnectError::UnknownProvider(_))
        ));
        assert!(matches!(
            flow.begin("twitter").await,
            Err(ConnectError::MissingClientId(_))
        ));
        assert!(matches!(
            flow.complete("myspace", &CallbackQuery::default()).await,
            Err(ConnectError::UnknownProvider(_))
        ));
    }

    #[tokio::test]
    async fn test_entropy_failure_is_fatal() {
        #[derive(Debug)]
        struct NoEntropy;
        impl EntropySource for NoEntropy {
            fn fill(&self, _buf: &mut [u8]) -> Result<(), PkceError> {
                Err(PkceError::EntropyUnavailable("unavailable".to_string()))
            }
        }

        let connector = Arc::new(RecordingConnector::default());
        let (flow, store) = flow_with(connector);
        let flow = flow.with_pkce(PkceGenerator::new(Arc::new(NoEntropy)));

        assert!(matches!(flow.begin("twitter").await, Err(ConnectError::Pkce(_))));
        assert!(store.get(&verifier_key("twitter")).is_none());
    }

    #[tokio::test]
    async fn test_second_attempt_overwrites_verifier() {
        let connector = Arc::new(RecordingConnector::default());
        let (flow, _store) = flow_with(connector);

        flow.begin("twitter").await.unwrap();
        let first = flow.pending_verifier("twitter").unwrap();
        flow.begin("twitter").await.unwrap();
        let second = flow.pending_verifier("twitter").unwrap();
        assert_ne!(first, second);
    }
}
