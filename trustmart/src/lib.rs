//! # trustmart
//!
//! Client library for the trustmart marketplace.
//!
//! ## Quick Start
//!
//! ```ignore
//! use trustmart::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     trustmart::init_tracing();
//!     let client = Trustmart::from_env()?;
//!
//!     client.session.login("ada@example.com", "secret").await?;
//!     let page = client.products.my_products(1, 20).await?.into_data();
//!     println!("{} products", page.pagination.total);
//!
//!     // Link a social account.
//!     let start = client.connect.begin("twitter").await?;
//!     println!("Open {}", start.authorization_url);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - [`trustmart_core`] - errors, envelopes, models and form errors
//! - [`trustmart_http`] - request layer, token provider and session stores
//! - [`trustmart_auth`] - PKCE and the account-linking flow
//! - [`trustmart_api`] - endpoint clients, auth session and product wizard
//!
//! ## Configuration
//!
//! [`Trustmart::from_env`] reads `TRUSTMART_API_BASE_URL`,
//! `TRUSTMART_BACKEND_URL`, `TRUSTMART_APP_URL`, `TRUSTMART_UPLOAD_URL`,
//! `TRUSTMART_GATEWAY_URL`, `TRUSTMART_TIMEOUT_SECS` and
//! `TRUSTMART_<PROVIDER>_CLIENT_ID`. When `TRUSTMART_SESSION_FILE` is set the
//! access token is kept in that file across runs.

#![warn(missing_docs)]
#![deny(unsafe_code)]

use anyhow::Context;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

pub use trustmart_api as api;
pub use trustmart_auth as auth;
pub use trustmart_core as core;
pub use trustmart_http as http;

pub use trustmart_api::{
    AuthApi, AuthSession, DeliveriesApi, ProductWizard, ProductsApi, SocialApi, UploadApi,
    UsersApi,
};
pub use trustmart_auth::{ConnectConfig, ConnectFlow, ConnectOutcome, ConnectStart};
pub use trustmart_core::{ConfigError, HttpError, HttpResult, ValidationErrors};
pub use trustmart_http::{
    ClientConfig, FileStore, HttpClient, MemoryStore, SessionStore, TokenProvider,
};

/// Environment variable naming a file to keep the access token in.
pub const SESSION_FILE_VAR: &str = "TRUSTMART_SESSION_FILE";

/// Default log filter when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "trustmart=info";

/// Every client wired to one configuration and one token store.
#[derive(Debug, Clone)]
pub struct Trustmart {
    /// Configuration in use.
    pub config: ClientConfig,
    /// Shared request layer.
    pub http: HttpClient,
    /// Sign-in state.
    pub session: AuthSession,
    /// Unauthenticated account endpoints.
    pub auth: AuthApi,
    /// User endpoints.
    pub users: UsersApi,
    /// Product endpoints.
    pub products: ProductsApi,
    /// Delivery endpoints.
    pub deliveries: DeliveriesApi,
    /// Image pinning.
    pub uploads: UploadApi,
    /// Social account linking.
    pub connect: ConnectFlow,
}

impl Trustmart {
    /// Build with in-memory stores.
    pub fn new(config: ClientConfig) -> Result<Self, ConfigError> {
        Self::with_stores(
            config,
            Arc::new(MemoryStore::new()),
            Arc::new(MemoryStore::new()),
        )
    }

    /// Build with explicit stores: `tokens` holds the access token,
    /// `verifiers` holds PKCE verifiers for in-flight handshakes.
    pub fn with_stores(
        config: ClientConfig,
        tokens: Arc<dyn SessionStore>,
        verifiers: Arc<dyn SessionStore>,
    ) -> Result<Self, ConfigError> {
        let connect = ConnectConfig::from_client_config(&config);
        Self::with_connect_config(config, connect, tokens, verifiers)
    }

    /// Build with explicit provider configuration.
    pub fn with_connect_config(
        config: ClientConfig,
        connect: ConnectConfig,
        tokens: Arc<dyn SessionStore>,
        verifiers: Arc<dyn SessionStore>,
    ) -> Result<Self, ConfigError> {
        let tokens = TokenProvider::new(tokens);
        let http = HttpClient::new(&config, tokens.clone())?;

        let auth = AuthApi::new(http.clone());
        let users = UsersApi::new(http.clone());
        let session = AuthSession::new(auth.clone(), users.clone(), tokens);
        let social = SocialApi::new(http.clone(), &config.backend_url);

        Ok(Self {
            session,
            auth,
            users,
            products: ProductsApi::new(http.clone()),
            deliveries: DeliveriesApi::new(http.clone()),
            uploads: UploadApi::from_config(http.clone(), &config),
            connect: ConnectFlow::new(connect, verifiers, Arc::new(social)),
            http,
            config,
        })
    }

    /// Build from environment variables.
    pub fn from_env() -> anyhow::Result<Self> {
        let config = ClientConfig::from_env().context("Invalid trustmart configuration")?;
        let tokens: Arc<dyn SessionStore> = match std::env::var(SESSION_FILE_VAR) {
            Ok(path) if !path.is_empty() => Arc::new(
                FileStore::open(&path)
                    .with_context(|| format!("Failed to open session file {}", path))?,
            ),
            _ => Arc::new(MemoryStore::new()),
        };
        tracing::debug!(api = %config.api_base_url, "Client configured");
        Self::with_stores(config, tokens, Arc::new(MemoryStore::new()))
            .context("Failed to build trustmart client")
    }

    /// A product wizard for a seller.
    pub fn product_wizard(&self, seller_id: u64) -> ProductWizard {
        ProductWizard::new(
            self.products.clone(),
            self.deliveries.clone(),
            self.uploads.clone(),
            trustmart_api::ProductForm::for_seller(seller_id),
        )
    }
}

/// Install a `tracing` subscriber filtered by `RUST_LOG`, defaulting to
/// [`DEFAULT_LOG_FILTER`]. Does nothing if a subscriber is already set.
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    #[cfg(feature = "json-logs")]
    let result = builder.json().try_init();
    #[cfg(not(feature = "json-logs"))]
    let result = builder.try_init();

    if result.is_err() {
        tracing::debug!("Tracing subscriber already installed");
    }
}

/// Convenient prelude for common imports.
///
/// ```ignore
/// use trustmart::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{init_tracing, Trustmart};

    pub use trustmart_core::{
        AuthUser, Envelope, HttpError, HttpResult, NewDelivery, NewProduct, Product, ProductPage,
        ProductStatus, UpdateProduct, ValidationErrors,
    };

    pub use trustmart_http::{ClientConfig, HttpClient, RequestConfig, SessionStore};

    pub use trustmart_auth::{
        CallbackQuery, ConnectFlow, ConnectOutcome, ConnectStart, ConnectStatus, Notice,
        NoticeLevel, PkcePair,
    };

    pub use trustmart_api::{
        AuthSession, DeliveryForm, EditProductForm, ImageFile, LoginForm, ProductForm,
        ProductWizard, ProgressSink, TracingProgress, VerifyForm, WizardError, WizardStep,
    };
}
