//! OAuth utilities for linking social accounts with PKCE.
//!
//! - [`pkce`]: verifier/challenge generation (S256), backed by an injected
//!   [`EntropySource`]
//! - [`ProviderConfig`] / [`ConnectConfig`]: per-provider settings
//! - [`CallbackQuery`]: the query string the provider redirects back with
//! - [`ConnectFlow`]: starts a handshake and completes it from the callback
//!
//! The flow does not navigate anywhere. [`ConnectFlow::begin`] returns the
//! URL to open and [`ConnectFlow::complete`] returns an outcome carrying the
//! notice to show.

#![warn(missing_docs)]

mod callback;
pub mod config;
mod connect;
pub mod pkce;

pub use callback::CallbackQuery;
pub use config::{AuthorizationStrategy, ConnectConfig, ProviderConfig};
pub use connect::{
    verifier_key, ConnectFlow, ConnectOutcome, ConnectStart, ConnectStatus, FinishConnect, Notice,
    NoticeLevel, SocialConnector, RETURN_ROUTE,
};
pub use pkce::{
    create_pair, derive_challenge, generate_verifier, Challenge, EntropySource, PkceGenerator,
    PkcePair, SystemEntropy, Verifier,
};
