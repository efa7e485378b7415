//! HTTP request layer for the trustmart client.
//!
//! Every backend call goes through [`HttpClient`], which:
//!
//! - resolves paths against the configured API base URL
//! - merges the JSON default headers with caller headers
//! - attaches `Authorization: Bearer <token>` from the [`TokenProvider`]
//!   unless the caller already set one
//! - turns every failure into a [`HttpError`](trustmart_core::HttpError)
//!
//! Persistent client state lives behind the [`SessionStore`] capability so
//! that nothing reaches for global storage.
//!
//! ## Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use trustmart_http::{ClientConfig, HttpClient, MemoryStore, TokenProvider};
//!
//! let tokens = TokenProvider::new(Arc::new(MemoryStore::new()));
//! let client = HttpClient::new(&ClientConfig::default(), tokens)?;
//! let me: serde_json::Value = client.get("/users/user", None).await?;
//! ```

#![warn(missing_docs)]

mod client;
pub mod config;
mod request;
pub mod store;
mod token;

pub use client::HttpClient;
pub use config::ClientConfig;
pub use request::RequestConfig;
pub use store::{FileStore, MemoryStore, SessionStore};
pub use token::{TokenProvider, ACCESS_TOKEN_KEY};
