//! # trustmart-core
//!
//! Core types and error handling shared by the trustmart client crates.
//!
//! - **Errors**: the normalized [`HttpError`] every backend call fails with,
//!   plus the PKCE, connect, store and configuration errors
//! - **Envelopes**: the `{status, message, data, timestamp}` wrapper most
//!   backend endpoints return
//! - **Models**: users, products, pagination and delivery records
//! - **Validation**: client-local, field-keyed form errors
//!
//! ## Example
//!
//! ```rust
//! use trustmart_core::HttpError;
//!
//! let err = HttpError::from_response(422, br#"{"message":"Nope"}"#);
//! assert_eq!(err.message, "Nope");
//! assert_eq!(err.status, Some(422));
//! ```

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]

pub mod envelope;
pub mod errors;
pub mod models;
pub mod validation;

pub use envelope::Envelope;
pub use errors::{
    codes, ConfigError, ConnectError, HttpError, HttpResult, PkceError, StoreError,
};
pub use models::{
    ApiUser, AuthUser, NewDelivery, NewProduct, Pagination, Product, ProductPage, ProductStatus,
    SellerSummary, UpdateProduct,
};
pub use validation::ValidationErrors;
