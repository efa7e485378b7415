//! Typed clients for the trustmart marketplace backend.
//!
//! Every endpoint goes through [`trustmart_http::HttpClient`] and decodes
//! into one explicit response type, so a shape the backend did not promise
//! fails as `ERR_DECODE` instead of surfacing later as a missing field.
//!
//! On top of the endpoint clients sit the [`AuthSession`] (token and cached
//! user), the client-side [`forms`] checks and the [`ProductWizard`].

#![warn(missing_docs)]

mod auth;
mod deliveries;
pub mod forms;
mod products;
mod session;
mod social;
mod upload;
mod users;
pub mod wizard;

pub use auth::{
    AuthApi, LoginData, LoginRequest, RegisterRequest, RegisterResponse, RegisteredUser,
    TokenData, VerifyEmailRequest,
};
pub use deliveries::DeliveriesApi;
pub use forms::{DeliveryForm, EditProductForm, LoginForm, ProductForm, VerifyForm};
pub use products::{
    CreatedProduct, ProductData, ProductId, ProductRef, ProductsApi, DEFAULT_PAGE_LIMIT,
};
pub use session::AuthSession;
pub use social::{ConnectStartData, SocialApi};
pub use upload::{ImageFile, PinResponse, UploadApi};
pub use users::{MeData, UserUpdate, UsersApi};
pub use wizard::{
    ImagesAdded, ProductWizard, ProgressSink, TracingProgress, WizardError, WizardStep,
    MAX_IMAGES,
};
