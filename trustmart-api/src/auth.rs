//! Login, registration and email verification.

use serde::{Deserialize, Serialize};
use tracing::debug;
use trustmart_core::models::id_string;
use trustmart_core::{ApiUser, Envelope, HttpResult};
use trustmart_http::{HttpClient, RequestConfig};

/// Credentials for `POST /auth/login`.
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    /// Email or username.
    pub identifier: String,
    /// Plain-text password.
    pub password: String,
}

/// Payload of a successful login.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LoginData {
    /// The signed-in user.
    pub user: ApiUser,
    /// Bearer token for later calls.
    pub token: String,
}

/// Body of `POST /auth/register`.
#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    /// Email address the one-time code is sent to.
    pub email: String,
    /// Plain-text password.
    pub password: String,
    /// Optional display handle.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Optional country.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
}

/// Id of a freshly registered user.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RegisteredUser {
    /// New user id, always as a string.
    #[serde(rename = "userId", deserialize_with = "id_string")]
    pub user_id: String,
}

/// Registration response. Older backends answer with a bare `{userId}`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RegisterResponse {
    /// `{status, message, data: {userId}}`.
    Enveloped(Envelope<RegisteredUser>),
    /// `{userId}`.
    Bare(RegisteredUser),
}

impl RegisterResponse {
    /// The new user's id.
    pub fn user_id(&self) -> &str {
        match self {
            Self::Enveloped(envelope) => &envelope.data.user_id,
            Self::Bare(user) => &user.user_id,
        }
    }
}

/// Body of `POST /auth/verify-email`.
#[derive(Debug, Clone, Serialize)]
pub struct VerifyEmailRequest {
    /// Address being verified.
    pub email: String,
    /// Emailed one-time code.
    pub otp: String,
}

/// Payload of a successful verification.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TokenData {
    /// Bearer token for later calls.
    pub token: String,
}

/// Unauthenticated account endpoints.
#[derive(Debug, Clone)]
pub struct AuthApi {
    http: HttpClient,
}

impl AuthApi {
    /// Create over a request layer.
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    /// Exchange credentials for a token.
    pub async fn login(&self, request: &LoginRequest) -> HttpResult<Envelope<LoginData>> {
        debug!("Logging in");
        self.http
            .post("/auth/login", Some(request), Some(RequestConfig::anonymous()))
            .await
    }

    /// Create an account. The backend emails a one-time code.
    pub async fn register(&self, request: &RegisterRequest) -> HttpResult<RegisterResponse> {
        self.http
            .post("/auth/register", Some(request), Some(RequestConfig::anonymous()))
            .await
    }

    /// Confirm an email address with its one-time code.
    pub async fn verify_email(
        &self,
        request: &VerifyEmailRequest,
    ) -> HttpResult<Envelope<TokenData>> {
        self.http
            .post(
                "/auth/verify-email",
                Some(request),
                Some(RequestConfig::anonymous()),
            )
            .await
    }
}
