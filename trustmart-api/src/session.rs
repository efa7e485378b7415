//! Signed-in state: the stored token and the cached user.

use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{info, warn};
use trustmart_core::{AuthUser, HttpResult};
use trustmart_http::TokenProvider;

use crate::auth::{AuthApi, LoginRequest, VerifyEmailRequest};
use crate::users::UsersApi;

/// Holds the session token and the user it belongs to.
///
/// The token lives in the [`TokenProvider`]'s store so the request layer
/// attaches it to later calls. The user is cached in memory.
#[derive(Debug, Clone)]
pub struct AuthSession {
    auth: AuthApi,
    users: UsersApi,
    tokens: TokenProvider,
    user: Arc<RwLock<Option<AuthUser>>>,
}

impl AuthSession {
    /// Create a signed-out session.
    pub fn new(auth: AuthApi, users: UsersApi, tokens: TokenProvider) -> Self {
        Self {
            auth,
            users,
            tokens,
            user: Arc::new(RwLock::new(None)),
        }
    }

    /// Sign in.
    ///
    /// The user from the login response is cached first and then replaced
    /// by the fuller `/users/user` record when that call succeeds. A failure
    /// of the second call does not fail the login.
    pub async fn login(&self, identifier: &str, password: &str) -> HttpResult<AuthUser> {
        let request = LoginRequest {
            identifier: identifier.to_string(),
            password: password.to_string(),
        };
        let data = self.auth.login(&request).await?.into_data();
        self.tokens.set(&data.token);

        let mut user = AuthUser::from(data.user);
        user.wallet_address = None;
        self.set_user(Some(user.clone()));
        info!(user_id = user.id, "Signed in");

        match self.refresh_user().await {
            Ok(full) => Ok(full),
            Err(err) => {
                warn!(error = %err, "Could not load full user after login");
                Ok(user)
            }
        }
    }

    /// Confirm an email with its one-time code, which also signs in.
    pub async fn verify_email(&self, email: &str, otp: &str) -> HttpResult<AuthUser> {
        let request = VerifyEmailRequest {
            email: email.to_string(),
            otp: otp.to_string(),
        };
        let token = self.auth.verify_email(&request).await?.into_data().token;
        self.tokens.set(&token);
        let user = self.refresh_user().await?;
        info!(user_id = user.id, "Email verified");
        Ok(user)
    }

    /// Reload the cached user from `/users/user`.
    pub async fn refresh_user(&self) -> HttpResult<AuthUser> {
        let user = AuthUser::from(self.users.me().await?.into_data().user);
        self.set_user(Some(user.clone()));
        Ok(user)
    }

    /// Forget the token and the user.
    pub fn logout(&self) {
        self.tokens.clear();
        self.set_user(None);
        info!("Signed out");
    }

    /// Whether a token is held.
    pub fn is_authenticated(&self) -> bool {
        self.tokens.has_token()
    }

    /// The cached user.
    pub fn user(&self) -> Option<AuthUser> {
        self.user.read().clone()
    }

    fn set_user(&self, user: Option<AuthUser>) {
        *self.user.write() = user;
    }
}
