//! User endpoints.

use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};
use trustmart_core::{ApiUser, Envelope, HttpResult};
use trustmart_http::HttpClient;

/// Payload of `GET /users/user`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MeData {
    /// Optional server message.
    #[serde(default)]
    pub message: Option<String>,
    /// The signed-in user.
    pub user: ApiUser,
}

/// Partial profile update sent with PATCH.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserUpdate {
    /// New display handle.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// New country.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    /// New external wallet address.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wallet_address: Option<String>,
}

/// User endpoints.
#[derive(Debug, Clone)]
pub struct UsersApi {
    http: HttpClient,
}

impl UsersApi {
    /// Create over a request layer.
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    /// The signed-in user.
    pub async fn me(&self) -> HttpResult<Envelope<MeData>> {
        self.http.get("/users/user", None).await
    }

    /// All users.
    pub async fn list(&self) -> HttpResult<Vec<ApiUser>> {
        self.http.get("/users", None).await
    }

    /// One user by id.
    pub async fn get(&self, id: u64) -> HttpResult<ApiUser> {
        self.http.get(&format!("/users/{}", id), None).await
    }

    /// Patch a user's profile.
    pub async fn update(&self, id: u64, update: &UserUpdate) -> HttpResult<ApiUser> {
        self.http
            .patch(&format!("/users/{}", id), Some(update), None)
            .await
    }

    /// Delete a user. Any success body is accepted.
    pub async fn remove(&self, id: u64) -> HttpResult<()> {
        let _: IgnoredAny = self.http.delete(&format!("/users/{}", id), None).await?;
        Ok(())
    }
}
