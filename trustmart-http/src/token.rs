//! Access token persistence.

use crate::store::SessionStore;
use std::sync::Arc;

/// Fixed key the access token is stored under.
pub const ACCESS_TOKEN_KEY: &str = "tm_access_token";

/// Reads and writes the bearer token in a [`SessionStore`].
#[derive(Debug, Clone)]
pub struct TokenProvider {
    store: Arc<dyn SessionStore>,
}

impl TokenProvider {
    /// Create a provider over a store.
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    /// The stored token. An empty string counts as no token.
    pub fn get(&self) -> Option<String> {
        self.store.get(ACCESS_TOKEN_KEY).filter(|t| !t.is_empty())
    }

    /// Persist a token.
    pub fn set(&self, token: &str) {
        self.store.set(ACCESS_TOKEN_KEY, token);
    }

    /// Forget the token.
    pub fn clear(&self) {
        self.store.remove(ACCESS_TOKEN_KEY);
    }

    /// Whether a token is held.
    pub fn has_token(&self) -> bool {
        self.get().is_some()
    }
}
