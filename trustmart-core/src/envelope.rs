//! Response envelope returned by most backend endpoints.

use serde::{Deserialize, Serialize};

/// `{status, message, data, timestamp}` wrapper around a payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    /// Backend success flag.
    pub status: bool,
    /// Backend message, often empty on success.
    #[serde(default)]
    pub message: String,
    /// The payload.
    pub data: T,
    /// Server timestamp as sent, not parsed.
    #[serde(default)]
    pub timestamp: Option<String>,
}

impl<T> Envelope<T> {
    /// Wrap a payload in a successful envelope.
    pub fn ok(data: T) -> Self {
        Self {
            status: true,
            message: String::new(),
            data,
            timestamp: None,
        }
    }

    /// Discard the envelope and keep the payload.
    pub fn into_data(self) -> T {
        self.data
    }
}
