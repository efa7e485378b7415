//! Error types for the trustmart client.
//!
//! Every backend call fails with a single normalized [`HttpError`]; callers
//! never see the transport's own error type. The remaining errors cover
//! configuration faults that are not part of a request/response exchange.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

/// Message used when neither the server nor the transport said anything.
pub const DEFAULT_MESSAGE: &str = "Request failed";

/// Transport-level error codes carried in [`HttpError::code`].
pub mod codes {
    /// Connection could not be established.
    pub const NETWORK: &str = "ERR_NETWORK";
    /// The request timed out.
    pub const TIMEOUT: &str = "ETIMEDOUT";
    /// The server answered with a 4xx status.
    pub const BAD_REQUEST: &str = "ERR_BAD_REQUEST";
    /// The server answered with a 5xx status.
    pub const BAD_RESPONSE: &str = "ERR_BAD_RESPONSE";
    /// A 2xx body did not match the expected response shape.
    pub const DECODE: &str = "ERR_DECODE";
    /// The request body could not be serialized.
    pub const SERIALIZE: &str = "ERR_SERIALIZE";
    /// The request URL could not be built.
    pub const INVALID_URL: &str = "ERR_INVALID_URL";
    /// A caller-supplied header name or value is not valid HTTP.
    pub const INVALID_HEADER: &str = "ERR_INVALID_HEADER";
}

/// Result type alias using [`HttpError`].
pub type HttpResult<T> = std::result::Result<T, HttpError>;

/// Normalized failure of a backend call.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpError {
    /// Human-readable message. Always present.
    pub message: String,
    /// HTTP status, when the server answered.
    pub status: Option<u16>,
    /// Transport-level code, see [`codes`].
    pub code: Option<String>,
    /// Raw server body, for field-level error extraction.
    pub data: Option<Value>,
}

impl fmt::Display for HttpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl HttpError {
    /// Create an error with just a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            status: None,
            code: None,
            data: None,
        }
    }

    /// Set the HTTP status.
    #[must_use]
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Set the transport code.
    #[must_use]
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    /// Attach the raw server body.
    #[must_use]
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Build an error for a transport failure (no server response).
    pub fn transport(code: impl Into<String>, message: impl AsRef<str>) -> Self {
        Self {
            message: normalize_message(None, Some(message.as_ref())),
            status: None,
            code: Some(code.into()),
            data: None,
        }
    }

    /// Build an error from a non-2xx response.
    ///
    /// A JSON body is kept as parsed JSON; anything else is kept as a plain
    /// string so that text error pages still produce a message.
    pub fn from_response(status: u16, body: &[u8]) -> Self {
        let data = parse_body(body);
        let transport = format!("Request failed with status code {}", status);
        let code = if status >= 500 {
            codes::BAD_RESPONSE
        } else {
            codes::BAD_REQUEST
        };

        Self {
            message: normalize_message(data.as_ref(), Some(&transport)),
            status: Some(status),
            code: Some(code.to_string()),
            data,
        }
    }

    /// Whether the server never answered.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        self.status.is_none()
    }

    /// Whether repeating the same call could plausibly succeed.
    ///
    /// Nothing retries automatically; this only informs callers that decide
    /// whether to keep state around for a user-initiated retry.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self.status {
            None => !matches!(
                self.code.as_deref(),
                Some(codes::SERIALIZE | codes::INVALID_URL | codes::INVALID_HEADER)
            ),
            Some(status) => status == 408 || status == 429 || status >= 500,
        }
    }

    /// Field-keyed messages from `data.errors`.
    ///
    /// Values may be plain strings or arrays of strings; for arrays the
    /// first entry is used.
    pub fn field_errors(&self) -> BTreeMap<String, String> {
        let Some(errors) = self
            .data
            .as_ref()
            .and_then(|d| d.get("errors"))
            .and_then(Value::as_object)
        else {
            return BTreeMap::new();
        };

        errors
            .iter()
            .filter_map(|(field, value)| {
                let message = match value {
                    Value::String(s) => Some(s.clone()),
                    Value::Array(items) => items.iter().find_map(Value::as_str).map(String::from),
                    _ => None,
                }?;
                Some((field.clone(), message))
            })
            .collect()
    }

    /// First field-level message found under any of `names`.
    pub fn field(&self, names: &[&str]) -> Option<String> {
        let errors = self.field_errors();
        names.iter().find_map(|name| errors.get(*name).cloned())
    }
}

fn parse_body(body: &[u8]) -> Option<Value> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return None;
    }
    match serde_json::from_slice::<Value>(body) {
        Ok(value) => Some(value),
        Err(_) => Some(Value::String(String::from_utf8_lossy(body).into_owned())),
    }
}

/// Pick the human-readable message for a failure.
///
/// Precedence: a non-empty string body, then a JSON `message` field, then a
/// JSON `error` field, then the transport message, then [`DEFAULT_MESSAGE`].
pub fn normalize_message(data: Option<&Value>, transport_message: Option<&str>) -> String {
    let non_empty = |s: &&str| !s.is_empty();

    let server = match data {
        Some(Value::String(s)) => Some(s.as_str()).filter(non_empty),
        Some(Value::Object(map)) => map
            .get("message")
            .and_then(Value::as_str)
            .filter(non_empty)
            .or_else(|| map.get("error").and_then(Value::as_str).filter(non_empty)),
        _ => None,
    };

    server
        .or_else(|| transport_message.filter(non_empty))
        .unwrap_or(DEFAULT_MESSAGE)
        .to_string()
}

/// PKCE generation errors.
#[derive(Debug, Error)]
pub enum PkceError {
    /// The operating system's secure random source failed.
    ///
    /// This is a configuration fault. There is no weaker fallback.
    #[error("Secure random source unavailable: {0}")]
    EntropyUnavailable(String),
}

/// Errors starting an OAuth connect handshake.
///
/// Problems with the callback itself are not errors; they are reported as
/// connect outcomes.
#[derive(Debug, Error)]
pub enum ConnectError {
    /// No configuration registered for the provider.
    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    /// Provider needs a client id that was never configured.
    #[error("Missing client id for provider: {0}")]
    MissingClientId(String),

    /// PKCE pair could not be generated.
    #[error(transparent)]
    Pkce(#[from] PkceError),

    /// Backend refused to start the handshake.
    #[error("Connect start failed: {0}")]
    Http(#[from] HttpError),

    /// Authorization URL could not be built.
    #[error("Invalid authorization URL: {0}")]
    InvalidAuthorizationUrl(String),
}

/// Errors from persistent session stores.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading or writing the backing file failed.
    #[error("Store I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The backing file is not a JSON string map.
    #[error("Store file is corrupt: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// An environment variable holds an unusable value.
    #[error("Invalid value for {var}: {value}")]
    InvalidValue {
        /// Variable name.
        var: String,
        /// Offending value.
        value: String,
    },

    /// A configured URL does not parse.
    #[error("Invalid URL for {var}: {reason}")]
    InvalidUrl {
        /// Variable or field name.
        var: String,
        /// Parser message.
        reason: String,
    },

    /// The HTTP client could not be constructed, e.g. no TLS backend.
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),
}
