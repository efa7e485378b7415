//! The request layer.

use crate::config::ClientConfig;
use crate::request::RequestConfig;
use crate::token::TokenProvider;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::multipart::Form;
use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};
use trustmart_core::{codes, ConfigError, HttpError, HttpResult};

/// Single choke point for backend calls.
///
/// Each call is a one-shot request/response: no retries, no backoff, no
/// ordering between concurrent calls. Cloning is cheap and shares the
/// connection pool and token store.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
    base_url: String,
    tokens: TokenProvider,
}

impl HttpClient {
    /// Create a client from configuration.
    pub fn new(config: &ClientConfig, tokens: TokenProvider) -> Result<Self, ConfigError> {
        Ok(Self::with_client(
            config.build_client()?,
            &config.api_base_url,
            tokens,
        ))
    }

    /// Create with a custom reqwest client.
    pub fn with_client(client: Client, base_url: impl Into<String>, tokens: TokenProvider) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            tokens,
        }
    }

    /// Base URL paths are resolved against.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The token provider used for auth injection.
    pub fn tokens(&self) -> &TokenProvider {
        &self.tokens
    }

    /// Resolve a path. Absolute `http(s)://` URLs are used as they are.
    pub fn url_for(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            path.to_string()
        } else if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    /// Send a GET request.
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        config: Option<RequestConfig>,
    ) -> HttpResult<T> {
        self.request::<T, ()>(Method::GET, path, None, config).await
    }

    /// Send a POST request.
    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: Option<&B>,
        config: Option<RequestConfig>,
    ) -> HttpResult<T> {
        self.request(Method::POST, path, body, config).await
    }

    /// Send a PUT request.
    pub async fn put<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: Option<&B>,
        config: Option<RequestConfig>,
    ) -> HttpResult<T> {
        self.request(Method::PUT, path, body, config).await
    }

    /// Send a PATCH request.
    pub async fn patch<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: Option<&B>,
        config: Option<RequestConfig>,
    ) -> HttpResult<T> {
        self.request(Method::PATCH, path, body, config).await
    }

    /// Send a DELETE request.
    pub async fn delete<T: DeserializeOwned>(
        &self,
        path: &str,
        config: Option<RequestConfig>,
    ) -> HttpResult<T> {
        self.request::<T, ()>(Method::DELETE, path, None, config).await
    }

    /// POST a multipart form.
    ///
    /// Same auth injection and error normalization as the JSON methods; the
    /// JSON `Content-Type` default is left out so reqwest can set the
    /// multipart boundary.
    pub async fn send_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        form: Form,
        config: Option<RequestConfig>,
    ) -> HttpResult<T> {
        let config = config.unwrap_or_default();
        let url = self.url_for(path);
        let headers = self.prepare_headers(&config, false);

        let builder = self
            .apply(self.client.post(&url), &config)
            .headers(headers)
            .multipart(form);

        self.execute(Method::POST, &url, builder).await
    }

    /// Headers for a request: defaults, then caller headers, then the stored
    /// bearer token if the caller set no `Authorization` and did not ask for
    /// an anonymous call.
    pub fn prepare_headers(&self, config: &RequestConfig, json: bool) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if json {
            headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }
        for (name, value) in &config.headers {
            headers.insert(name.clone(), value.clone());
        }

        if !config.anonymous && !headers.contains_key(AUTHORIZATION) {
            if let Some(token) = self.tokens.get() {
                match HeaderValue::from_str(&format!("Bearer {}", token)) {
                    Ok(mut value) => {
                        value.set_sensitive(true);
                        headers.insert(AUTHORIZATION, value);
                    }
                    Err(_) => warn!("Stored access token is not a valid header value; sending without it"),
                }
            }
        }

        headers
    }

    async fn request<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        config: Option<RequestConfig>,
    ) -> HttpResult<T> {
        let config = config.unwrap_or_default();
        let url = self.url_for(path);
        let headers = self.prepare_headers(&config, true);

        let mut builder = self
            .apply(self.client.request(method.clone(), &url), &config)
            .headers(headers);

        if let Some(body) = body {
            let bytes = serde_json::to_vec(body).map_err(|e| {
                HttpError::transport(codes::SERIALIZE, format!("Failed to serialize request body: {}", e))
            })?;
            builder = builder.body(bytes);
        }

        self.execute(method, &url, builder).await
    }

    fn apply(&self, builder: RequestBuilder, config: &RequestConfig) -> RequestBuilder {
        let mut builder = builder;
        if !config.query.is_empty() {
            builder = builder.query(&config.query);
        }
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        builder
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        method: Method,
        url: &str,
        builder: RequestBuilder,
    ) -> HttpResult<T> {
        debug!(method = %method, url = %url, "Sending request");

        let response = builder.send().await.map_err(|e| {
            let err = transport_error(&e);
            warn!(method = %method, url = %url, code = ?err.code, error = %e, "Request did not complete");
            err
        })?;

        let status = response.status();
        let body = response.bytes().await.map_err(|e| transport_error(&e))?;

        if !status.is_success() {
            let err = HttpError::from_response(status.as_u16(), &body);
            debug!(method = %method, url = %url, status = status.as_u16(), message = %err.message, "Request failed");
            return Err(err);
        }

        debug!(method = %method, url = %url, status = status.as_u16(), "Request succeeded");
        decode(status.as_u16(), url, &body)
    }
}

/// Decode a 2xx body. An empty body decodes as JSON `null`, so `()`,
/// `Option<_>` and `Value` accept it.
fn decode<T: DeserializeOwned>(status: u16, url: &str, body: &[u8]) -> HttpResult<T> {
    let body: &[u8] = if body.iter().all(u8::is_ascii_whitespace) {
        b"null"
    } else {
        body
    };

    serde_json::from_slice(body).map_err(|e| {
        let data = serde_json::from_slice::<Value>(body)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(body).into_owned()));
        HttpError::new(format!("Unexpected response from {}: {}", url, e))
            .with_status(status)
            .with_code(codes::DECODE)
            .with_data(data)
    })
}

fn transport_error(err: &reqwest::Error) -> HttpError {
    let code = if err.is_timeout() {
        codes::TIMEOUT
    } else if err.is_builder() {
        codes::INVALID_URL
    } else if err.is_decode() || err.is_body() {
        codes::BAD_RESPONSE
    } else {
        codes::NETWORK
    };
    HttpError::transport(code, err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use std::sync::Arc;

    fn client_with_token(token: Option<&str>) -> HttpClient {
        let tokens = TokenProvider::new(Arc::new(MemoryStore::new()));
        if let Some(token) = token {
            tokens.set(token);
        }
        HttpClient::with_client(Client::new(), "http://localhost:3033/api/v1/", tokens)
    }

    #[test]
    fn test_url_for() {
        let client = client_with_token(None);
        assert_eq!(client.url_for("/auth/login"), "http://localhost:3033/api/v1/auth/login");
        assert_eq!(client.url_for("products"), "http://localhost:3033/api/v1/products");
        assert_eq!(
            client.url_for("https://other.example/api/v1/social/x"),
            "https://other.example/api/v1/social/x"
        );
    }

    #[test]
    fn test_injects_stored_token() {
        let client = client_with_token(Some("abc123"));
        let headers = client.prepare_headers(&RequestConfig::new(), true);
        assert_eq!(headers[AUTHORIZATION], "Bearer abc123");
        assert_eq!(headers[ACCEPT], "application/json");
        assert_eq!(headers[CONTENT_TYPE], "application/json");
    }

    #[test]
    fn test_explicit_authorization_untouched() {
        let client = client_with_token(Some("abc123"));
        let config = RequestConfig::new().with_bearer("explicit").unwrap();
        let headers = client.prepare_headers(&config, true);
        assert_eq!(headers[AUTHORIZATION], "Bearer explicit");
        assert_eq!(headers.get_all(AUTHORIZATION).iter().count(), 1);
    }

    #[test]
    fn test_anonymous_and_tokenless() {
        let client = client_with_token(Some("abc123"));
        let headers = client.prepare_headers(&RequestConfig::anonymous(), true);
        assert!(!headers.contains_key(AUTHORIZATION));

        let client = client_with_token(None);
        let headers = client.prepare_headers(&RequestConfig::new(), true);
        assert!(!headers.contains_key(AUTHORIZATION));
    }

    #[test]
    fn test_caller_headers_override_defaults() {
        let client = client_with_token(None);
        let config = RequestConfig::new()
            .with_header(ACCEPT, HeaderValue::from_static("text/plain"));
        let headers = client.prepare_headers(&config, false);
        assert_eq!(headers[ACCEPT], "text/plain");
        assert!(!headers.contains_key(CONTENT_TYPE));
    }

    #[test]
    fn test_decode_empty_body() {
        assert!(decode::<()>(204, "u", b"").is_ok());
        let value: Value = decode(200, "u", b"  ").unwrap();
        assert!(value.is_null());
    }

    #[test]
    fn test_decode_shape_mismatch() {
        #[derive(Debug, serde::Deserialize)]
        struct Token {
            #[allow(dead_code)]
            token: String,
        }
        let err = decode::<Token>(200, "http://x/auth", br#"{"other":1}"#).unwrap_err();
        assert_eq!(err.code.as_deref(), Some(codes::DECODE));
        assert_eq!(err.status, Some(200));
        assert_eq!(err.data, Some(serde_json::json!({"other": 1})));
        assert!(err.message.starts_with("Unexpected response from http://x/auth"));
    }
}
