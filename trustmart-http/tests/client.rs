//! Request layer tests against a mock backend.

use pretty_assertions::assert_eq;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use trustmart_core::codes;
use trustmart_http::{ClientConfig, HttpClient, MemoryStore, RequestConfig, TokenProvider};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn client_for(server: &MockServer, token: Option<&str>) -> HttpClient {
    let tokens = TokenProvider::new(Arc::new(MemoryStore::new()));
    if let Some(token) = token {
        tokens.set(token);
    }
    let config = ClientConfig::new()
        .with_api_base_url(format!("{}/api/v1", server.uri()))
        .with_timeout(Duration::from_secs(5));
    HttpClient::new(&config, tokens).unwrap()
}

#[derive(Debug, Deserialize, PartialEq)]
struct Echo {
    ok: bool,
}

#[tokio::test]
async fn test_stored_token_is_attached() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/users/user"))
        .and(header("Authorization", "Bearer abc123"))
        .and(header("Accept", "application/json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, Some("abc123"));
    let echo: Echo = client.get("/users/user", None).await.unwrap();
    assert_eq!(echo, Echo { ok: true });
}

#[tokio::test]
async fn test_explicit_authorization_is_left_alone() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/users/user"))
        .and(header("Authorization", "Bearer explicit"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, Some("abc123"));
    let config = RequestConfig::new().with_bearer("explicit").unwrap();
    let _: Echo = client.get("/users/user", Some(config)).await.unwrap();
}

#[tokio::test]
async fn test_no_token_no_header() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .mount(&server)
        .await;

    let client = client_for(&server, None);
    let _: Echo = client
        .post("/auth/login", Some(&json!({"identifier": "ada", "password": "pw"})), None)
        .await
        .unwrap();

    let client = client_for(&server, Some("abc123"));
    let _: Echo = client
        .post(
            "/auth/login",
            Some(&json!({"identifier": "ada", "password": "pw"})),
            Some(RequestConfig::anonymous()),
        )
        .await
        .unwrap();

    let requests = server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 2);
    for request in requests {
        assert!(!request.headers.contains_key("authorization"));
        assert_eq!(request.headers["content-type"], "application/json");
    }
}

#[tokio::test]
async fn test_body_and_query_are_sent() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/v1/products/7"))
        .and(query_param("draft", "true"))
        .and(body_json(json!({"price": 12.5})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, None);
    let config = RequestConfig::new().with_query("draft", true);
    let _: Echo = client
        .put("/products/7", Some(&json!({"price": 12.5})), Some(config))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_patch_and_delete() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/api/v1/users/3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/api/v1/users/3"))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let client = client_for(&server, Some("abc123"));
    let _: Echo = client
        .patch("/users/3", Some(&json!({"country": "NG"})), None)
        .await
        .unwrap();
    let deleted: Value = client.delete("/users/3", None).await.unwrap();
    assert!(deleted.is_null());
}

#[tokio::test]
async fn test_absolute_url_bypasses_base() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/elsewhere"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;

    let client = client_for(&server, None);
    let url = format!("{}/elsewhere", server.uri());
    let _: Echo = client.get(&url, None).await.unwrap();
}

#[tokio::test]
async fn test_server_message_field() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/auth/login"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "Nope"})))
        .mount(&server)
        .await;

    let client = client_for(&server, None);
    let err = client
        .post::<Echo, _>("/auth/login", Some(&json!({})), None)
        .await
        .unwrap_err();
    assert_eq!(err.message, "Nope");
    assert_eq!(err.status, Some(401));
    assert_eq!(err.code.as_deref(), Some(codes::BAD_REQUEST));
    assert_eq!(err.data, Some(json!({"message": "Nope"})));
}

#[tokio::test]
async fn test_server_error_field() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/products/1"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({"error": "Denied"})))
        .mount(&server)
        .await;

    let client = client_for(&server, None);
    let err = client.get::<Echo>("/products/1", None).await.unwrap_err();
    assert_eq!(err.message, "Denied");
}

#[tokio::test]
async fn test_server_plain_text_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/products"))
        .respond_with(ResponseTemplate::new(422).set_body_string("Bad input"))
        .mount(&server)
        .await;

    let client = client_for(&server, None);
    let err = client
        .post::<Echo, _>("/products", Some(&json!({})), None)
        .await
        .unwrap_err();
    assert_eq!(err.message, "Bad input");
    assert_eq!(err.data, Some(json!("Bad input")));
}

#[tokio::test]
async fn test_server_error_without_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/products"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let client = client_for(&server, None);
    let err = client.get::<Echo>("/products", None).await.unwrap_err();
    assert_eq!(err.message, "Request failed with status code 500");
    assert_eq!(err.code.as_deref(), Some(codes::BAD_RESPONSE));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_field_errors_survive() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/v1/auth/register"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "message": "Validation failed",
            "errors": {"email": "Email already registered"}
        })))
        .mount(&server)
        .await;

    let client = client_for(&server, None);
    let err = client
        .post::<Echo, _>("/auth/register", Some(&json!({"email": "a@b.c"})), None)
        .await
        .unwrap_err();
    assert_eq!(err.message, "Validation failed");
    assert_eq!(err.field(&["email"]).as_deref(), Some("Email already registered"));
}

#[tokio::test]
async fn test_decode_mismatch_is_normalized() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/users/user"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"unexpected": 1})))
        .mount(&server)
        .await;

    let client = client_for(&server, None);
    let err = client.get::<Echo>("/users/user", None).await.unwrap_err();
    assert_eq!(err.code.as_deref(), Some(codes::DECODE));
    assert_eq!(err.status, Some(200));
}

#[tokio::test]
async fn test_configured_timeout_applies() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/v1/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"ok": true}))
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;

    let config = ClientConfig::new()
        .with_api_base_url(format!("{}/api/v1", server.uri()))
        .with_timeout(Duration::from_millis(200));
    let client = HttpClient::new(&config, TokenProvider::new(Arc::new(MemoryStore::new())))
        .unwrap();

    let err = client.get::<Value>("/slow", None).await.unwrap_err();
    assert_eq!(err.code.as_deref(), Some(codes::TIMEOUT));
    assert_eq!(err.status, None);
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_connection_failure_is_transport_error() {
    let tokens = TokenProvider::new(Arc::new(MemoryStore::new()));
    let config = ClientConfig::new()
        .with_api_base_url("http://127.0.0.1:1/api/v1")
        .with_timeout(Duration::from_secs(2));
    let client = HttpClient::new(&config, tokens).unwrap();

    let err = client.get::<Echo>("/products", None).await.unwrap_err();
    assert!(err.is_transport());
    assert!(err.code.is_some());
    assert!(!err.message.is_empty());
    assert!(err.data.is_none());
}
