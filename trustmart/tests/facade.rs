//! The assembled client.

use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use trustmart::{ClientConfig, FileStore, MemoryStore, SessionStore, Trustmart};
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(server: &MockServer) -> ClientConfig {
    ClientConfig::new()
        .with_api_base_url(format!("{}/api/v1", server.uri()))
        .with_backend_url(server.uri())
        .with_app_url(server.uri())
        .with_timeout(Duration::from_secs(5))
}

async fn mount_login(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/api/v1/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": true,
            "data": {"user": {"id": 4, "email": "ada@example.com"}, "token": "jwt-1"}
        })))
        .mount(server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/v1/users/user"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": true,
            "data": {"user": {"id": 4, "email": "ada@example.com", "roles": ["seller"]}}
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_login_token_reaches_other_clients() {
    let server = MockServer::start().await;
    mount_login(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/v1/products"))
        .and(header("Authorization", "Bearer jwt-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": true,
            "message": "",
            "data": {
                "products": [],
                "pagination": {"page": 1, "limit": 20, "total": 0, "pages": 0}
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = Trustmart::new(config_for(&server)).unwrap();
    let user = client.session.login("ada", "pw").await.unwrap();
    assert_eq!(user.roles, vec!["seller".to_string()]);

    let page = client.products.list_all(1, 20).await.unwrap().into_data();
    assert!(page.products.is_empty());
}

#[tokio::test]
async fn test_file_store_keeps_token_between_clients() {
    let server = MockServer::start().await;
    mount_login(&server).await;

    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("session.json");

    let first = Trustmart::with_stores(
        config_for(&server),
        Arc::new(FileStore::open(&file).unwrap()),
        Arc::new(MemoryStore::new()),
    )
    .unwrap();
    first.session.login("ada", "pw").await.unwrap();

    let second = Trustmart::with_stores(
        config_for(&server),
        Arc::new(FileStore::open(&file).unwrap()),
        Arc::new(MemoryStore::new()),
    )
    .unwrap();
    assert!(second.session.is_authenticated());

    second.session.logout();
    let reopened = FileStore::open(&file).unwrap();
    assert_eq!(reopened.get("tm_access_token"), None);
}

#[tokio::test]
async fn test_builtin_providers_registered() {
    let client = Trustmart::new(ClientConfig::new()).unwrap();
    let names: Vec<&str> = client.connect.config().provider_names().collect();
    assert_eq!(names, vec!["facebook", "instagram", "twitter"]);
}

#[tokio::test]
async fn test_product_wizard_for_seller() {
    let client = Trustmart::new(ClientConfig::new()).unwrap();
    let wizard = client.product_wizard(9);
    assert_eq!(wizard.form().seller_id, 9);
    assert_eq!(wizard.form().currency, "USD");
}
