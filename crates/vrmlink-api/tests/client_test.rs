#![allow(clippy::unwrap_used)]
// Integration tests for `VrmClient` using wiremock.

use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use vrmlink_api::{Error, TransportConfig, VrmClient};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, VrmClient) {
    let server = MockServer::start().await;
    let base_url = Url::parse(&server.uri()).unwrap();
    let client = VrmClient::with_base_url(base_url, &TransportConfig::default()).unwrap();
    (server, client)
}

const AUTH: &str = "Bearer user-token";

// ── Authentication tests ────────────────────────────────────────────

#[tokio::test]
async fn test_login_success() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .and(body_json(json!({
            "username": "alice@example.com",
            "password": "hunter2",
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "login_success",
            "token": "short-lived-token",
            "idUser": 4242,
        })))
        .mount(&server)
        .await;

    let secret: secrecy::SecretString = "hunter2".to_string().into();
    let ok = client.login("alice@example.com", &secret).await.unwrap();

    assert_eq!(ok.token, "short-lived-token");
    assert_eq!(ok.id_user, 4242);
}

#[tokio::test]
async fn test_login_rejected_status() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "login_failed",
        })))
        .mount(&server)
        .await;

    let secret: secrecy::SecretString = "wrong".to_string().into();
    let result = client.login("alice@example.com", &secret).await;

    assert!(
        matches!(result, Err(Error::Authentication { .. })),
        "expected Authentication error, got: {result:?}"
    );
}

#[tokio::test]
async fn test_login_missing_token() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "login_success",
            "idUser": 4242,
        })))
        .mount(&server)
        .await;

    let secret: secrecy::SecretString = "hunter2".to_string().into();
    let result = client.login("alice@example.com", &secret).await;

    match result {
        Err(Error::Authentication { ref message }) => {
            assert!(message.contains("missing token"), "got: {message}");
        }
        other => panic!("expected Authentication error, got: {other:?}"),
    }
}

// ── Access-token tests ──────────────────────────────────────────────

#[tokio::test]
async fn test_list_access_tokens() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/users/4242/accesstokens"))
        .and(header("x-authorization", AUTH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "tokens": [
                { "name": "vrm-cloud-mqtt", "idAccessToken": "tok-1" },
                { "name": "grafana", "idAccessToken": "tok-2" },
            ]
        })))
        .mount(&server)
        .await;

    let tokens = client.list_access_tokens(4242, AUTH).await.unwrap();

    assert_eq!(tokens.len(), 2);
    assert_eq!(tokens[0].name, "vrm-cloud-mqtt");
    assert_eq!(tokens[0].id_access_token, "tok-1");
    assert_eq!(tokens[1].name, "grafana");
}

#[tokio::test]
async fn test_list_access_tokens_envelope_failure() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/users/4242/accesstokens"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
            "errors": "expired token",
            "error_code": "auth_error",
        })))
        .mount(&server)
        .await;

    let result = client.list_access_tokens(4242, AUTH).await;

    match result {
        Err(Error::Api { ref message }) => {
            assert!(message.contains("auth_error"), "got: {message}");
            assert!(message.contains("expired token"), "got: {message}");
        }
        other => panic!("expected Api error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_create_access_token() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/users/4242/accesstokens"))
        .and(header("x-authorization", AUTH))
        .and(body_json(json!({ "name": "vrm-cloud-mqtt" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "token": "long-lived-token",
            "idAccessToken": "tok-9",
        })))
        .mount(&server)
        .await;

    let token = client
        .create_access_token(4242, "vrm-cloud-mqtt", AUTH)
        .await
        .unwrap();

    assert_eq!(token, "long-lived-token");
}

#[tokio::test]
async fn test_create_access_token_failure() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/users/4242/accesstokens"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": false,
        })))
        .mount(&server)
        .await;

    let result = client.create_access_token(4242, "vrm-cloud-mqtt", AUTH).await;

    assert!(
        matches!(result, Err(Error::Api { .. })),
        "expected Api error, got: {result:?}"
    );
}

#[tokio::test]
async fn test_revoke_access_token() {
    let (server, client) = setup().await;

    Mock::given(method("DELETE"))
        .and(path("/users/4242/accesstokens/tok-1"))
        .and(header("x-authorization", AUTH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "success": true })))
        .mount(&server)
        .await;

    client.revoke_access_token(4242, "tok-1", AUTH).await.unwrap();
}

// ── Installation tests ──────────────────────────────────────────────

#[tokio::test]
async fn test_list_installations() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/users/4242/installations"))
        .and(header("x-authorization", AUTH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "success": true,
            "records": [
                { "idSite": 101, "name": "Boat" },
                { "idSite": 202 },
            ]
        })))
        .mount(&server)
        .await;

    let sites = client.list_installations(4242, AUTH).await.unwrap();

    assert_eq!(sites.len(), 2);
    assert_eq!(sites[0].id_site, 101);
    assert_eq!(sites[0].name.as_deref(), Some("Boat"));
    assert_eq!(sites[1].id_site, 202);
    assert!(sites[1].name.is_none());
}

// ── Diagnostics tests ───────────────────────────────────────────────

#[tokio::test]
async fn test_diagnostics_mixed_value_types() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/installations/101/diagnostics"))
        .and(header("x-authorization", AUTH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "records": [
                {
                    "Device": "Solar Charger",
                    "instance": 1,
                    "description": "Battery Voltage",
                    "rawValue": 12.8,
                },
                {
                    "Device": "Solar Charger",
                    "instance": 1,
                    "description": "Charge state",
                    "rawValue": "Bulk",
                },
            ]
        })))
        .mount(&server)
        .await;

    let records = client.diagnostics(101, AUTH).await.unwrap();

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].device, "Solar Charger");
    assert_eq!(records[0].instance, 1);
    assert_eq!(records[0].raw_value, json!(12.8));
    assert_eq!(records[1].raw_value, json!("Bulk"));
}

// ── Error tests ─────────────────────────────────────────────────────

#[tokio::test]
async fn test_unauthorized_status() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let result = client.list_installations(4242, AUTH).await;

    assert!(
        matches!(result, Err(Error::Authentication { .. })),
        "expected Authentication error, got: {result:?}"
    );
}

#[tokio::test]
async fn test_http_error_status() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&server)
        .await;

    let result = client.list_installations(4242, AUTH).await;

    match result {
        Err(Error::Api { ref message }) => {
            assert!(message.contains("502"), "got: {message}");
        }
        other => panic!("expected Api error, got: {other:?}"),
    }
}

#[tokio::test]
async fn test_malformed_body() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let result = client.list_installations(4242, AUTH).await;

    assert!(
        matches!(result, Err(Error::Deserialization { .. })),
        "expected Deserialization error, got: {result:?}"
    );
}
