//! Integration tests for the OAuth client against a mock token endpoint.

use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use ledgersync_vault::{OAuthClient, OAuthConfig, VaultError};

fn config_for(server: &MockServer) -> OAuthConfig {
    let mut config = OAuthConfig::new(
        "client-id".to_string(),
        "client-secret".to_string(),
        "https://sync.example.com/api/admin/xero-callback".to_string(),
    );
    config.token_url = format!("{}/connect/token", server.uri());
    config.connections_url = format!("{}/connections", server.uri());
    config
}

// "client-id:client-secret" base64-encoded.
const EXPECTED_BASIC: &str = "Basic Y2xpZW50LWlkOmNsaWVudC1zZWNyZXQ=";

#[tokio::test]
async fn test_exchange_code_uses_basic_auth_and_form_body() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/connect/token"))
        .and(header("authorization", EXPECTED_BASIC))
        .and(body_string_contains("grant_type=authorization_code"))
        .and(body_string_contains("code=auth-code-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "at-1",
            "refresh_token": "rt-1",
            "expires_in": 1800
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = OAuthClient::new(config_for(&server));
    let tokens = client.exchange_code("auth-code-1").await.unwrap();

    assert_eq!(tokens.access_token, "at-1");
    assert_eq!(tokens.refresh_token, "rt-1");
    assert_eq!(tokens.expires_in, 1800);
}

#[tokio::test]
async fn test_refresh_sends_refresh_grant() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/connect/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("refresh_token=rt-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "access_token": "at-2",
            "refresh_token": "rt-2",
            "expires_in": 1800
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = OAuthClient::new(config_for(&server));
    let tokens = client.refresh("rt-1").await.unwrap();

    // Xero rotates the refresh token on every use.
    assert_eq!(tokens.refresh_token, "rt-2");
}

#[tokio::test]
async fn test_rejected_token_request_is_an_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/connect/token"))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(serde_json::json!({ "error": "invalid_grant" })),
        )
        .mount(&server)
        .await;

    let client = OAuthClient::new(config_for(&server));
    let err = client.refresh("rt-stale").await.unwrap_err();

    match err {
        VaultError::TokenEndpoint(message) => assert!(message.contains("400")),
        other => panic!("expected TokenEndpoint, got {other:?}"),
    }
}

#[tokio::test]
async fn test_unconfigured_client_never_hits_the_network() {
    let client = OAuthClient::new(OAuthConfig::new(
        String::new(),
        String::new(),
        String::new(),
    ));
    let err = client.exchange_code("code").await.unwrap_err();
    assert!(matches!(err, VaultError::NotConfigured));
}

#[tokio::test]
async fn test_connections_lists_authorized_tenants() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/connections"))
        .and(header("authorization", "Bearer at-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
            { "tenantId": "t-1", "tenantName": "Demo Company" },
            { "tenantId": "t-2" }
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let client = OAuthClient::new(config_for(&server));
    let connections = client.connections("at-1").await.unwrap();

    assert_eq!(connections.len(), 2);
    assert_eq!(connections[0].tenant_id, "t-1");
    assert_eq!(connections[0].tenant_name.as_deref(), Some("Demo Company"));
    assert!(connections[1].tenant_name.is_none());
}
