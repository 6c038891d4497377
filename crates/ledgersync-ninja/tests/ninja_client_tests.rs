//! Integration tests for the Invoice Ninja client against a mock server.

use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use ledgersync_ninja::{NinjaClient, NinjaError, SourceFeed};

#[tokio::test]
async fn test_fetch_invoice_sends_api_token_and_unwraps_envelope() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/invoices/inv_1"))
        .and(header("X-API-TOKEN", "token-123"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": {
                "id": "inv_1",
                "number": "INV-0001",
                "client_id": "c_1",
                "status_id": "2",
                "amount": 250.0,
                "date": "2026-01-15",
                "line_items": [
                    { "product_key": "WIDGET", "notes": "Widgets", "quantity": 2, "cost": 125.0 }
                ]
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = NinjaClient::new(server.uri(), "token-123");
    let invoice = client.fetch_invoice("inv_1").await.unwrap();

    assert_eq!(invoice.number, "INV-0001");
    assert_eq!(invoice.client_id, "c_1");
    assert_eq!(invoice.line_items.len(), 1);
    assert!(!invoice.is_draft());
}

#[tokio::test]
async fn test_missing_invoice_maps_to_not_found() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/invoices/inv_gone"))
        .respond_with(ResponseTemplate::new(404).set_body_string("{}"))
        .mount(&server)
        .await;

    let client = NinjaClient::new(server.uri(), "token-123");
    let err = client.fetch_invoice("inv_gone").await.unwrap_err();

    match err {
        NinjaError::NotFound { entity, id } => {
            assert_eq!(entity, "invoice");
            assert_eq!(id, "inv_gone");
        }
        other => panic!("expected NotFound, got {other:?}"),
    }
}

#[tokio::test]
async fn test_server_error_carries_truncated_body() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/payments/pay_1"))
        .respond_with(ResponseTemplate::new(500).set_body_string("x".repeat(1000)))
        .mount(&server)
        .await;

    let client = NinjaClient::new(server.uri(), "token-123");
    let err = client.fetch_payment("pay_1").await.unwrap_err();

    match err {
        NinjaError::Api { status, body } => {
            assert_eq!(status, 500);
            assert_eq!(body.len(), 200);
        }
        other => panic!("expected Api, got {other:?}"),
    }
}

#[tokio::test]
async fn test_list_invoices_passes_date_filter() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/invoices"))
        .and(query_param("start_date", "2026-01-01"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": [
                { "id": "inv_1", "number": "INV-0001", "status_id": "2" },
                { "id": "inv_2", "number": "INV-0002", "status_id": "1" }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = NinjaClient::new(server.uri(), "token-123");
    let since = chrono::NaiveDate::from_ymd_opt(2026, 1, 1);
    let invoices = client.list_invoices(since).await.unwrap();

    assert_eq!(invoices.len(), 2);
    assert!(invoices[1].is_draft());
}

#[tokio::test]
async fn test_trailing_slash_in_base_url_is_tolerated() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/clients/c_1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "data": { "id": "c_1", "name": "Acme Pty Ltd" }
        })))
        .mount(&server)
        .await;

    let client = NinjaClient::new(format!("{}/", server.uri()), "token-123");
    let fetched = client.fetch_client("c_1").await.unwrap();
    assert_eq!(fetched.display_name(), "Acme Pty Ltd");
}
