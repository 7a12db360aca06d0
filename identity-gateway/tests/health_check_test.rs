//! Health, metrics and OpenAPI endpoint tests.

mod common;

use common::TestApp;
use service_core::observability::REQUEST_ID_HEADER;

#[tokio::test]
async fn health_check_returns_200() {
    // Arrange
    let app = TestApp::spawn().await;

    // Act
    let response = app.get("/health").await;

    // Assert
    assert_eq!(response.status(), 200);
    assert!(response.headers().contains_key(REQUEST_ID_HEADER));

    let body: serde_json::Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["service"], "identity-gateway");
    assert_eq!(body["registration_enabled"], true);
}

#[tokio::test]
async fn health_check_reports_token_only_mode() {
    let app = TestApp::spawn_token_only().await;

    let response = app.get("/health").await;

    let body: serde_json::Value = response.json().await.expect("Failed to parse response");
    assert_eq!(body["registration_enabled"], false);
}

#[tokio::test]
async fn metrics_endpoint_exposes_prometheus_text() {
    // Arrange
    let app = TestApp::spawn().await;
    app.get("/health").await;

    // Act
    let response = app.get("/metrics").await;

    // Assert
    assert_eq!(response.status(), 200);
    let body = response.text().await.expect("Failed to read body");
    assert!(body.contains("http_requests_total"));
}

#[tokio::test]
async fn openapi_document_lists_gateway_routes() {
    let app = TestApp::spawn().await;

    let response = app.get("/.well-known/openapi.json").await;

    assert_eq!(response.status(), 200);
    let body: serde_json::Value = response.json().await.expect("Failed to parse response");
    assert!(body["paths"]["/api/v1/token"].is_object());
    assert!(body["paths"]["/api/v1/register"].is_object());
}
