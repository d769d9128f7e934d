//! Health endpoints and request IDs.

use reqwest::StatusCode;
use serde_json::json;

use callback_notifier_integration_tests::TestApp;
use callback_notifier_server::config::CallbackAuthMode;

#[tokio::test]
async fn test_health() {
    let app = TestApp::spawn(CallbackAuthMode::Session).await;

    let resp = app.client.get(app.url("/health")).send().await.expect("Request failed");

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(resp.text().await.expect("invalid body"), "ok");
}

#[tokio::test]
async fn test_readiness_with_memory_store() {
    let app = TestApp::spawn(CallbackAuthMode::Session).await;

    let resp = app
        .client
        .get(app.url("/health/ready"))
        .send()
        .await
        .expect("Request failed");

    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_every_response_has_request_id() {
    let app = TestApp::spawn(CallbackAuthMode::Session).await;

    let ok = app.client.get(app.url("/health")).send().await.expect("Request failed");
    let rejected = app
        .post_json("/callback_url", &json!({"callback_url": "http://x.test"}))
        .await;

    for resp in [ok, rejected] {
        let id = resp
            .headers()
            .get("x-request-id")
            .and_then(|v| v.to_str().ok())
            .expect("missing x-request-id");
        assert!(!id.is_empty());
    }
}

#[tokio::test]
async fn test_upstream_request_id_is_echoed() {
    let app = TestApp::spawn(CallbackAuthMode::Session).await;

    let resp = app
        .client
        .get(app.url("/health"))
        .header("x-request-id", "trace-abc-123")
        .send()
        .await
        .expect("Request failed");

    assert_eq!(
        resp.headers().get("x-request-id").and_then(|v| v.to_str().ok()),
        Some("trace-abc-123")
    );
}
