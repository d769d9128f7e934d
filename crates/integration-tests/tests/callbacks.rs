//! Callback URL registration in both authorization modes.

use std::sync::Arc;

use axum::{http::request::Parts, response::IntoResponse};
use reqwest::StatusCode;
use serde_json::{Value, json};

use callback_notifier_integration_tests::{TestApp, cookie_client, post_json_with};
use callback_notifier_server::config::{CallbackAuthMode, ServerConfig};

// ============================================================================
// Session mode
// ============================================================================

#[tokio::test]
async fn test_set_callback_with_session() {
    let app = TestApp::spawn(CallbackAuthMode::Session).await;
    app.register("a@x.com", "pw").await;
    assert_eq!(app.login("a@x.com", "pw").await.status(), StatusCode::OK);

    let request = json!({"callback_url": "http://www.example.com"});
    let resp = app.post_json("/callback_url", &request).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.expect("invalid JSON");
    assert_eq!(body, request);
    assert_eq!(
        app.stored_callback_url("a@x.com").await,
        "http://www.example.com"
    );
}

#[tokio::test]
async fn test_set_callback_without_session_is_rejected() {
    let app = TestApp::spawn(CallbackAuthMode::Session).await;
    app.register("a@x.com", "pw").await;

    let resp = app
        .post_json("/callback_url", &json!({"callback_url": "http://evil.test"}))
        .await;

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = resp.json().await.expect("invalid JSON");
    assert_eq!(
        body,
        json!({"status": "unauthorized", "error": "invalid session"})
    );
    assert_eq!(app.stored_callback_url("a@x.com").await, "");
}

#[tokio::test]
async fn test_forged_session_cookie_is_rejected() {
    let app = TestApp::spawn(CallbackAuthMode::Session).await;
    app.register("a@x.com", "pw").await;

    let resp = reqwest::Client::new()
        .post(app.url("/callback_url"))
        .header(reqwest::header::COOKIE, "notifier_session=forged-token")
        .json(&json!({"callback_url": "http://evil.test"}))
        .send()
        .await
        .expect("Request failed");

    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(app.stored_callback_url("a@x.com").await, "");
}

#[tokio::test]
async fn test_session_mode_ignores_customer_id_in_body() {
    let app = TestApp::spawn(CallbackAuthMode::Session).await;
    app.register("a@x.com", "pw").await;
    let other = app.register("b@x.com", "pw").await;
    app.login("a@x.com", "pw").await;

    let resp = app
        .post_json(
            "/callback_url",
            &json!({"callback_url": "http://a.test", "customer_id": other["id"]}),
        )
        .await;

    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(app.stored_callback_url("a@x.com").await, "http://a.test");
    assert_eq!(app.stored_callback_url("b@x.com").await, "");
}

#[tokio::test]
async fn test_sessions_are_per_client() {
    let app = TestApp::spawn(CallbackAuthMode::Session).await;
    app.register("a@x.com", "pw").await;
    app.register("b@x.com", "pw").await;

    let other = cookie_client();
    let login = post_json_with(
        &other,
        &app.url("/login"),
        &json!({"email": "b@x.com", "password": "pw"}),
    )
    .await;
    assert_eq!(login.status(), StatusCode::OK);
    app.login("a@x.com", "pw").await;

    post_json_with(
        &other,
        &app.url("/callback_url"),
        &json!({"callback_url": "http://b.test"}),
    )
    .await;
    app.post_json("/callback_url", &json!({"callback_url": "http://a.test"}))
        .await;

    assert_eq!(app.stored_callback_url("a@x.com").await, "http://a.test");
    assert_eq!(app.stored_callback_url("b@x.com").await, "http://b.test");
}

#[tokio::test]
async fn test_empty_and_malformed_urls_are_stored() {
    let app = TestApp::spawn(CallbackAuthMode::Session).await;
    app.register("a@x.com", "pw").await;
    app.login("a@x.com", "pw").await;

    let resp = app
        .post_json("/callback_url", &json!({"callback_url": "not a url"}))
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(app.stored_callback_url("a@x.com").await, "not a url");

    let resp = app
        .post_json("/callback_url", &json!({"callback_url": ""}))
        .await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(app.stored_callback_url("a@x.com").await, "");
}

#[tokio::test]
async fn test_custom_invalid_session_handler() {
    let app = TestApp::spawn_with(ServerConfig::in_memory(CallbackAuthMode::Session), |state| {
        state.with_invalid_session_handler(Arc::new(|_parts: &Parts| {
            (StatusCode::FORBIDDEN, "login first").into_response()
        }))
    })
    .await;

    let resp = app
        .post_json("/callback_url", &json!({"callback_url": "http://x.test"}))
        .await;

    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert_eq!(resp.text().await.expect("invalid body"), "login first");
}

// ============================================================================
// Customer-id mode
// ============================================================================

#[tokio::test]
async fn test_set_callback_by_customer_id() {
    let app = TestApp::spawn(CallbackAuthMode::CustomerId).await;
    let profile = app.register("a@x.com", "pw").await;

    let request = json!({"callback_url": "http://hooks.test", "customer_id": profile["id"]});
    let resp = app.post_json("/callback_url", &request).await;

    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.expect("invalid JSON");
    assert_eq!(body, request);
    assert_eq!(app.stored_callback_url("a@x.com").await, "http://hooks.test");
}

#[tokio::test]
async fn test_customer_id_mode_requires_customer_id() {
    let app = TestApp::spawn(CallbackAuthMode::CustomerId).await;
    app.register("a@x.com", "pw").await;

    let resp = app
        .post_json("/callback_url", &json!({"callback_url": "http://hooks.test"}))
        .await;

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.expect("invalid JSON");
    assert_eq!(body["status"], "bad request");
    assert_eq!(app.stored_callback_url("a@x.com").await, "");
}

#[tokio::test]
async fn test_customer_id_mode_unknown_customer() {
    let app = TestApp::spawn(CallbackAuthMode::CustomerId).await;

    let resp = app
        .post_json(
            "/callback_url",
            &json!({"callback_url": "http://hooks.test", "customer_id": 999}),
        )
        .await;

    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = resp.json().await.expect("invalid JSON");
    assert_eq!(body, json!({"status": "not found", "error": "customer not found"}));
}
