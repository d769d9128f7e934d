//! Integration test harness for the callback notifier.
//!
//! Each test spawns the real router from [`build_app`] on an ephemeral port,
//! backed by the in-memory customer and session stores, and drives it over
//! HTTP with `reqwest`. Outbound webhooks are caught by a [`WebhookReceiver`]
//! running in the same process.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p callback-notifier-integration-tests
//! ```

use std::{net::SocketAddr, sync::Arc, time::Duration};

use axum::{
    Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode},
    routing::post,
};
use reqwest::{Client, Response};
use serde_json::{Value, json};
use tokio::{
    net::TcpListener,
    sync::{mpsc, watch},
};
use tower_sessions::MemoryStore;

use callback_notifier_server::{
    AppState, build_app,
    config::{CallbackAuthMode, ServerConfig},
    db::MemoryCustomerStore,
};

/// A running server plus a cookie-keeping client.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
    pub customers: Arc<MemoryCustomerStore>,
}

impl TestApp {
    /// Spawn a server on the memory backends in the given callback mode.
    pub async fn spawn(mode: CallbackAuthMode) -> Self {
        Self::spawn_with(ServerConfig::in_memory(mode), |state| state).await
    }

    /// Spawn a server, letting the caller adjust the state before it is served.
    pub async fn spawn_with(
        config: ServerConfig,
        customize: impl FnOnce(AppState) -> AppState,
    ) -> Self {
        let customers = Arc::new(MemoryCustomerStore::new());
        let state = AppState::new(config, customers.clone())
            .expect("Failed to initialize application state");
        let app = build_app(customize(state), MemoryStore::default());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Failed to read local address");
        tokio::spawn(async move { axum::serve(listener, app).await });

        Self {
            addr,
            client: cookie_client(),
            customers,
        }
    }

    /// Absolute URL for `path` on this server.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{path}", self.addr)
    }

    /// POST a JSON body with the shared client.
    pub async fn post_json(&self, path: &str, body: &Value) -> Response {
        post_json_with(&self.client, &self.url(path), body).await
    }

    /// Register a customer and return the profile JSON.
    pub async fn register(&self, email: &str, password: &str) -> Value {
        let resp = self
            .post_json("/register", &json!({"email": email, "password": password}))
            .await;
        assert_eq!(resp.status(), StatusCode::OK, "registration failed");
        resp.json().await.expect("Failed to decode register response")
    }

    /// Log in with the shared client, so later requests carry the session.
    pub async fn login(&self, email: &str, password: &str) -> Response {
        self.post_json("/login", &json!({"email": email, "password": password}))
            .await
    }

    /// Current callback URL stored for `email`.
    pub async fn stored_callback_url(&self, email: &str) -> String {
        use callback_notifier_server::db::CustomerStore;

        let email = callback_notifier_core::Email::parse(email).expect("Invalid test email");
        self.customers
            .find_by_email(&email)
            .await
            .expect("Store lookup failed")
            .expect("Customer not found")
            .callback
            .url
    }
}

/// A client that keeps cookies between requests.
#[must_use]
pub fn cookie_client() -> Client {
    Client::builder()
        .cookie_store(true)
        .build()
        .expect("Failed to create HTTP client")
}

/// POST `body` as JSON using `client`.
pub async fn post_json_with(client: &Client, url: &str, body: &Value) -> Response {
    client
        .post(url)
        .json(body)
        .send()
        .await
        .expect("Request failed")
}

/// One request received by a [`WebhookReceiver`].
#[derive(Debug)]
pub struct Delivery {
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl Delivery {
    /// Decode the body as JSON.
    #[must_use]
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("Delivery body is not JSON")
    }
}

/// In-process webhook endpoint that records every POST it receives.
///
/// A delivery is recorded as soon as its request arrives. The response can
/// be held back with [`WebhookReceiver::spawn_held`] until
/// [`WebhookReceiver::release`] is called.
pub struct WebhookReceiver {
    pub url: String,
    rx: mpsc::UnboundedReceiver<Delivery>,
    gate: watch::Sender<bool>,
}

#[derive(Clone)]
struct ReceiverState {
    tx: mpsc::UnboundedSender<Delivery>,
    gate: watch::Receiver<bool>,
    status: StatusCode,
}

async fn record(State(state): State<ReceiverState>, headers: HeaderMap, body: Bytes) -> StatusCode {
    let _ = state.tx.send(Delivery { headers, body });
    let mut gate = state.gate;
    let _ = gate.wait_for(|open| *open).await;
    state.status
}

impl WebhookReceiver {
    /// Start a receiver at `/hook` that answers every POST with `status`.
    pub async fn spawn(status: StatusCode) -> Self {
        Self::start(status, true).await
    }

    /// Start a receiver that records requests but does not answer them
    /// until [`release`](Self::release) is called.
    pub async fn spawn_held(status: StatusCode) -> Self {
        Self::start(status, false).await
    }

    async fn start(status: StatusCode, open: bool) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let (gate, gate_rx) = watch::channel(open);
        let app = Router::new().route("/hook", post(record)).with_state(ReceiverState {
            tx,
            gate: gate_rx,
            status,
        });

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind receiver listener");
        let addr = listener.local_addr().expect("Failed to read local address");
        tokio::spawn(async move { axum::serve(listener, app).await });

        Self {
            url: format!("http://{addr}/hook"),
            rx,
            gate,
        }
    }

    /// Let held requests, and every later one, be answered.
    pub fn release(&self) {
        self.gate.send_replace(true);
    }

    /// Wait for the next delivery, up to `timeout`.
    pub async fn next(&mut self, timeout: Duration) -> Option<Delivery> {
        tokio::time::timeout(timeout, self.rx.recv())
            .await
            .ok()
            .flatten()
    }

    /// Assert nothing arrives within `window`.
    pub async fn assert_quiet(&mut self, window: Duration) {
        if let Some(delivery) = self.next(window).await {
            panic!("unexpected delivery: {delivery:?}");
        }
    }
}
