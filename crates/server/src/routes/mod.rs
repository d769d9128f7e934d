//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                     - Liveness check
//! GET  /health/ready               - Readiness check (store reachable)
//!
//! # Auth
//! POST /register                   - Register a customer
//! POST /login                      - Login, binds the session
//! POST /logout                     - Drop the session
//!
//! # Callbacks
//! POST /callback_url               - Set the callback URL (session or explicit id)
//!
//! # Payment events
//! POST /alfamart_payment_callback  - Inbound payment event, forwarded to the customer
//! ```

pub mod auth;
pub mod callback;
pub mod health;
pub mod payments;

use axum::{
    Router,
    routing::{get, post},
};

use crate::config::CallbackAuthMode;
use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
}

/// Create the callback registration router.
///
/// Exactly one handler is wired for `/callback_url`, chosen by `mode`.
pub fn callback_routes(mode: CallbackAuthMode) -> Router<AppState> {
    let handler = match mode {
        CallbackAuthMode::Session => post(callback::set_with_session),
        CallbackAuthMode::CustomerId => post(callback::set_with_customer_id),
    };
    Router::new().route("/callback_url", handler)
}

/// Create all routes for the service.
pub fn routes(mode: CallbackAuthMode) -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .merge(auth_routes())
        .merge(callback_routes(mode))
        .route(
            "/alfamart_payment_callback",
            post(payments::alfamart_payment_callback),
        )
}
