//! Authentication route handlers.
//!
//! Registration, password login and logout. A successful login binds the
//! customer to a fresh session; the session layer sends the cookie.

use axum::extract::State;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::{Value, json};
use tower_sessions::Session;
use tracing::info;

use crate::error::{ApiJson, Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{OptionalSession, clear_current_customer, set_current_customer};
use crate::models::{CurrentCustomer, CustomerProfile};
use crate::state::AppState;

// =============================================================================
// Request Types
// =============================================================================

/// Registration request body.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(alias = "name")]
    pub email: String,
    #[serde(default)]
    pub password: Option<SecretString>,
}

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: SecretString,
}

// =============================================================================
// Handlers
// =============================================================================

/// Handle registration.
///
/// Creates the customer with an empty callback and returns its profile.
pub async fn register(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<RegisterRequest>,
) -> Result<ApiJson<CustomerProfile>> {
    let password = req.password.as_ref().map(ExposeSecret::expose_secret);
    let customer = state.auth().register(&req.email, password).await?;

    Ok(ApiJson(CustomerProfile::from(&customer)))
}

/// Handle login.
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    ApiJson(req): ApiJson<LoginRequest>,
) -> Result<ApiJson<CustomerProfile>> {
    let customer = state
        .auth()
        .login(&req.email, req.password.expose_secret())
        .await?;

    let current = CurrentCustomer {
        id: customer.id,
        email: customer.email.clone(),
    };
    set_current_customer(&session, &current).await?;
    set_sentry_user(&customer.id, Some(customer.email.as_str()));

    info!(customer_id = %customer.id, "Customer logged in");
    Ok(ApiJson(CustomerProfile::from(&customer)))
}

/// Handle logout.
///
/// Succeeds whether or not the caller had a session.
pub async fn logout(
    session: Session,
    OptionalSession(current): OptionalSession,
) -> Result<ApiJson<Value>> {
    clear_current_customer(&session).await?;
    clear_sentry_user();

    if let Some(customer) = current {
        info!(customer_id = %customer.id, "Customer logged out");
    }
    Ok(ApiJson(json!({ "status": "ok" })))
}
