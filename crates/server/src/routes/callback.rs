//! Callback URL registration handlers.
//!
//! Which handler serves `/callback_url` is fixed at startup by
//! [`CallbackAuthMode`](crate::config::CallbackAuthMode).

use axum::extract::State;
use serde::{Deserialize, Serialize};

use callback_notifier_core::CustomerId;

use crate::error::{ApiError, ApiJson, Result};
use crate::middleware::RequireSession;
use crate::state::AppState;

/// Request body for `/callback_url`. Echoed back on success.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallbackUrlRequest {
    pub callback_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<CustomerId>,
}

/// Set the callback URL of the logged-in customer.
///
/// A `customer_id` in the body is ignored; the session decides whose
/// callback changes.
pub async fn set_with_session(
    State(state): State<AppState>,
    RequireSession(current): RequireSession,
    ApiJson(req): ApiJson<CallbackUrlRequest>,
) -> Result<ApiJson<CallbackUrlRequest>> {
    state
        .callbacks()
        .set_url_for_email(&current.email, &req.callback_url)
        .await?;
    Ok(ApiJson(req))
}

/// Set the callback URL of the customer named in the body.
pub async fn set_with_customer_id(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CallbackUrlRequest>,
) -> Result<ApiJson<CallbackUrlRequest>> {
    let customer_id = req
        .customer_id
        .ok_or_else(|| ApiError::BadRequest("customer_id is required".to_string()))?;

    state
        .callbacks()
        .set_url_for_id(customer_id, &req.callback_url)
        .await?;
    Ok(ApiJson(req))
}
