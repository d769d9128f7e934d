//! Health check handlers.

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use tracing::warn;

use crate::error::{ErrorBody, status_label};
use crate::state::AppState;

/// Liveness health check endpoint.
///
/// Returns 200 OK if the server is running.
pub async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 200 if the customer store answers, 503 otherwise.
pub async fn readiness(State(state): State<AppState>) -> impl IntoResponse {
    match state.customers().ping().await {
        Ok(()) => (StatusCode::OK, "ok").into_response(),
        Err(e) => {
            warn!(error = %e, "Readiness check failed");
            let status = StatusCode::SERVICE_UNAVAILABLE;
            (
                status,
                axum::Json(ErrorBody {
                    status: status_label(status),
                    error: Some("customer store unreachable".to_string()),
                }),
            )
                .into_response()
        }
    }
}
