//! Unified error handling with Sentry integration.
//!
//! Every flow-level failure is translated into one `ApiError` at the route
//! boundary. The response body is always `{"status": ..., "error"?: ...}`.
//! Server-side errors are captured to Sentry and their details never reach
//! the client.

use axum::{
    extract::{FromRequest, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::{AuthError, CallbackError};

/// Application-level error type for the HTTP API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed request body or parameters.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// The caller is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Callback registration failed.
    #[error("Callback error: {0}")]
    Callback(#[from] CallbackError),

    /// Session store failure.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

/// Wire shape of every error response.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ApiError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::BadRequest(_)
            | Self::Auth(AuthError::InvalidEmail(_) | AuthError::MissingPassword) => {
                StatusCode::BAD_REQUEST
            }
            Self::Unauthorized(_) | Self::Auth(AuthError::InvalidCredentials) => {
                StatusCode::UNAUTHORIZED
            }
            Self::NotFound(_) | Self::Callback(CallbackError::CustomerNotFound) => {
                StatusCode::NOT_FOUND
            }
            Self::Database(_)
            | Self::Auth(_)
            | Self::Callback(_)
            | Self::Session(_)
            | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show the client, if any.
    fn public_message(&self) -> Option<String> {
        match self {
            Self::BadRequest(msg) | Self::Unauthorized(msg) | Self::NotFound(msg) => {
                Some(msg.clone())
            }
            Self::Auth(err @ (AuthError::InvalidEmail(_) | AuthError::MissingPassword)) => {
                Some(err.to_string())
            }
            Self::Auth(AuthError::InvalidCredentials) => Some("invalid credentials".to_string()),
            Self::Callback(CallbackError::CustomerNotFound) => {
                Some("customer not found".to_string())
            }
            _ => None,
        }
    }

    /// Build the error body without consuming the error.
    #[must_use]
    pub fn body(&self) -> ErrorBody {
        ErrorBody {
            status: status_label(self.status_code()),
            error: self.public_message(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        } else {
            tracing::debug!(error = %self, status = status.as_u16(), "Request rejected");
        }

        (status, axum::Json(self.body())).into_response()
    }
}

/// Short label used in the `status` field of error bodies.
#[must_use]
pub const fn status_label(status: StatusCode) -> &'static str {
    match status.as_u16() {
        400 => "bad request",
        401 => "unauthorized",
        404 => "not found",
        503 => "unavailable",
        _ => "internal error",
    }
}

/// Result type alias for `ApiError`.
pub type Result<T> = std::result::Result<T, ApiError>;

/// JSON extractor and response whose rejection is an [`ApiError`].
///
/// Behaves like `axum::Json`, but a body that fails to decode produces the
/// standard `{"status":"bad request","error":...}` response.
#[derive(Debug, Clone, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

impl<T: Serialize> IntoResponse for ApiJson<T> {
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}

/// Set the Sentry user context for a customer.
///
/// Call this after successful authentication to associate errors with customers.
pub fn set_sentry_user(customer_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(customer_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::to_bytes;
    use callback_notifier_core::EmailError;

    use super::*;

    async fn body_json(err: ApiError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn test_api_error_display() {
        let err = ApiError::NotFound("customer 7".to_string());
        assert_eq!(err.to_string(), "Not found: customer 7");

        let err = ApiError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_api_error_status_codes() {
        assert_eq!(
            ApiError::BadRequest("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Auth(AuthError::InvalidEmail(EmailError::Empty)).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Auth(AuthError::MissingPassword).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Auth(AuthError::InvalidCredentials).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::Callback(CallbackError::CustomerNotFound).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::Auth(AuthError::CustomerAlreadyExists).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::Database(RepositoryError::NotFound).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_client_error_body() {
        let (status, body) = body_json(ApiError::Unauthorized("invalid session".into())).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(
            body,
            serde_json::json!({"status": "unauthorized", "error": "invalid session"})
        );
    }

    #[tokio::test]
    async fn test_server_error_body_hides_details() {
        let (status, body) = body_json(ApiError::Database(RepositoryError::DataCorruption(
            "callback row missing for customer 3".into(),
        )))
        .await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, serde_json::json!({"status": "internal error"}));
    }

    #[tokio::test]
    async fn test_duplicate_registration_body_is_generic() {
        let (status, body) = body_json(ApiError::Auth(AuthError::CustomerAlreadyExists)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.get("error").is_none());
    }
}
