//! Session enforcement extractors.
//!
//! A session is bound to a customer by [`set_current_customer`] after a
//! successful login. [`RequireSession`] resolves it again on gated routes and
//! rejects the request, before the handler body runs, with whatever response
//! the configured [`InvalidSessionHandler`] produces.

use std::sync::Arc;

use axum::{
    extract::FromRequestParts,
    http::request::Parts,
    response::{IntoResponse, Response},
};
use tower_sessions::Session;
use tracing::warn;

use crate::error::ApiError;
use crate::models::{CurrentCustomer, session_keys};
use crate::state::AppState;

/// Builds the response for a request without a valid session.
pub type InvalidSessionHandler = Arc<dyn Fn(&Parts) -> Response + Send + Sync>;

/// The default handler: 401 with a generic "invalid session" error body.
#[must_use]
pub fn default_invalid_session_handler() -> InvalidSessionHandler {
    Arc::new(|_parts: &Parts| ApiError::Unauthorized("invalid session".to_string()).into_response())
}

/// Extractor that requires a logged-in customer.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireSession(customer): RequireSession,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", customer.email)
/// }
/// ```
pub struct RequireSession(pub CurrentCustomer);

impl FromRequestParts<AppState> for RequireSession {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match current_customer(parts).await {
            Some(customer) => Ok(Self(customer)),
            None => Err(state.invalid_session_response(parts)),
        }
    }
}

/// Extractor that optionally gets the current customer.
///
/// Unlike `RequireSession`, this never rejects the request.
pub struct OptionalSession(pub Option<CurrentCustomer>);

impl<S> FromRequestParts<S> for OptionalSession
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(current_customer(parts).await))
    }
}

/// Resolve the session in request extensions to a customer identity.
///
/// A session store failure is logged and treated as no session.
async fn current_customer(parts: &Parts) -> Option<CurrentCustomer> {
    // Set by SessionManagerLayer
    let session = parts.extensions.get::<Session>()?;

    match session
        .get::<CurrentCustomer>(session_keys::CURRENT_CUSTOMER)
        .await
    {
        Ok(customer) => customer,
        Err(e) => {
            warn!(error = %e, "Failed to load session");
            None
        }
    }
}

/// Bind the session to `customer`.
///
/// The session ID is cycled first, so a token issued before login is never
/// promoted to an authenticated one. The session layer writes the new
/// cookie on the response.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn set_current_customer(
    session: &Session,
    customer: &CurrentCustomer,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session
        .insert(session_keys::CURRENT_CUSTOMER, customer)
        .await
}

/// Drop the session entirely (logout).
///
/// # Errors
///
/// Returns an error if the session store cannot delete the record.
pub async fn clear_current_customer(
    session: &Session,
) -> Result<(), tower_sessions::session::Error> {
    session.flush().await
}
