//! HTTP middleware stack.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (capture errors, transactions)
//! 2. `TraceLayer` (request span with status and latency)
//! 3. Request ID (adds `x-request-id`, records it on the span)
//! 4. Session layer (tower-sessions, memory or `PostgreSQL` store)
//!
//! Session enforcement is an extractor ([`RequireSession`]) applied per
//! handler rather than a layer.

pub mod auth;
pub mod request_id;
pub mod session;

pub use auth::{
    InvalidSessionHandler, OptionalSession, RequireSession, clear_current_customer,
    default_invalid_session_handler, set_current_customer,
};
pub use request_id::{REQUEST_ID_HEADER, request_id_middleware};
pub use session::{SESSION_COOKIE_NAME, create_session_layer};
