//! Application state shared across handlers.

use std::sync::Arc;

use axum::{http::request::Parts, response::Response};

use crate::config::ServerConfig;
use crate::db::CustomerStore;
use crate::middleware::{InvalidSessionHandler, default_invalid_session_handler};
use crate::services::{AuthService, CallbackService, Notifier, NotifierError};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like the customer store and the outbound HTTP client.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
    invalid_session: InvalidSessionHandler,
}

struct AppStateInner {
    config: ServerConfig,
    customers: Arc<dyn CustomerStore>,
    notifier: Notifier,
}

impl AppState {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `config` - Server configuration
    /// * `customers` - Customer store backend
    ///
    /// # Errors
    ///
    /// Returns an error if the outbound HTTP client cannot be built.
    pub fn new(
        config: ServerConfig,
        customers: Arc<dyn CustomerStore>,
    ) -> Result<Self, NotifierError> {
        let notifier = Notifier::new(&config.notifier)?;

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                customers,
                notifier,
            }),
            invalid_session: default_invalid_session_handler(),
        })
    }

    /// Replace the response produced for requests without a valid session.
    #[must_use]
    pub fn with_invalid_session_handler(mut self, handler: InvalidSessionHandler) -> Self {
        self.invalid_session = handler;
        self
    }

    /// Get a reference to the server configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.inner.config
    }

    /// Get a reference to the customer store.
    #[must_use]
    pub fn customers(&self) -> &dyn CustomerStore {
        self.inner.customers.as_ref()
    }

    /// Get a reference to the webhook notifier.
    #[must_use]
    pub fn notifier(&self) -> &Notifier {
        &self.inner.notifier
    }

    /// Authentication service over this state's store.
    #[must_use]
    pub fn auth(&self) -> AuthService<'_> {
        AuthService::new(self.customers(), self.config().require_password)
    }

    /// Callback registration service over this state's store.
    #[must_use]
    pub fn callbacks(&self) -> CallbackService<'_> {
        CallbackService::new(self.customers())
    }

    /// Response for a request rejected for lack of a valid session.
    #[must_use]
    pub fn invalid_session_response(&self, parts: &Parts) -> Response {
        (self.invalid_session)(parts)
    }
}
