//! Outbound webhook delivery.
//!
//! [`Notifier::notify`] is fire-and-forget: the payload is serialized on the
//! caller's task, then a single POST runs on a detached tokio task. Nothing
//! about the outcome flows back to the caller. Failures are logged and
//! dropped; there is no retry and no record of the attempt.

use std::time::Duration;

use reqwest::{Client, StatusCode, header};
use serde::Serialize;
use thiserror::Error;
use tracing::{Instrument, debug, info_span, warn};
use url::Url;

use callback_notifier_core::CustomerId;

use crate::config::NotifierConfig;
use crate::models::Customer;

/// Errors building the shared HTTP client.
#[derive(Debug, Error)]
pub enum NotifierError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
}

/// Why a single delivery attempt failed.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// The payload could not be encoded as JSON.
    #[error("failed to serialize payload: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The customer has not set a callback URL.
    #[error("callback url is not configured")]
    NotConfigured,

    /// The stored callback URL does not parse.
    #[error("invalid callback url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Connection, TLS, timeout or other transport failure.
    #[error("request failed: {0}")]
    Transport(#[source] reqwest::Error),

    /// The endpoint answered outside 200-299.
    #[error("endpoint responded with status {0}")]
    Status(StatusCode),
}

/// Sends event payloads to customer callback URLs.
///
/// Holds one `reqwest::Client` for the life of the process; clones share its
/// connection pool.
#[derive(Clone, Debug)]
pub struct Notifier {
    client: Client,
}

impl Notifier {
    /// Build the notifier and its HTTP client.
    ///
    /// # Errors
    ///
    /// Returns `NotifierError::Client` if the TLS backend cannot be initialized.
    pub fn new(config: &NotifierConfig) -> Result<Self, NotifierError> {
        let client = Client::builder()
            .timeout(config.delivery_timeout)
            .connect_timeout(config.delivery_timeout.min(Duration::from_secs(10)))
            .user_agent(concat!("callback-notifier/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }

    /// Deliver `payload` to the customer's callback URL in the background.
    ///
    /// Returns as soon as the delivery task is spawned. The URL is captured
    /// now, so a later callback change does not affect this delivery.
    pub fn notify<T>(&self, customer: &Customer, payload: &T)
    where
        T: Serialize + ?Sized,
    {
        let customer_id = customer.id;
        let body = match serde_json::to_vec(payload) {
            Ok(body) => body,
            Err(e) => {
                log_failure(customer_id, &DeliveryError::from(e));
                return;
            }
        };

        let notifier = self.clone();
        let url = customer.callback.url.clone();
        let span = info_span!("notify", customer_id = %customer_id);

        tokio::spawn(
            async move {
                match notifier.deliver(&url, body).await {
                    Ok(status) => debug!(status = status.as_u16(), "Notification delivered"),
                    Err(e) => log_failure(customer_id, &e),
                }
            }
            .instrument(span),
        );
    }

    /// Make one delivery attempt and report its outcome.
    ///
    /// # Errors
    ///
    /// Returns a `DeliveryError` for an empty or unparsable URL, a transport
    /// failure, or a non-2xx response.
    pub async fn deliver(&self, url: &str, body: Vec<u8>) -> Result<StatusCode, DeliveryError> {
        if url.trim().is_empty() {
            return Err(DeliveryError::NotConfigured);
        }
        let url = Url::parse(url.trim())?;

        let response = self
            .client
            .post(url)
            .header(header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(DeliveryError::Transport)?;

        let status = response.status();
        if status.is_success() {
            Ok(status)
        } else {
            Err(DeliveryError::Status(status))
        }
    }
}

fn log_failure(customer_id: CustomerId, error: &DeliveryError) {
    warn!(customer_id = %customer_id, error = %error, "Failed to notify customer");
}
