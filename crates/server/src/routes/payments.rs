//! Inbound payment events.
//!
//! The payment provider names the customer directly by ID; no session is
//! involved. A known customer gets the event forwarded to their callback
//! URL in the background, and the event is echoed to the provider
//! immediately.

use axum::extract::State;
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::info;

use callback_notifier_core::CustomerId;

use crate::error::{ApiError, ApiJson, Result};
use crate::state::AppState;

/// Alfamart payment notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentCallback {
    pub payment_id: String,
    pub payment_code: String,
    pub paid_at: PaidAt,
    pub external_id: String,
    pub customer_id: CustomerId,
}

/// RFC 3339 payment time, kept exactly as the provider wrote it.
///
/// Alfamart sends local time with an offset (`+07:00`); the echo and the
/// forwarded webhook carry the same text back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaidAt {
    raw: String,
    parsed: DateTime<FixedOffset>,
}

impl PaidAt {
    /// Parse an RFC 3339 timestamp.
    ///
    /// # Errors
    ///
    /// Returns the chrono parse error for anything that is not RFC 3339.
    pub fn parse(raw: impl Into<String>) -> std::result::Result<Self, chrono::ParseError> {
        let raw = raw.into();
        let parsed = DateTime::parse_from_rfc3339(&raw)?;
        Ok(Self { raw, parsed })
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    #[must_use]
    pub const fn timestamp(&self) -> DateTime<FixedOffset> {
        self.parsed
    }
}

impl Serialize for PaidAt {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

impl<'de> Deserialize<'de> for PaidAt {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(raw).map_err(serde::de::Error::custom)
    }
}

/// Handle a payment event from Alfamart.
///
/// Returns 404 without attempting delivery when the customer is unknown.
pub async fn alfamart_payment_callback(
    State(state): State<AppState>,
    ApiJson(event): ApiJson<PaymentCallback>,
) -> Result<ApiJson<PaymentCallback>> {
    let customer = state
        .customers()
        .find_by_id(event.customer_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("customer not found".to_string()))?;

    info!(
        customer_id = %customer.id,
        payment_id = %event.payment_id,
        paid_at = %event.paid_at.timestamp(),
        "Forwarding payment event"
    );
    state.notifier().notify(&customer, &event);

    Ok(ApiJson(event))
}
