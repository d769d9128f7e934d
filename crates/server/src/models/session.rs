//! Session-related types.

use serde::{Deserialize, Serialize};

use callback_notifier_core::{CustomerId, Email};

/// Session-stored customer identity.
///
/// The email is the identity key the callback flow resolves; the ID is kept
/// alongside it for logging and Sentry user context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentCustomer {
    /// Customer's database ID.
    pub id: CustomerId,
    /// Customer's identity key.
    pub email: Email,
}

/// Session keys for authentication data.
pub mod keys {
    /// Key for storing the current logged-in customer.
    pub const CURRENT_CUSTOMER: &str = "current_customer";
}
