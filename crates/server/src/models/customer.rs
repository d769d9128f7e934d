//! Customer aggregate.
//!
//! A [`Customer`] always owns exactly one [`Callback`]; the store creates
//! both in the same transaction and never deletes either.

use chrono::{DateTime, Utc};
use serde::Serialize;

use callback_notifier_core::{CallbackId, CustomerId, Email};

/// A customer not yet saved. The store assigns the ID.
#[derive(Debug, Clone)]
pub struct NewCustomer {
    /// Identity key, unique across the store.
    pub email: Email,
    /// Argon2 PHC string, absent when registration did not carry a password.
    pub password_hash: Option<String>,
}

impl NewCustomer {
    /// Create an unsaved customer.
    #[must_use]
    pub const fn new(email: Email, password_hash: Option<String>) -> Self {
        Self {
            email,
            password_hash,
        }
    }
}

/// A persisted customer together with its callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Customer {
    /// Store-assigned ID, never reassigned.
    pub id: CustomerId,
    /// Identity key.
    pub email: Email,
    /// Argon2 PHC string.
    pub password_hash: Option<String>,
    /// The customer's one notification endpoint.
    pub callback: Callback,
    /// When the customer was created.
    pub created_at: DateTime<Utc>,
    /// When the customer was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Notification endpoint settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Callback {
    /// Database ID of the callback row.
    pub id: CallbackId,
    /// Owning customer. Set once at creation.
    pub customer_id: CustomerId,
    /// Target of outbound notifications. Empty means not configured yet.
    ///
    /// Stored verbatim; nothing checks that it is a valid URL.
    pub url: String,
    /// When the callback was created.
    pub created_at: DateTime<Utc>,
    /// When the callback was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Callback {
    /// Whether a URL has been set.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        !self.url.trim().is_empty()
    }
}

/// Public view of a customer returned by `/register` and `/login`.
///
/// Never includes the password hash.
#[derive(Debug, Clone, Serialize)]
pub struct CustomerProfile {
    pub id: CustomerId,
    pub email: Email,
    pub callback_url: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&Customer> for CustomerProfile {
    fn from(customer: &Customer) -> Self {
        Self {
            id: customer.id,
            email: customer.email.clone(),
            callback_url: customer.callback.url.clone(),
            created_at: customer.created_at,
            updated_at: customer.updated_at,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn sample() -> Customer {
        let now = Utc::now();
        Customer {
            id: CustomerId::new(3),
            email: Email::parse("a@x.com").unwrap(),
            password_hash: Some("$argon2id$v=19$secret-hash".to_string()),
            callback: Callback {
                id: CallbackId::new(5),
                customer_id: CustomerId::new(3),
                url: String::new(),
                created_at: now,
                updated_at: now,
            },
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_empty_callback_is_unconfigured() {
        let mut customer = sample();
        assert!(!customer.callback.is_configured());

        customer.callback.url = "  ".to_string();
        assert!(!customer.callback.is_configured());

        customer.callback.url = "not a url".to_string();
        assert!(customer.callback.is_configured());
    }

    #[test]
    fn test_profile_hides_password_hash() {
        let customer = sample();
        let json = serde_json::to_value(CustomerProfile::from(&customer)).unwrap();

        assert_eq!(json["id"], 3);
        assert_eq!(json["email"], "a@x.com");
        assert_eq!(json["callback_url"], "");
        assert!(json.get("password_hash").is_none());
        assert!(!json.to_string().contains("secret-hash"));
    }
}
