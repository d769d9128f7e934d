//! Callback registration.
//!
//! Changes the one field of the customer aggregate that is mutable after
//! registration: the callback URL. The URL is stored as given; an empty or
//! malformed value only shows up later as a failed delivery.

use thiserror::Error;
use tracing::info;

use callback_notifier_core::{CustomerId, Email};

use crate::db::{CustomerStore, RepositoryError};
use crate::models::Customer;

/// Errors that can occur while changing a callback URL.
#[derive(Debug, Error)]
pub enum CallbackError {
    /// The acting customer could not be resolved.
    #[error("customer not found")]
    CustomerNotFound,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Callback registration service.
pub struct CallbackService<'a> {
    customers: &'a dyn CustomerStore,
}

impl<'a> CallbackService<'a> {
    /// Create a new callback service.
    #[must_use]
    pub const fn new(customers: &'a dyn CustomerStore) -> Self {
        Self { customers }
    }

    /// Set the callback URL of the customer with this identity key.
    ///
    /// Used by session-gated deployments, where the key comes from the session.
    ///
    /// # Errors
    ///
    /// Returns `CallbackError::CustomerNotFound` if no customer has this email.
    /// Returns `CallbackError::Repository` if the store fails.
    pub async fn set_url_for_email(
        &self,
        email: &Email,
        url: &str,
    ) -> Result<Customer, CallbackError> {
        let customer = self
            .customers
            .find_by_email(email)
            .await?
            .ok_or(CallbackError::CustomerNotFound)?;
        self.apply(customer, url).await
    }

    /// Set the callback URL of the customer with this ID.
    ///
    /// Used by deployments that trust an explicit `customer_id`.
    ///
    /// # Errors
    ///
    /// Returns `CallbackError::CustomerNotFound` if the ID is unknown.
    /// Returns `CallbackError::Repository` if the store fails.
    pub async fn set_url_for_id(
        &self,
        id: CustomerId,
        url: &str,
    ) -> Result<Customer, CallbackError> {
        let customer = self
            .customers
            .find_by_id(id)
            .await?
            .ok_or(CallbackError::CustomerNotFound)?;
        self.apply(customer, url).await
    }

    async fn apply(&self, mut customer: Customer, url: &str) -> Result<Customer, CallbackError> {
        url.clone_into(&mut customer.callback.url);

        let saved = self.customers.save(&customer).await.map_err(|e| match e {
            RepositoryError::NotFound => CallbackError::CustomerNotFound,
            other => CallbackError::Repository(other),
        })?;

        info!(customer_id = %saved.id, configured = saved.callback.is_configured(), "Callback URL updated");
        Ok(saved)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::MemoryCustomerStore;
    use crate::models::NewCustomer;

    async fn seeded() -> (MemoryCustomerStore, Customer) {
        let store = MemoryCustomerStore::new();
        let customer = store
            .insert(NewCustomer::new(Email::parse("a@x.com").unwrap(), None))
            .await
            .unwrap();
        (store, customer)
    }

    #[tokio::test]
    async fn test_set_by_email_is_visible_on_lookup() {
        let (store, customer) = seeded().await;
        CallbackService::new(&store)
            .set_url_for_email(&customer.email, "http://www.example.com")
            .await
            .unwrap();

        let found = store.find_by_email(&customer.email).await.unwrap().unwrap();
        assert_eq!(found.callback.url, "http://www.example.com");
        assert_eq!(found.callback.id, customer.callback.id);
        assert_eq!(found.password_hash, customer.password_hash);
    }

    #[tokio::test]
    async fn test_set_by_id() {
        let (store, customer) = seeded().await;
        let saved = CallbackService::new(&store)
            .set_url_for_id(customer.id, "http://hooks.test")
            .await
            .unwrap();
        assert_eq!(saved.callback.url, "http://hooks.test");
    }

    #[tokio::test]
    async fn test_empty_and_malformed_urls_are_accepted() {
        let (store, customer) = seeded().await;
        let service = CallbackService::new(&store);

        let saved = service.set_url_for_id(customer.id, "::not a url::").await.unwrap();
        assert_eq!(saved.callback.url, "::not a url::");

        let saved = service.set_url_for_id(customer.id, "").await.unwrap();
        assert!(!saved.callback.is_configured());
    }

    #[tokio::test]
    async fn test_unknown_customer() {
        let (store, _) = seeded().await;
        let service = CallbackService::new(&store);

        assert!(matches!(
            service.set_url_for_id(CustomerId::new(77), "http://x").await,
            Err(CallbackError::CustomerNotFound)
        ));
        assert!(matches!(
            service
                .set_url_for_email(&Email::parse("z@x.com").unwrap(), "http://x")
                .await,
            Err(CallbackError::CustomerNotFound)
        ));
    }
}
