//! Authentication service.
//!
//! Registration and password login for customers. Binding the logged-in
//! identity to a session is the route's job; see
//! [`set_current_customer`](crate::middleware::set_current_customer).

mod error;
pub mod password;

pub use error::AuthError;

use tracing::{debug, info};

use callback_notifier_core::Email;

use crate::db::{CustomerStore, RepositoryError};
use crate::models::{Customer, NewCustomer};

use password::{hash_password, verify_password};

/// Authentication service.
pub struct AuthService<'a> {
    customers: &'a dyn CustomerStore,
    require_password: bool,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    ///
    /// With `require_password` off, customers may register without a
    /// password; such customers can never log in.
    #[must_use]
    pub const fn new(customers: &'a dyn CustomerStore, require_password: bool) -> Self {
        Self {
            customers,
            require_password,
        }
    }

    /// Register a new customer with an empty callback.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::MissingPassword` if a required password is absent.
    /// Returns `AuthError::PasswordHash` if hashing fails.
    /// Returns `AuthError::CustomerAlreadyExists` if the email is already registered.
    pub async fn register(
        &self,
        email: &str,
        password: Option<&str>,
    ) -> Result<Customer, AuthError> {
        let email = Email::parse(email)?;

        let password_hash = match password {
            Some(password) => Some(hash_password(password)?),
            None if self.require_password => return Err(AuthError::MissingPassword),
            None => None,
        };

        let customer = self
            .customers
            .insert(NewCustomer::new(email, password_hash))
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::CustomerAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        info!(customer_id = %customer.id, "Customer registered");
        Ok(customer)
    }

    /// Login with email and password.
    ///
    /// Unknown email, missing stored hash and wrong password all produce the
    /// same error, so callers cannot tell which emails are registered.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong.
    pub async fn login(&self, email: &str, password: &str) -> Result<Customer, AuthError> {
        let Ok(email) = Email::parse(email) else {
            return Err(AuthError::InvalidCredentials);
        };

        let customer = self
            .customers
            .find_by_email(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let Some(hash) = customer.password_hash.as_deref() else {
            debug!(customer_id = %customer.id, "Login attempt for customer without password");
            return Err(AuthError::InvalidCredentials);
        };
        verify_password(password, hash)?;

        Ok(customer)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::MemoryCustomerStore;

    #[tokio::test]
    async fn test_register_hashes_password() {
        let store = MemoryCustomerStore::new();
        let auth = AuthService::new(&store, true);

        let customer = auth.register("a@x.com", Some("pw")).await.unwrap();
        let hash = customer.password_hash.unwrap();
        assert_ne!(hash, "pw");
        assert!(verify_password("pw", &hash).is_ok());
    }

    #[tokio::test]
    async fn test_register_twice_fails() {
        let store = MemoryCustomerStore::new();
        let auth = AuthService::new(&store, true);

        let first = auth.register("a@x.com", Some("pw")).await.unwrap();
        let err = auth.register("a@x.com", Some("other")).await.unwrap_err();
        assert!(matches!(err, AuthError::CustomerAlreadyExists));

        let stored = store.find_by_id(first.id).await.unwrap().unwrap();
        assert_eq!(stored, first);
    }

    #[tokio::test]
    async fn test_register_requires_password_when_configured() {
        let store = MemoryCustomerStore::new();

        let err = AuthService::new(&store, true)
            .register("a@x.com", None)
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::MissingPassword));

        let customer = AuthService::new(&store, false)
            .register("a@x.com", None)
            .await
            .unwrap();
        assert!(customer.password_hash.is_none());
    }

    #[tokio::test]
    async fn test_register_rejects_invalid_email() {
        let store = MemoryCustomerStore::new();
        let err = AuthService::new(&store, true)
            .register("nope", Some("pw"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidEmail(_)));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_login_success() {
        let store = MemoryCustomerStore::new();
        let auth = AuthService::new(&store, true);
        let registered = auth.register("a@x.com", Some("pw")).await.unwrap();

        let customer = auth.login("a@x.com", "pw").await.unwrap();
        assert_eq!(customer.id, registered.id);
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinguishable() {
        let store = MemoryCustomerStore::new();
        let auth = AuthService::new(&store, true);
        auth.register("a@x.com", Some("pw")).await.unwrap();

        let wrong_password = auth.login("a@x.com", "wrong").await.unwrap_err();
        let unknown_email = auth.login("b@x.com", "pw").await.unwrap_err();
        let malformed_email = auth.login("b", "pw").await.unwrap_err();

        assert!(matches!(wrong_password, AuthError::InvalidCredentials));
        assert!(matches!(unknown_email, AuthError::InvalidCredentials));
        assert!(matches!(malformed_email, AuthError::InvalidCredentials));
        assert_eq!(wrong_password.to_string(), unknown_email.to_string());
    }

    #[tokio::test]
    async fn test_login_without_stored_password_fails() {
        let store = MemoryCustomerStore::new();
        AuthService::new(&store, false)
            .register("a@x.com", None)
            .await
            .unwrap();

        let err = AuthService::new(&store, false)
            .login("a@x.com", "")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }
}
