//! Customer persistence.
//!
//! # Backends
//!
//! [`CustomerStore`] is the seam every flow depends on. Two implementations
//! exist, chosen at startup from [`StorageBackend`](crate::config::StorageBackend):
//!
//! - [`PgCustomerStore`] - `PostgreSQL` via sqlx (schema `notifier`)
//! - [`MemoryCustomerStore`] - process-local maps, used by tests and local runs
//!
//! # Tables
//!
//! - `notifier.customer` - identity key, password hash, timestamps
//! - `notifier.callback` - one row per customer, the callback URL
//! - `tower_sessions.session` - created by `PostgresStore::migrate`
//!
//! # Migrations
//!
//! Migrations are stored in `crates/server/migrations/` and run via:
//! ```bash
//! cargo run -p callback-notifier-cli -- migrate
//! ```

pub mod customers;
pub mod memory;

use std::time::Duration;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use callback_notifier_core::{CustomerId, Email};

use crate::models::{Customer, NewCustomer};

pub use customers::PgCustomerStore;
pub use memory::MemoryCustomerStore;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique email).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Storage for customer aggregates.
///
/// Implementations persist a customer and its callback as one unit: a call
/// either writes both or neither.
#[async_trait]
pub trait CustomerStore: Send + Sync {
    /// Persist a new customer with an empty callback and assign its ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email is already registered.
    async fn insert(&self, customer: NewCustomer) -> Result<Customer, RepositoryError>;

    /// Write the full aggregate of an existing customer, callback included.
    ///
    /// The callback's owner is never rewritten. Returns the stored state,
    /// with refreshed `updated_at` timestamps.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the customer does not exist and
    /// `RepositoryError::Conflict` if the email belongs to another customer.
    async fn save(&self, customer: &Customer) -> Result<Customer, RepositoryError>;

    /// Look up a customer by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the backend fails.
    async fn find_by_id(&self, id: CustomerId) -> Result<Option<Customer>, RepositoryError>;

    /// Look up a customer by identity key.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the backend fails.
    async fn find_by_email(&self, email: &Email) -> Result<Option<Customer>, RepositoryError>;

    /// Check that the backend is reachable.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the backend cannot be reached.
    async fn ping(&self) -> Result<(), RepositoryError> {
        Ok(())
    }
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}
