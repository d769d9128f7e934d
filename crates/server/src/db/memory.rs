//! In-memory customer store.
//!
//! Holds every aggregate behind a single lock, so concurrent writes are
//! serialized and the email index can never disagree with the rows.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use callback_notifier_core::{CallbackId, CustomerId, Email};

use super::{CustomerStore, RepositoryError};
use crate::models::{Callback, Customer, NewCustomer};

#[derive(Default)]
struct Tables {
    customers: HashMap<CustomerId, Customer>,
    by_email: HashMap<Email, CustomerId>,
    last_id: i64,
}

impl Tables {
    const fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }

    fn email_taken_by_other(&self, email: &Email, id: Option<CustomerId>) -> bool {
        self.by_email
            .get(email)
            .is_some_and(|owner| Some(*owner) != id)
    }
}

/// Customer store kept in process memory.
///
/// IDs start at 1 and increase monotonically. Customer and callback rows
/// share the sequence value, mirroring a fresh database.
#[derive(Default)]
pub struct MemoryCustomerStore {
    tables: RwLock<Tables>,
}

impl MemoryCustomerStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored customers.
    pub async fn len(&self) -> usize {
        self.tables.read().await.customers.len()
    }

    /// Whether the store holds no customers.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl CustomerStore for MemoryCustomerStore {
    async fn insert(&self, customer: NewCustomer) -> Result<Customer, RepositoryError> {
        let mut tables = self.tables.write().await;
        if tables.email_taken_by_other(&customer.email, None) {
            return Err(RepositoryError::Conflict("email already exists".to_owned()));
        }

        let raw_id = tables.next_id();
        let id = CustomerId::new(raw_id);
        let now = Utc::now();
        let stored = Customer {
            id,
            email: customer.email,
            password_hash: customer.password_hash,
            callback: Callback {
                id: CallbackId::new(raw_id),
                customer_id: id,
                url: String::new(),
                created_at: now,
                updated_at: now,
            },
            created_at: now,
            updated_at: now,
        };

        tables.by_email.insert(stored.email.clone(), id);
        tables.customers.insert(id, stored.clone());
        Ok(stored)
    }

    async fn save(&self, customer: &Customer) -> Result<Customer, RepositoryError> {
        let mut tables = self.tables.write().await;
        if !tables.customers.contains_key(&customer.id) {
            return Err(RepositoryError::NotFound);
        }
        if tables.email_taken_by_other(&customer.email, Some(customer.id)) {
            return Err(RepositoryError::Conflict("email already exists".to_owned()));
        }

        let now = Utc::now();
        let Some(existing) = tables.customers.get_mut(&customer.id) else {
            return Err(RepositoryError::NotFound);
        };

        let previous_email = existing.email.clone();
        existing.email = customer.email.clone();
        existing.password_hash.clone_from(&customer.password_hash);
        existing.updated_at = now;
        // Callback identity and owner stay as stored.
        existing.callback.url.clone_from(&customer.callback.url);
        existing.callback.updated_at = now;
        let stored = existing.clone();

        if previous_email != stored.email {
            tables.by_email.remove(&previous_email);
            tables.by_email.insert(stored.email.clone(), stored.id);
        }
        Ok(stored)
    }

    async fn find_by_id(&self, id: CustomerId) -> Result<Option<Customer>, RepositoryError> {
        Ok(self.tables.read().await.customers.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &Email) -> Result<Option<Customer>, RepositoryError> {
        let tables = self.tables.read().await;
        Ok(tables
            .by_email
            .get(email)
            .and_then(|id| tables.customers.get(id))
            .cloned())
    }
}
