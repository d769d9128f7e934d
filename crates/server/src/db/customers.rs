//! `PostgreSQL` customer store.
//!
//! Uses runtime queries (`query_as`) to avoid SQLx offline mode cache
//! requirements. Every read joins the callback row so callers always get the
//! full aggregate.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::instrument;

use callback_notifier_core::{CallbackId, CustomerId, Email};

use super::{CustomerStore, RepositoryError};
use crate::models::{Callback, Customer, NewCustomer};

const SELECT_AGGREGATE: &str = r"
    SELECT c.id, c.email, c.password_hash, c.created_at, c.updated_at,
           cb.id AS callback_id, cb.callback_url,
           cb.created_at AS callback_created_at, cb.updated_at AS callback_updated_at
    FROM notifier.customer c
    JOIN notifier.callback cb ON cb.customer_id = c.id
";

#[derive(sqlx::FromRow)]
struct CustomerRow {
    id: CustomerId,
    email: String,
    password_hash: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct CallbackRow {
    id: CallbackId,
    callback_url: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct AggregateRow {
    id: CustomerId,
    email: String,
    password_hash: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    callback_id: CallbackId,
    callback_url: String,
    callback_created_at: DateTime<Utc>,
    callback_updated_at: DateTime<Utc>,
}

impl AggregateRow {
    fn into_customer(self) -> Result<Customer, RepositoryError> {
        assemble(
            CustomerRow {
                id: self.id,
                email: self.email,
                password_hash: self.password_hash,
                created_at: self.created_at,
                updated_at: self.updated_at,
            },
            CallbackRow {
                id: self.callback_id,
                callback_url: self.callback_url,
                created_at: self.callback_created_at,
                updated_at: self.callback_updated_at,
            },
        )
    }
}

fn assemble(customer: CustomerRow, callback: CallbackRow) -> Result<Customer, RepositoryError> {
    let email = Email::parse(&customer.email).map_err(|e| {
        RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
    })?;

    Ok(Customer {
        id: customer.id,
        email,
        password_hash: customer.password_hash,
        callback: Callback {
            id: callback.id,
            customer_id: customer.id,
            url: callback.callback_url,
            created_at: callback.created_at,
            updated_at: callback.updated_at,
        },
        created_at: customer.created_at,
        updated_at: customer.updated_at,
    })
}

/// Map a unique violation on the email index to `Conflict`.
fn map_email_conflict(e: sqlx::Error) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict("email already exists".to_owned());
    }
    RepositoryError::Database(e)
}

/// Customer store backed by `PostgreSQL`.
#[derive(Clone)]
pub struct PgCustomerStore {
    pool: PgPool,
}

impl PgCustomerStore {
    /// Create a store over an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CustomerStore for PgCustomerStore {
    #[instrument(skip(self, customer), fields(email = %customer.email))]
    async fn insert(&self, customer: NewCustomer) -> Result<Customer, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, CustomerRow>(
            r"
            INSERT INTO notifier.customer (email, password_hash)
            VALUES ($1, $2)
            RETURNING id, email, password_hash, created_at, updated_at
            ",
        )
        .bind(customer.email.as_str())
        .bind(customer.password_hash.as_deref())
        .fetch_one(&mut *tx)
        .await
        .map_err(map_email_conflict)?;

        let callback = sqlx::query_as::<_, CallbackRow>(
            r"
            INSERT INTO notifier.callback (customer_id, callback_url)
            VALUES ($1, '')
            RETURNING id, callback_url, created_at, updated_at
            ",
        )
        .bind(row.id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        assemble(row, callback)
    }

    #[instrument(skip(self, customer), fields(customer_id = %customer.id))]
    async fn save(&self, customer: &Customer) -> Result<Customer, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, CustomerRow>(
            r"
            UPDATE notifier.customer
            SET email = $2, password_hash = $3, updated_at = now()
            WHERE id = $1
            RETURNING id, email, password_hash, created_at, updated_at
            ",
        )
        .bind(customer.id)
        .bind(customer.email.as_str())
        .bind(customer.password_hash.as_deref())
        .fetch_optional(&mut *tx)
        .await
        .map_err(map_email_conflict)?
        .ok_or(RepositoryError::NotFound)?;

        // Keyed on customer_id: the owner reference itself is never written.
        let callback = sqlx::query_as::<_, CallbackRow>(
            r"
            UPDATE notifier.callback
            SET callback_url = $2, updated_at = now()
            WHERE customer_id = $1
            RETURNING id, callback_url, created_at, updated_at
            ",
        )
        .bind(customer.id)
        .bind(&customer.callback.url)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| {
            RepositoryError::DataCorruption(format!("customer {} has no callback row", customer.id))
        })?;

        tx.commit().await?;

        assemble(row, callback)
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: CustomerId) -> Result<Option<Customer>, RepositoryError> {
        let query = format!("{SELECT_AGGREGATE} WHERE c.id = $1");
        sqlx::query_as::<_, AggregateRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(AggregateRow::into_customer)
            .transpose()
    }

    #[instrument(skip(self), fields(email = %email))]
    async fn find_by_email(&self, email: &Email) -> Result<Option<Customer>, RepositoryError> {
        let query = format!("{SELECT_AGGREGATE} WHERE c.email = $1");
        sqlx::query_as::<_, AggregateRow>(&query)
            .bind(email.as_str())
            .fetch_optional(&self.pool)
            .await?
            .map(AggregateRow::into_customer)
            .transpose()
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
