//! Database migration command.
//!
//! Applies the customer/callback schema from `crates/server/migrations/`,
//! then creates the `tower_sessions.session` table used by the shared
//! session store.
//!
//! # Environment Variables
//!
//! - `NOTIFIER_DATABASE_URL` - `PostgreSQL` connection string
//! - `DATABASE_URL` - fallback when the above is unset

use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;
use tower_sessions_sqlx_store::PostgresStore;

/// Errors from the migrate command.
#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Pick the `--database-url` value, or fall back to `DATABASE_URL`.
///
/// # Errors
///
/// Returns `MigrationError::MissingEnvVar` when no URL is available.
pub fn resolve_database_url(explicit: Option<String>) -> Result<String, MigrationError> {
    explicit
        .filter(|url| !url.trim().is_empty())
        .or_else(|| std::env::var("DATABASE_URL").ok())
        .ok_or(MigrationError::MissingEnvVar("NOTIFIER_DATABASE_URL"))
}

/// Run all migrations against `database_url`.
///
/// # Errors
///
/// Returns an error if the connection or any migration fails.
pub async fn run(database_url: &SecretString, sessions: bool) -> Result<(), MigrationError> {
    tracing::info!("Connecting to database...");
    let pool = PgPool::connect(database_url.expose_secret()).await?;

    tracing::info!("Running customer migrations...");
    sqlx::migrate!("../server/migrations").run(&pool).await?;

    if sessions {
        tracing::info!("Running session store migration...");
        PostgresStore::new(pool.clone()).migrate().await?;
    }

    tracing::info!("Migrations complete!");
    Ok(())
}
