//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `NOTIFIER_DATABASE_URL` - `PostgreSQL` connection string (falls back to
//!   `DATABASE_URL`; only required with the `postgres` backend)
//!
//! ## Optional
//! - `NOTIFIER_BACKEND` - `postgres` (default) or `memory`
//! - `NOTIFIER_HOST` - Bind address (default: 127.0.0.1)
//! - `NOTIFIER_PORT` - Listen port (falls back to `PORT`, default: 4040)
//! - `NOTIFIER_BASE_URL` - Public URL; `https://` enables secure cookies
//! - `NOTIFIER_CALLBACK_AUTH` - `session` (default) or `customer_id`
//! - `NOTIFIER_REQUIRE_PASSWORD` - Whether registration needs a password
//!   (default: `true` in session mode, `false` in customer-id mode)
//! - `NOTIFIER_DELIVERY_TIMEOUT_SECS` - Outbound webhook timeout (default: 30)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;

const DEFAULT_PORT: &str = "4040";
const DEFAULT_DELIVERY_TIMEOUT_SECS: u64 = 30;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Inconsistent configuration: {0}")]
    Inconsistent(String),
}

/// Which storage backs customers and sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageBackend {
    /// `PostgreSQL` for customers, `tower-sessions-sqlx-store` for sessions.
    Postgres,
    /// Process-local maps. Nothing survives a restart.
    Memory,
}

impl FromStr for StorageBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(Self::Postgres),
            "memory" => Ok(Self::Memory),
            other => Err(format!("expected `postgres` or `memory`, got `{other}`")),
        }
    }
}

/// How `POST /callback_url` decides which customer it is changing.
///
/// A deployment uses exactly one mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackAuthMode {
    /// The customer bound to the caller's session.
    Session,
    /// The `customer_id` carried in the request body. No session involved.
    CustomerId,
}

impl FromStr for CallbackAuthMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "session" => Ok(Self::Session),
            "customer_id" | "customer-id" => Ok(Self::CustomerId),
            other => Err(format!("expected `session` or `customer_id`, got `{other}`")),
        }
    }
}

/// Outbound delivery settings.
#[derive(Debug, Clone)]
pub struct NotifierConfig {
    /// Upper bound on a single webhook request.
    pub delivery_timeout: Duration,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            delivery_timeout: Duration::from_secs(DEFAULT_DELIVERY_TIMEOUT_SECS),
        }
    }
}

/// Application configuration.
///
/// `Debug` is safe to log: the database URL is a `SecretString`.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Customer and session storage.
    pub backend: StorageBackend,
    /// `PostgreSQL` connection URL (contains password). `None` for the memory backend.
    pub database_url: Option<SecretString>,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public base URL
    pub base_url: String,
    /// Callback registration variant
    pub callback_auth: CallbackAuthMode,
    /// Whether `/register` requires a password
    pub require_password: bool,
    /// Outbound delivery settings
    pub notifier: NotifierConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid,
    /// or if the combination of settings cannot work.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let backend: StorageBackend = parse_env("NOTIFIER_BACKEND", "postgres")?;
        let database_url = match backend {
            StorageBackend::Postgres => Some(get_database_url("NOTIFIER_DATABASE_URL")?),
            StorageBackend::Memory => None,
        };
        let host: IpAddr = parse_env("NOTIFIER_HOST", "127.0.0.1")?;
        let port: u16 = match get_optional_env("NOTIFIER_PORT") {
            Some(value) => parse_value("NOTIFIER_PORT", &value)?,
            None => parse_env("PORT", DEFAULT_PORT)?,
        };
        let base_url = get_env_or_default("NOTIFIER_BASE_URL", &format!("http://localhost:{port}"));
        let callback_auth: CallbackAuthMode = parse_env("NOTIFIER_CALLBACK_AUTH", "session")?;
        let require_password = match get_optional_env("NOTIFIER_REQUIRE_PASSWORD") {
            Some(value) => parse_bool("NOTIFIER_REQUIRE_PASSWORD", &value)?,
            None => callback_auth == CallbackAuthMode::Session,
        };
        let delivery_secs: u64 = parse_env(
            "NOTIFIER_DELIVERY_TIMEOUT_SECS",
            &DEFAULT_DELIVERY_TIMEOUT_SECS.to_string(),
        )?;

        let config = Self {
            backend,
            database_url,
            host,
            port,
            base_url,
            callback_auth,
            require_password,
            notifier: NotifierConfig {
                delivery_timeout: Duration::from_secs(delivery_secs),
            },
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        };
        config.validate()?;
        Ok(config)
    }

    /// Configuration for an in-process server on the memory backend.
    ///
    /// Used by tests and local experiments; binds to an ephemeral port.
    #[must_use]
    pub fn in_memory(callback_auth: CallbackAuthMode) -> Self {
        Self {
            backend: StorageBackend::Memory,
            database_url: None,
            host: IpAddr::from([127, 0, 0, 1]),
            port: 0,
            base_url: "http://localhost".to_string(),
            callback_auth,
            require_password: callback_auth == CallbackAuthMode::Session,
            notifier: NotifierConfig::default(),
            sentry_dsn: None,
            sentry_environment: None,
        }
    }

    /// Reject settings that would make the service unusable.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Inconsistent` when session-gated callback
    /// registration is combined with password-less registration, since such
    /// customers could never log in.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.callback_auth == CallbackAuthMode::Session && !self.require_password {
            return Err(ConfigError::Inconsistent(
                "NOTIFIER_CALLBACK_AUTH=session requires NOTIFIER_REQUIRE_PASSWORD=true".to_string(),
            ));
        }
        if self.notifier.delivery_timeout.is_zero() {
            return Err(ConfigError::InvalidEnvVar(
                "NOTIFIER_DELIVERY_TIMEOUT_SECS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    /// Whether session cookies must carry the `Secure` attribute.
    #[must_use]
    pub fn secure_cookies(&self) -> bool {
        self.base_url.starts_with("https://")
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get database URL with fallback to generic `DATABASE_URL`.
fn get_database_url(primary_key: &str) -> Result<SecretString, ConfigError> {
    if let Ok(value) = std::env::var(primary_key) {
        return Ok(SecretString::from(value));
    }
    if let Ok(value) = std::env::var("DATABASE_URL") {
        return Ok(SecretString::from(value));
    }
    Err(ConfigError::MissingEnvVar(primary_key.to_string()))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    get_optional_env(key).unwrap_or_else(|| default.to_string())
}

/// Parse an environment variable, falling back to `default` when unset.
fn parse_env<T>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    parse_value(key, &get_env_or_default(key, default))
}

fn parse_value<T>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            format!("expected a boolean, got `{other}`"),
        )),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::ExposeSecret;

    use super::*;

    #[test]
    fn test_backend_parsing() {
        assert_eq!("postgres".parse(), Ok(StorageBackend::Postgres));
        assert_eq!(" Memory ".parse(), Ok(StorageBackend::Memory));
        assert!("redis".parse::<StorageBackend>().is_err());
    }

    #[test]
    fn test_callback_auth_parsing() {
        assert_eq!("session".parse(), Ok(CallbackAuthMode::Session));
        assert_eq!("customer_id".parse(), Ok(CallbackAuthMode::CustomerId));
        assert_eq!("customer-id".parse(), Ok(CallbackAuthMode::CustomerId));
        assert!("both".parse::<CallbackAuthMode>().is_err());
    }

    #[test]
    fn test_parse_bool() {
        assert!(parse_bool("X", "TRUE").unwrap());
        assert!(!parse_bool("X", "0").unwrap());
        assert!(matches!(
            parse_bool("X", "maybe"),
            Err(ConfigError::InvalidEnvVar(_, _))
        ));
    }

    #[test]
    fn test_parse_value_reports_key() {
        let err = parse_value::<u16>("NOTIFIER_PORT", "eighty").unwrap_err();
        assert!(err.to_string().contains("NOTIFIER_PORT"));
    }

    #[test]
    fn test_session_mode_requires_password() {
        let mut config = ServerConfig::in_memory(CallbackAuthMode::Session);
        assert!(config.validate().is_ok());

        config.require_password = false;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Inconsistent(_))
        ));
    }

    #[test]
    fn test_customer_id_mode_allows_passwordless() {
        let config = ServerConfig::in_memory(CallbackAuthMode::CustomerId);
        assert!(!config.require_password);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut config = ServerConfig::in_memory(CallbackAuthMode::Session);
        config.notifier.delivery_timeout = Duration::ZERO;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_secure_cookies_follow_base_url() {
        let mut config = ServerConfig::in_memory(CallbackAuthMode::Session);
        assert!(!config.secure_cookies());
        config.base_url = "https://notify.example.com".to_string();
        assert!(config.secure_cookies());
    }

    #[test]
    fn test_debug_redacts_database_url() {
        let mut config = ServerConfig::in_memory(CallbackAuthMode::Session);
        config.database_url = Some(SecretString::from("postgres://user:hunter2@db/notifier"));

        let debug_output = format!("{config:?}");
        assert!(!debug_output.contains("hunter2"));
        assert_eq!(
            config.database_url.as_ref().unwrap().expose_secret(),
            "postgres://user:hunter2@db/notifier"
        );
    }

    #[test]
    fn test_socket_addr() {
        let mut config = ServerConfig::in_memory(CallbackAuthMode::Session);
        config.port = 4040;
        let addr = config.socket_addr();
        assert_eq!(addr.ip().to_string(), "127.0.0.1");
        assert_eq!(addr.port(), 4040);
    }
}
