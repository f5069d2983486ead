//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `DATABASE_URL` - `PostgreSQL` connection string
//! - `SHOPIFY_STORE` - Shopify store domain (e.g., your-store.myshopify.com)
//! - `SHOPIFY_ADMIN_ACCESS_TOKEN` - Custom-app Admin API access token
//!
//! ## Optional
//! - `HOST` - Bind address (default: 127.0.0.1)
//! - `PORT` - Listen port (default: 8080)
//! - `SHOPIFY_API_VERSION` - API version (default: 2024-07)
//! - `SHOPIFY_PAGE_SIZE` - Feed page size, 1-250 (default: 250)
//! - `SYNC_WORKERS` - Concurrent customer merges, 1-64 (default: 8)
//! - `SYNC_INTERVAL_HOURS` - Scheduled pass cadence (default: 24)
//! - `SYNC_SCHEDULE` - Enable the scheduled pass (default: true)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::net::{IpAddr, SocketAddr};

use secrecy::SecretString;
use thiserror::Error;

/// Shopify Admin API page size ceiling.
const MAX_PAGE_SIZE: i64 = 250;

/// Upper bound on the merge worker pool.
const MAX_SYNC_WORKERS: usize = 64;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Server application configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Shopify Admin API configuration
    pub shopify: ShopifyConfig,
    /// Reconciliation tuning
    pub sync: SyncConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "production")
    pub sentry_environment: Option<String>,
}

/// Shopify Admin API configuration.
///
/// Implements `Debug` manually to redact the access token.
#[derive(Clone)]
pub struct ShopifyConfig {
    /// Shopify store domain (e.g., your-store.myshopify.com)
    pub store: String,
    /// Shopify API version (e.g., 2024-07)
    pub api_version: String,
    /// Custom-app admin access token (full customer read/write access)
    pub access_token: SecretString,
    /// Customers per feed page (1-250)
    pub page_size: i64,
}

impl std::fmt::Debug for ShopifyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShopifyConfig")
            .field("store", &self.store)
            .field("api_version", &self.api_version)
            .field("access_token", &"[REDACTED]")
            .field("page_size", &self.page_size)
            .finish()
    }
}

/// Reconciliation tuning.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// How many customers merge concurrently (1-64)
    pub worker_count: usize,
    /// Hours between scheduled passes
    pub interval_hours: u64,
    /// Whether the scheduled pass runs at all
    pub schedule_enabled: bool,
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let database_url = get_required_secret("DATABASE_URL")?;
        let host = get_env_or_default("HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("PORT", "8080")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("PORT".to_string(), e.to_string()))?;

        let shopify = ShopifyConfig::from_env()?;
        let sync = SyncConfig::from_env()?;
        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");

        Ok(Self {
            database_url,
            host,
            port,
            shopify,
            sync,
            sentry_dsn,
            sentry_environment,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl ShopifyConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let page_size = get_env_or_default("SHOPIFY_PAGE_SIZE", "250")
            .parse::<i64>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("SHOPIFY_PAGE_SIZE".to_string(), e.to_string())
            })?;
        validate_page_size(page_size)?;

        Ok(Self {
            store: get_required_env("SHOPIFY_STORE")?,
            api_version: get_env_or_default("SHOPIFY_API_VERSION", "2024-07"),
            access_token: get_required_secret("SHOPIFY_ADMIN_ACCESS_TOKEN")?,
            page_size,
        })
    }
}

impl SyncConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let worker_count = get_env_or_default("SYNC_WORKERS", "8")
            .parse::<usize>()
            .map_err(|e| ConfigError::InvalidEnvVar("SYNC_WORKERS".to_string(), e.to_string()))?;
        validate_worker_count(worker_count)?;

        let interval_hours = get_env_or_default("SYNC_INTERVAL_HOURS", "24")
            .parse::<u64>()
            .map_err(|e| {
                ConfigError::InvalidEnvVar("SYNC_INTERVAL_HOURS".to_string(), e.to_string())
            })?;
        if interval_hours == 0 {
            return Err(ConfigError::InvalidEnvVar(
                "SYNC_INTERVAL_HOURS".to_string(),
                "must be at least 1".to_string(),
            ));
        }

        let schedule_enabled = get_env_or_default("SYNC_SCHEDULE", "true")
            .parse::<bool>()
            .map_err(|e| ConfigError::InvalidEnvVar("SYNC_SCHEDULE".to_string(), e.to_string()))?;

        Ok(Self {
            worker_count,
            interval_hours,
            schedule_enabled,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get a required environment variable as a secret.
fn get_required_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    Ok(SecretString::from(value))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Page size must fit what the Admin API will serve.
fn validate_page_size(page_size: i64) -> Result<(), ConfigError> {
    if !(1..=MAX_PAGE_SIZE).contains(&page_size) {
        return Err(ConfigError::InvalidEnvVar(
            "SHOPIFY_PAGE_SIZE".to_string(),
            format!("must be between 1 and {MAX_PAGE_SIZE} (got {page_size})"),
        ));
    }
    Ok(())
}

/// The merge pool is bounded; unbounded fan-out is not an option.
fn validate_worker_count(worker_count: usize) -> Result<(), ConfigError> {
    if !(1..=MAX_SYNC_WORKERS).contains(&worker_count) {
        return Err(ConfigError::InvalidEnvVar(
            "SYNC_WORKERS".to_string(),
            format!("must be between 1 and {MAX_SYNC_WORKERS} (got {worker_count})"),
        ));
    }
    Ok(())
}
