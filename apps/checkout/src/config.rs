//! Checkout configuration module.
//!
//! Configuration is loaded from environment variables with fallback to defaults.

use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Checkout configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutConfig {
    /// SQLite database file. `None` runs against an in-memory database.
    pub database_path: Option<PathBuf>,

    /// Pool size for file-backed databases
    pub max_connections: u32,

    /// Attempts per order transaction before `Conflict` reaches the caller
    pub max_attempts: u32,

    /// Backoff step between attempts; attempt n waits n × this
    pub retry_backoff_ms: u64,

    /// Sender address on outgoing emails
    pub mail_from: String,

    /// Sender display name on outgoing emails
    pub sender_name: String,

    /// Label printed after amounts in emails
    pub currency_label: String,
}

impl Default for CheckoutConfig {
    fn default() -> Self {
        CheckoutConfig {
            database_path: None,
            max_connections: 5,
            max_attempts: 3,
            retry_backoff_ms: 25,
            mail_from: "orders@platter.local".to_string(),
            sender_name: "Platter".to_string(),
            currency_label: "VND".to_string(),
        }
    }
}

impl CheckoutConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable                   | Default                |
    /// |----------------------------|------------------------|
    /// | `PLATTER_DATABASE_PATH`    | in-memory              |
    /// | `PLATTER_MAX_CONNECTIONS`  | 5                      |
    /// | `PLATTER_MAX_ATTEMPTS`     | 3                      |
    /// | `PLATTER_RETRY_BACKOFF_MS` | 25                     |
    /// | `PLATTER_MAIL_FROM`        | `orders@platter.local` |
    /// | `PLATTER_SENDER_NAME`      | `Platter`              |
    /// | `PLATTER_CURRENCY_LABEL`   | `VND`                  |
    pub fn load() -> Result<Self, ConfigError> {
        let defaults = CheckoutConfig::default();

        let config = CheckoutConfig {
            database_path: env::var("PLATTER_DATABASE_PATH")
                .ok()
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from),

            max_connections: parse_or("PLATTER_MAX_CONNECTIONS", defaults.max_connections)?,

            max_attempts: parse_or("PLATTER_MAX_ATTEMPTS", defaults.max_attempts)?,

            retry_backoff_ms: parse_or("PLATTER_RETRY_BACKOFF_MS", defaults.retry_backoff_ms)?,

            mail_from: env::var("PLATTER_MAIL_FROM").unwrap_or(defaults.mail_from),

            sender_name: env::var("PLATTER_SENDER_NAME").unwrap_or(defaults.sender_name),

            currency_label: env::var("PLATTER_CURRENCY_LABEL").unwrap_or(defaults.currency_label),
        };

        config.validate()?;
        Ok(config)
    }

    /// Checks values that parse but make no sense.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_attempts == 0 {
            return Err(ConfigError::InvalidValue("PLATTER_MAX_ATTEMPTS".to_string()));
        }
        if self.max_connections == 0 {
            return Err(ConfigError::InvalidValue("PLATTER_MAX_CONNECTIONS".to_string()));
        }
        if !self.mail_from.contains('@') {
            return Err(ConfigError::InvalidValue("PLATTER_MAIL_FROM".to_string()));
        }
        Ok(())
    }

    /// Wait before attempt `attempt + 1`, after `attempt` failures.
    pub fn backoff(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.retry_backoff_ms.saturating_mul(attempt as u64))
    }
}

fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key.to_string())),
        Err(_) => Ok(default),
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {0}")]
    InvalidValue(String),
}
