//! # Platter Checkout
//!
//! Order orchestration for the Platter restaurant platform.
//!
//! ## Module Organization
//! ```text
//! checkout/
//! ├── lib.rs            ◄─── You are here (exports, tracing setup)
//! ├── config.rs         ◄─── CheckoutConfig from PLATTER_* variables
//! ├── error.rs          ◄─── ApiError returned to callers
//! ├── notify.rs         ◄─── Notifier trait + email rendering
//! └── order_service.rs  ◄─── create / update status / read orders
//! ```
//!
//! ## Wiring
//! ```text
//! CheckoutConfig::load() ──► Database::new(DbConfig) ──► OrderService::new(db, notifier, config)
//! ```

pub mod config;
pub mod error;
pub mod notify;
pub mod order_service;

use tracing_subscriber::EnvFilter;

pub use config::{CheckoutConfig, ConfigError};
pub use error::{ApiError, ApiResult, ErrorCode};
pub use notify::{LogNotifier, Notifier, NotifyError, RecordingNotifier, SentEmail};
pub use order_service::{
    NotificationOutcome, OrderConfirmation, OrderPage, OrderService, StatusChange,
};

use platter_db::DbConfig;

/// Installs the global fmt subscriber. `RUST_LOG` overrides the default
/// filter.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,checkout=debug,platter_db=info,sqlx=warn"));

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Database settings for a checkout config: the configured file with its
/// pool size, or a private in-memory database.
pub fn db_config(config: &CheckoutConfig) -> DbConfig {
    match &config.database_path {
        Some(path) => DbConfig::new(path.clone()).max_connections(config.max_connections),
        None => DbConfig::in_memory(),
    }
}
