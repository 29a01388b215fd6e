//! # platter-db: Database Layer for Platter
//!
//! SQLite storage for the order fulfillment engine, through sqlx.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Platter Data Flow                                │
//! │                                                                         │
//! │  OrderService::create_order (apps/checkout)                             │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐    │
//! │  │                   platter-db (THIS CRATE)                       │    │
//! │  │                                                                 │    │
//! │  │   ┌──────────────┐  ┌────────────────┐  ┌──────────────────┐    │    │
//! │  │   │  Database    │  │ Repositories   │  │ InventoryLedger  │    │    │
//! │  │   │  (pool.rs)   │  │ customer       │  │ CouponRedemption │    │    │
//! │  │   │              │  │ catalog        │  │                  │    │    │
//! │  │   │ SqlitePool   │◄─│ warehouse      │◄─│ run inside one   │    │    │
//! │  │   │ begin()      │  │ coupon, order  │  │ transaction      │    │    │
//! │  │   └──────────────┘  └────────────────┘  └──────────────────┘    │    │
//! │  │                                                                 │    │
//! │  └─────────────────────────────────────────────────────────────────┘    │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite (WAL, foreign keys on, embedded migrations)                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`repository`] - Repository implementations
//! - [`ledger`] - Stock deduction inside a transaction
//! - [`redemption`] - Coupon redemption inside a transaction
//! - [`demo`] - Demo restaurant data for the seed binary and demo runs
//!
//! ## Usage
//!
//! ```rust,ignore
//! use platter_db::{Database, DbConfig, InventoryLedger};
//!
//! let db = Database::new(DbConfig::new("./platter.db")).await?;
//!
//! let mut tx = db.begin().await?;
//! InventoryLedger::deduct_dish(&mut tx, &dish, 2).await?;
//! tx.commit().await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod demo;
pub mod error;
pub mod ledger;
pub mod migrations;
pub mod pool;
pub mod redemption;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use ledger::InventoryLedger;
pub use pool::{Database, DbConfig};
pub use redemption::{CouponRedemption, Redemption};

// Repository re-exports for convenience
pub use repository::catalog::CatalogRepository;
pub use repository::coupon::CouponRepository;
pub use repository::customer::CustomerRepository;
pub use repository::order::OrderRepository;
pub use repository::warehouse::WarehouseRepository;
