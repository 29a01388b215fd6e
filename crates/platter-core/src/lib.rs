//! # platter-core: Pure Business Logic for Platter
//!
//! This crate holds the rules of the order fulfillment engine as pure
//! functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Platter Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                apps/checkout (OrderService)                     │   │
//! │  │   create_order, update_order_status, notifications             │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │              platter-db (transactions, repositories)            │   │
//! │  │        InventoryLedger, CouponRedemption, OrderRepository       │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ calls pure rules                       │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ platter-core (THIS CRATE) ★                     │   │
//! │  │                                                                 │   │
//! │  │   ┌────────┐ ┌────────┐ ┌─────────┐ ┌────────┐ ┌───────────┐   │   │
//! │  │   │ money  │ │  unit  │ │ pricing │ │ coupon │ │ inventory │   │   │
//! │  │   └────────┘ └────────┘ └─────────┘ └────────┘ └───────────┘   │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Dish, Offer, Coupon, Order, ...)
//! - [`money`] - Money and discount rate types with integer arithmetic
//! - [`unit`] - Measurement units and conversion
//! - [`pricing`] - Offer-aware prices, line totals, subtotals
//! - [`coupon`] - Coupon eligibility and discount rules
//! - [`inventory`] - Stock deduction planning for warehouse entries
//! - [`status`] - Order status state machine
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//!
//! ## Example Usage
//!
//! ```rust
//! use platter_core::money::{DiscountRate, Money};
//!
//! let price = Money::from_cents(10_000);
//! let discounted = price.apply_percentage_discount(DiscountRate::from_percent(10));
//! assert_eq!(discounted.cents(), 9_000);
//! ```

pub mod coupon;
pub mod error;
pub mod inventory;
pub mod money;
pub mod pricing;
pub mod status;
pub mod types;
pub mod unit;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use coupon::CouponError;
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::{DiscountRate, Money};
pub use status::OrderStatus;
pub use types::*;
pub use unit::Unit;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum number of lines accepted in a single order.
pub const MAX_ORDER_LINES: usize = 100;

/// Maximum quantity of a single dish on one order line.
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10).
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Calendar date format used for coupon validity windows.
pub const DATE_FORMAT: &str = "%Y-%m-%d";
