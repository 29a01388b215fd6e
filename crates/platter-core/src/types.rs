//! # Domain Types
//!
//! Core domain types used throughout Platter.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  Catalog (read-only here)          Shared mutable resources             │
//! │  ┌──────────┐ ┌──────────┐         ┌────────────┐ ┌────────────┐        │
//! │  │   Dish   │ │  Offer   │         │ Warehouse  │ │   Coupon   │        │
//! │  │ Recipe   │ │ Option   │         │ (version)  │ │ (version)  │        │
//! │  └──────────┘ └──────────┘         └────────────┘ └────────────┘        │
//! │                                                                         │
//! │  Order aggregate (owned, immutable after checkout)                      │
//! │  ┌──────────┐ 1   * ┌───────────┐ 1   * ┌─────────────────┐             │
//! │  │  Order   │──────►│ OrderItem │──────►│ OrderItemOption │             │
//! │  └──────────┘       └───────────┘       └─────────────────┘             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Snapshot Pattern
//! Order items copy the dish name and effective price at checkout time, so
//! later catalog edits never change what a customer was charged.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::{DiscountRate, Money};
use crate::status::OrderStatus;

// =============================================================================
// Customers
// =============================================================================

/// A registered customer. Only the fields checkout needs.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct User {
    pub id: String,
    pub email: String,
    pub full_name: String,
}

/// A delivery address.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Address {
    pub id: String,
    pub user_id: String,
    pub recipient_name: String,
    pub street: String,
    pub phone: Option<String>,
}

// =============================================================================
// Catalog
// =============================================================================

/// A dish on the menu.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Dish {
    pub id: String,
    pub name: String,
    /// Base price in cents.
    pub price_cents: i64,
    /// Standing reduced price, used instead of the base price when set.
    pub offer_price_cents: Option<i64>,
    pub category_id: Option<String>,
    pub thumb_image: Option<String>,
}

impl Dish {
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Price before any dated offer: the offer price if configured, else the
    /// base price.
    #[inline]
    pub fn list_price(&self) -> Money {
        Money::from_cents(self.offer_price_cents.unwrap_or(self.price_cents))
    }
}

/// A selectable extra for a dish (size, topping, ...).
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct DishOptionSelection {
    pub id: String,
    pub dish_id: String,
    pub option_name: String,
    pub additional_price_cents: i64,
}

impl DishOptionSelection {
    #[inline]
    pub fn additional_price(&self) -> Money {
        Money::from_cents(self.additional_price_cents)
    }
}

/// A dated percentage discount on one dish. Bounds are inclusive.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Offer {
    pub id: String,
    pub dish_id: String,
    pub discount_bps: u32,
    #[ts(as = "String")]
    pub start_date: NaiveDate,
    #[ts(as = "String")]
    pub end_date: NaiveDate,
}

impl Offer {
    #[inline]
    pub fn discount(&self) -> DiscountRate {
        DiscountRate::from_bps(self.discount_bps)
    }

    /// An offer is active on `date` iff `start_date <= date <= end_date`.
    #[inline]
    pub fn is_active_on(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }
}

/// How much of one warehouse ingredient a single dish consumes.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Recipe {
    pub id: String,
    pub dish_id: String,
    pub warehouse_id: String,
    /// Quantity used per dish unit sold, in `unit`.
    pub quantity_used: f64,
    pub unit: String,
}

// =============================================================================
// Shared Mutable Resources
// =============================================================================

/// Stock ledger entry for one ingredient.
///
/// ## Invariant
/// `available_quantity >= 0`, checked before every write. `version` is bumped
/// on each write and used as the compare-and-swap token.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Warehouse {
    pub id: String,
    pub ingredient_name: String,
    pub available_quantity: f64,
    pub quantity_used: f64,
    pub unit: String,
    pub version: i64,
}

/// Order-level discount code.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Coupon {
    pub id: String,
    pub code: String,
    pub description: Option<String>,
    pub discount_bps: u32,
    pub max_discount_cents: Option<i64>,
    pub min_order_value_cents: Option<i64>,
    /// Remaining redemptions. Never negative.
    pub quantity: i64,
    /// First valid day, `YYYY-MM-DD`.
    pub start_date: String,
    /// Last valid day, `YYYY-MM-DD`.
    pub expiration_date: String,
    pub status: String,
    pub version: i64,
}

impl Coupon {
    #[inline]
    pub fn discount(&self) -> DiscountRate {
        DiscountRate::from_bps(self.discount_bps)
    }

    #[inline]
    pub fn max_discount(&self) -> Option<Money> {
        self.max_discount_cents.map(Money::from_cents)
    }

    #[inline]
    pub fn min_order_value(&self) -> Option<Money> {
        self.min_order_value_cents.map(Money::from_cents)
    }
}

/// Admin input for creating or replacing a coupon.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CouponDraft {
    pub code: String,
    #[serde(default)]
    pub description: Option<String>,
    pub discount_bps: u32,
    #[serde(default)]
    pub max_discount_cents: Option<i64>,
    #[serde(default)]
    pub min_order_value_cents: Option<i64>,
    /// Number of redemptions available.
    pub max_usage: i64,
    pub start_date: String,
    pub expiration_date: String,
    pub status: String,
}

impl CouponDraft {
    /// Builds the stored row. Code and status are trimmed, status uppercased.
    pub fn into_coupon(self, id: String, version: i64) -> Coupon {
        Coupon {
            id,
            code: self.code.trim().to_string(),
            description: self.description,
            discount_bps: self.discount_bps,
            max_discount_cents: self.max_discount_cents,
            min_order_value_cents: self.min_order_value_cents,
            quantity: self.max_usage,
            start_date: self.start_date.trim().to_string(),
            expiration_date: self.expiration_date.trim().to_string(),
            status: self.status.trim().to_uppercase(),
            version,
        }
    }
}

/// Record of one user redeeming one coupon. At most one per pair.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct CouponUsage {
    pub id: String,
    pub coupon_id: String,
    pub user_id: String,
    pub order_id: Option<String>,
    #[ts(as = "String")]
    pub used_at: DateTime<Utc>,
}

// =============================================================================
// Order Aggregate
// =============================================================================

/// A placed order.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Order {
    pub id: String,
    pub user_id: String,
    pub address_id: String,
    pub status: OrderStatus,
    pub note: Option<String>,
    pub payment_method: String,
    pub shipping_fee_cents: i64,
    /// Σ line totals + shipping fee.
    pub subtotal_cents: i64,
    pub discount_cents: i64,
    /// subtotal − coupon discount.
    pub total_price_cents: i64,
    pub coupon_id: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Order {
    #[inline]
    pub fn total_price(&self) -> Money {
        Money::from_cents(self.total_price_cents)
    }

    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }

    #[inline]
    pub fn shipping_fee(&self) -> Money {
        Money::from_cents(self.shipping_fee_cents)
    }
}

/// A line of an order, frozen at checkout.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct OrderItem {
    pub id: String,
    pub order_id: String,
    pub dish_id: String,
    /// Dish name at time of order (frozen).
    pub dish_name: String,
    pub quantity: i64,
    /// Effective unit price at time of order (frozen).
    pub unit_price_cents: i64,
    /// (unit price + Σ option prices) × quantity.
    pub line_total_cents: i64,
}

impl OrderItem {
    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.line_total_cents)
    }
}

/// A selected option on an order line, frozen at checkout.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct OrderItemOption {
    pub id: String,
    pub order_item_id: String,
    pub selection_id: String,
    pub option_name: String,
    pub additional_price_cents: i64,
}

/// An order line together with its options.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderLine {
    pub item: OrderItem,
    pub options: Vec<OrderItemOption>,
}

/// An order read back with all of its lines.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OrderDetails {
    pub order: Order,
    pub lines: Vec<OrderLine>,
}

impl OrderDetails {
    /// Σ line totals, without shipping.
    pub fn items_total(&self) -> Money {
        self.lines.iter().map(|l| l.item.line_total()).sum()
    }
}

// =============================================================================
// Checkout Request
// =============================================================================

/// One cart line as submitted by the client.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct OrderLineRequest {
    pub dish_id: String,
    pub quantity: i64,
    #[serde(default)]
    pub selected_option_ids: Vec<String>,
}

/// Checkout payload.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CreateOrderRequest {
    pub user_id: String,
    pub address_id: String,
    pub items: Vec<OrderLineRequest>,
    pub shipping_fee_cents: i64,
    pub payment_method: String,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub coupon_id: Option<String>,
}

impl CreateOrderRequest {
    /// The coupon id, treating an empty or blank string as absent.
    pub fn coupon(&self) -> Option<&str> {
        self.coupon_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }
}
