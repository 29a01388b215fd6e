//! # Error Types
//!
//! Domain-specific error types for platter-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  platter-core errors (this file)                                       │
//! │  ├── CoreError        - Domain rule violations                         │
//! │  │   └── CouponError  - Coupon eligibility failures (coupon.rs)        │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  platter-db errors (separate crate)                                    │
//! │  └── DbError          - Database failures, wraps CoreError             │
//! │                                                                         │
//! │  checkout errors (app)                                                 │
//! │  └── ApiError         - What the caller sees (code + message)          │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → DbError → ApiError → Caller       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use thiserror::Error;

use crate::coupon::CouponError;
use crate::status::OrderStatus;
use crate::unit::Unit;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// Every variant is recoverable at the orchestrator boundary; none of them
/// should ever bring the process down.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A referenced entity (user, address, dish, option, coupon, order,
    /// warehouse entry) does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// An order line asked for zero or a negative number of dishes.
    #[error("Invalid quantity {quantity}: quantity must be a positive integer")]
    InvalidQuantity { quantity: i64 },

    /// Deducting the recipe would drive a warehouse entry below zero.
    ///
    /// ## User Workflow
    /// ```text
    /// Order: 2 × Pho Bo
    ///      │
    ///      ▼
    /// Recipe: 0.25 kg beef per bowl → 0.5 kg needed
    ///      │
    ///      ▼
    /// Warehouse "Beef": available 0.3 kg
    ///      │
    ///      ▼
    /// InsufficientStock { dish: "Pho Bo", .. } → whole order aborted
    /// ```
    #[error("Not enough stock in warehouse for item: {dish} ({ingredient}: available {available}, required {required})")]
    InsufficientStock {
        dish: String,
        ingredient: String,
        available: f64,
        required: f64,
    },

    /// A recipe and its warehouse entry use units of different dimensions.
    /// This is a data-setup defect, not something the customer can fix.
    #[error("Cannot convert {from} to {to}")]
    IncompatibleUnits { from: Unit, to: Unit },

    /// Coupon eligibility failure.
    #[error(transparent)]
    Coupon(#[from] CouponError),

    /// Order status change not allowed by the transition table.
    #[error("Order status cannot change from {from} to {to}")]
    InvalidStatusTransition { from: OrderStatus, to: OrderStatus },

    /// Order has exceeded the maximum allowed lines.
    #[error("Order cannot have more than {max} lines")]
    OrderTooLarge { max: usize },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        CoreError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when input doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid UUID, invalid date).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Value is not in allowed set.
    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },

    /// Duplicate value (e.g., duplicate coupon code).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
