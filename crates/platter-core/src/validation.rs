//! # Validation Module
//!
//! Input validation for checkout requests and coupon maintenance.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Deserialization (serde)                                       │
//! │  └── Shape and types of the request                                     │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                   │
//! │  └── Request rules, checked before any row is touched                   │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                             │
//! │  ├── CHECK (available_quantity >= 0), CHECK (quantity >= 0)             │
//! │  ├── UNIQUE (code), UNIQUE (coupon_id, user_id)                         │
//! │  └── Foreign key constraints                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use platter_core::validation::{validate_coupon_code, validate_quantity};
//!
//! validate_coupon_code("SPRING20").unwrap();
//! validate_quantity(5).unwrap();
//! ```

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::FULL_BPS;
use crate::types::CreateOrderRequest;
use crate::{MAX_ITEM_QUANTITY, MAX_ORDER_LINES};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

const MAX_NOTE_LEN: usize = 500;
const MAX_CODE_LEN: usize = 50;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a coupon code.
///
/// ## Rules
/// - Must not be empty
/// - At most 50 characters
/// - Letters, digits, hyphens and underscores only
///
/// ## Example
/// ```rust
/// use platter_core::validation::validate_coupon_code;
///
/// assert!(validate_coupon_code("TET-2026").is_ok());
/// assert!(validate_coupon_code("").is_err());
/// assert!(validate_coupon_code("two words").is_err());
/// ```
pub fn validate_coupon_code(code: &str) -> ValidationResult<()> {
    let code = code.trim();

    if code.is_empty() {
        return Err(ValidationError::Required {
            field: "code".to_string(),
        });
    }

    if code.len() > MAX_CODE_LEN {
        return Err(ValidationError::TooLong {
            field: "code".to_string(),
            max: MAX_CODE_LEN,
        });
    }

    if !code
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "code".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(())
}

pub fn validate_payment_method(method: &str) -> ValidationResult<()> {
    if method.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "payment_method".to_string(),
        });
    }
    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY (999)
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates an amount in cents. Zero is allowed (free shipping).
///
/// ## Example
/// ```rust
/// use platter_core::validation::validate_price_cents;
///
/// assert!(validate_price_cents("shipping_fee", 0).is_ok());
/// assert!(validate_price_cents("shipping_fee", -100).is_err());
/// ```
pub fn validate_price_cents(field: &str, cents: i64) -> ValidationResult<()> {
    if cents < 0 {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates a percentage in basis points (0% to 100%).
pub fn validate_discount_bps(bps: u32) -> ValidationResult<()> {
    if bps > FULL_BPS {
        return Err(ValidationError::OutOfRange {
            field: "discount".to_string(),
            min: 0,
            max: FULL_BPS as i64,
        });
    }

    Ok(())
}

// =============================================================================
// Request Validators
// =============================================================================

/// Checks a checkout request before anything is read or written.
///
/// A non-positive quantity surfaces as [`CoreError::InvalidQuantity`] rather
/// than a generic validation error.
pub fn validate_order_request(request: &CreateOrderRequest) -> CoreResult<()> {
    if request.user_id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "user_id".to_string(),
        }
        .into());
    }
    if request.address_id.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "address_id".to_string(),
        }
        .into());
    }
    if request.items.is_empty() {
        return Err(ValidationError::Required {
            field: "items".to_string(),
        }
        .into());
    }
    if request.items.len() > MAX_ORDER_LINES {
        return Err(CoreError::OrderTooLarge {
            max: MAX_ORDER_LINES,
        });
    }

    for line in &request.items {
        if line.dish_id.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "dish_id".to_string(),
            }
            .into());
        }
        if line.quantity <= 0 {
            return Err(CoreError::InvalidQuantity {
                quantity: line.quantity,
            });
        }
        validate_quantity(line.quantity)?;
    }

    validate_price_cents("shipping_fee", request.shipping_fee_cents)?;
    validate_payment_method(&request.payment_method)?;

    if let Some(note) = &request.note {
        if note.chars().count() > MAX_NOTE_LEN {
            return Err(ValidationError::TooLong {
                field: "note".to_string(),
                max: MAX_NOTE_LEN,
            }
            .into());
        }
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================
