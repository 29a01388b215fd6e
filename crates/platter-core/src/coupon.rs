//! # Coupon Rules
//!
//! Pure eligibility and discount rules for order-level coupons. The
//! database layer loads the coupon and the usage flag, calls into here, and
//! only then performs the guarded decrement.
//!
//! ## Check Order
//! ```text
//! quantity > 0 ──► today >= start ──► today <= expiration ──► not used by user ──► subtotal >= minimum
//!     │                 │                    │                       │                     │
//!     ▼                 ▼                    ▼                       ▼                     ▼
//! OutOfStock       NotYetValid            Expired               AlreadyUsed          MinimumNotMet
//! ```
//! The first failing check wins; callers rely on that order when reporting.

use chrono::NaiveDate;
use thiserror::Error;

use crate::error::{CoreResult, ValidationError};
use crate::money::{Money, FULL_BPS};
use crate::types::Coupon;
use crate::DATE_FORMAT;

/// Reasons a coupon cannot be applied.
#[derive(Debug, Error)]
pub enum CouponError {
    #[error("Coupon {code} is out of stock")]
    OutOfStock { code: String },

    #[error("Coupon {code} is not valid until {starts}")]
    NotYetValid { code: String, starts: NaiveDate },

    #[error("Coupon {code} expired on {expired}")]
    Expired { code: String, expired: NaiveDate },

    #[error("Coupon {code} has already been used by user {user_id}")]
    AlreadyUsed { code: String, user_id: String },

    #[error("Coupon {code} requires a minimum order of {minimum}, subtotal is {subtotal}")]
    MinimumNotMet {
        code: String,
        minimum: Money,
        subtotal: Money,
    },
}

/// Parses a stored `YYYY-MM-DD` coupon date.
pub fn parse_date(field: &str, value: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).map_err(|e| {
        ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: format!("'{}' is not a YYYY-MM-DD date ({})", value, e),
        }
    })
}

/// Parsed validity window of a coupon, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidityWindow {
    pub starts: NaiveDate,
    pub expires: NaiveDate,
}

impl ValidityWindow {
    pub fn of(coupon: &Coupon) -> Result<Self, ValidationError> {
        Ok(ValidityWindow {
            starts: parse_date("start_date", &coupon.start_date)?,
            expires: parse_date("expiration_date", &coupon.expiration_date)?,
        })
    }
}

/// Runs every eligibility check in order.
///
/// `already_used` is whether a usage row exists for this coupon and user.
pub fn check_eligibility(
    coupon: &Coupon,
    user_id: &str,
    today: NaiveDate,
    already_used: bool,
    subtotal: Money,
) -> CoreResult<()> {
    if coupon.quantity <= 0 {
        return Err(CouponError::OutOfStock {
            code: coupon.code.clone(),
        }
        .into());
    }

    let window = ValidityWindow::of(coupon)?;
    if today < window.starts {
        return Err(CouponError::NotYetValid {
            code: coupon.code.clone(),
            starts: window.starts,
        }
        .into());
    }
    if today > window.expires {
        return Err(CouponError::Expired {
            code: coupon.code.clone(),
            expired: window.expires,
        }
        .into());
    }
    if already_used {
        return Err(CouponError::AlreadyUsed {
            code: coupon.code.clone(),
            user_id: user_id.to_string(),
        }
        .into());
    }
    if let Some(minimum) = coupon.min_order_value() {
        if subtotal < minimum {
            return Err(CouponError::MinimumNotMet {
                code: coupon.code.clone(),
                minimum,
                subtotal,
            }
            .into());
        }
    }
    Ok(())
}

/// Discount granted on `subtotal`: the coupon percentage, capped by the
/// coupon's max discount and never more than the subtotal itself.
///
/// ## Example
/// ```rust
/// # use platter_core::coupon::discount_for;
/// # use platter_core::money::Money;
/// # use platter_core::types::Coupon;
/// let coupon = Coupon {
///     id: "c1".into(),
///     code: "SPRING".into(),
///     description: None,
///     discount_bps: 2000,
///     max_discount_cents: Some(1500),
///     min_order_value_cents: Some(5000),
///     quantity: 10,
///     start_date: "2026-01-01".into(),
///     expiration_date: "2026-12-31".into(),
///     status: "ACTIVE".into(),
///     version: 0,
/// };
/// assert_eq!(discount_for(&coupon, Money::from_cents(18_500)).cents(), 1_500);
/// ```
pub fn discount_for(coupon: &Coupon, subtotal: Money) -> Money {
    let mut discount = subtotal.percentage_of(coupon.discount());
    if let Some(cap) = coupon.max_discount() {
        discount = discount.min(cap);
    }
    discount.min(subtotal).max(Money::zero())
}

/// Validates coupon fields on create/update.
pub fn validate_coupon_fields(coupon: &Coupon) -> Result<(), ValidationError> {
    crate::validation::validate_coupon_code(&coupon.code)?;
    if coupon.discount_bps == 0 || coupon.discount_bps > FULL_BPS {
        return Err(ValidationError::OutOfRange {
            field: "discount_bps".to_string(),
            min: 1,
            max: FULL_BPS as i64,
        });
    }
    if coupon.quantity < 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }
    if coupon.max_discount_cents.is_some_and(|c| c < 0) {
        return Err(ValidationError::MustBePositive {
            field: "max_discount_cents".to_string(),
        });
    }
    if coupon.min_order_value_cents.is_some_and(|c| c < 0) {
        return Err(ValidationError::MustBePositive {
            field: "min_order_value_cents".to_string(),
        });
    }

    let window = ValidityWindow::of(coupon)?;
    if window.starts > window.expires {
        return Err(ValidationError::InvalidFormat {
            field: "start_date".to_string(),
            reason: "start date must not be after expiration date".to_string(),
        });
    }
    Ok(())
}
