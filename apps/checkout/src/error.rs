//! # API Error Type
//!
//! Unified error type returned by the checkout service.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Platter Checkout                       │
//! │                                                                         │
//! │  OrderService::create_order(request)                                    │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  Validation failed? ─── CoreError::Validation ──────────┐               │
//! │         │                                               │               │
//! │         ▼                                               ▼               │
//! │  Rule violated? ─────── DbError::Domain(CoreError) ── ApiError ───────► │
//! │         │                                               ▲               │
//! │         ▼                                               │               │
//! │  Lost a race? ───────── DbError::Conflict (retried) ────┘               │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  Success ─────────────────────────────────────────────────────────────► │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Callers receive a machine-readable `code` and a human-readable `message`:
//! ```json
//! {
//!   "code": "COUPON_EXPIRED",
//!   "message": "Coupon SPRING20 expired on 2026-03-31"
//! }
//! ```

use serde::Serialize;
use platter_core::{CoreError, CouponError};
use platter_db::DbError;

/// API error returned from checkout operations.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Error codes for API responses. One per failure the caller can act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Resource not found (404)
    NotFound,

    /// Input validation failed (400)
    ValidationError,

    /// Zero or negative dish quantity (400)
    InvalidQuantity,

    /// A warehouse entry cannot cover the order (409)
    InsufficientStock,

    /// Recipe and warehouse units do not convert (500, data defect)
    IncompatibleUnits,

    CouponOutOfStock,
    CouponNotYetValid,
    CouponExpired,
    CouponAlreadyUsed,
    CouponMinimumNotMet,

    /// Order status change not in the transition table (422)
    InvalidStatusTransition,

    /// Concurrent update; the request may be retried (409)
    Conflict,

    /// Database operation failed (500)
    DatabaseError,

    /// Internal server error (500)
    Internal,
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(
            ErrorCode::NotFound,
            format!("{} not found: {}", resource, id),
        )
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    /// Creates an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }

    /// True when the same request may succeed if sent again.
    pub fn is_retryable(&self) -> bool {
        self.code == ErrorCode::Conflict
    }
}

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::Domain(core) => core.into(),
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            DbError::UniqueViolation { field, value } => ApiError::new(
                ErrorCode::ValidationError,
                format!("{} '{}' already exists", field, value),
            ),
            DbError::Conflict { entity, id } => {
                tracing::warn!(entity = %entity, id = %id, "Concurrent update surfaced to caller");
                ApiError::new(
                    ErrorCode::Conflict,
                    format!("Concurrent update on {}, please retry", entity),
                )
            }
            DbError::ConnectionFailed(_) => {
                ApiError::new(ErrorCode::DatabaseError, "Database connection failed")
            }
            DbError::MigrationFailed(_) => {
                ApiError::new(ErrorCode::DatabaseError, "Database migration failed")
            }
            DbError::QueryFailed(e) => {
                // Log the actual error but return a generic message
                tracing::error!("Database query failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
            DbError::TransactionFailed(e) => {
                tracing::error!("Transaction failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database transaction failed")
            }
            DbError::ForeignKeyViolation { message } => {
                tracing::error!("Foreign key violation: {}", message);
                ApiError::new(ErrorCode::ValidationError, "Invalid reference")
            }
            DbError::PoolExhausted => {
                ApiError::new(ErrorCode::DatabaseError, "Database pool exhausted")
            }
            DbError::Internal(e) => {
                tracing::error!("Internal database error: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

/// Converts core errors to API errors.
impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        let message = err.to_string();
        let code = match &err {
            CoreError::NotFound { .. } => ErrorCode::NotFound,
            CoreError::InvalidQuantity { .. } => ErrorCode::InvalidQuantity,
            CoreError::InsufficientStock { .. } => ErrorCode::InsufficientStock,
            CoreError::IncompatibleUnits { .. } => {
                tracing::error!("Recipe data defect: {}", message);
                ErrorCode::IncompatibleUnits
            }
            CoreError::Coupon(coupon) => match coupon {
                CouponError::OutOfStock { .. } => ErrorCode::CouponOutOfStock,
                CouponError::NotYetValid { .. } => ErrorCode::CouponNotYetValid,
                CouponError::Expired { .. } => ErrorCode::CouponExpired,
                CouponError::AlreadyUsed { .. } => ErrorCode::CouponAlreadyUsed,
                CouponError::MinimumNotMet { .. } => ErrorCode::CouponMinimumNotMet,
            },
            CoreError::InvalidStatusTransition { .. } => ErrorCode::InvalidStatusTransition,
            CoreError::OrderTooLarge { .. } | CoreError::Validation(_) => {
                ErrorCode::ValidationError
            }
        };
        ApiError::new(code, message)
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use platter_core::ValidationError;

    #[test]
    fn test_coupon_errors_keep_their_kind() {
        let err: ApiError = DbError::Domain(CoreError::Coupon(CouponError::Expired {
            code: "SPRING20".into(),
            expired: NaiveDate::from_ymd_opt(2026, 3, 31).unwrap(),
        }))
        .into();
        assert_eq!(err.code, ErrorCode::CouponExpired);
        assert_eq!(err.message, "Coupon SPRING20 expired on 2026-03-31");
    }

    #[test]
    fn test_conflict_is_retryable() {
        let err: ApiError = DbError::conflict("Coupon", "c1").into();
        assert_eq!(err.code, ErrorCode::Conflict);
        assert!(err.is_retryable());
        assert!(!ApiError::not_found("Dish", "d1").is_retryable());
    }

    #[test]
    fn test_query_failure_hides_details() {
        let err: ApiError = DbError::QueryFailed("no such column: secret".into()).into();
        assert_eq!(err.code, ErrorCode::DatabaseError);
        assert!(!err.message.contains("secret"));
    }

    #[test]
    fn test_serialized_shape() {
        let err: ApiError = CoreError::from(ValidationError::Required {
            field: "paymentMethod".into(),
        })
        .into();
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["code"], "VALIDATION_ERROR");
        assert!(json["message"].as_str().unwrap().contains("paymentMethod"));
    }
}
