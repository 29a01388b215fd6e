//! # Coupon Redemption
//!
//! Applies a coupon to an order subtotal inside the order transaction.
//!
//! ```text
//! fetch coupon ──► NotFound
//!      │
//! usage exists? ─┐
//!      │         ▼
//! check_eligibility(coupon, today, used, subtotal)
//!      │   OutOfStock → NotYetValid → Expired → AlreadyUsed → MinimumNotMet
//!      ▼
//! decrement (CAS on version, quantity > 0) ── Conflict
//!      │
//! insert usage (UNIQUE coupon+user) ── duplicate → AlreadyUsed
//!      ▼
//! Redemption { discount, total = subtotal − discount }
//! ```

use chrono::NaiveDate;
use sqlx::SqliteConnection;
use tracing::info;

use crate::error::{DbError, DbResult};
use crate::repository::coupon::CouponRepository;
use platter_core::coupon::{check_eligibility, discount_for};
use platter_core::{CoreError, Coupon, CouponError, Money};

/// Outcome of a successful redemption.
#[derive(Debug, Clone)]
pub struct Redemption {
    pub coupon: Coupon,
    pub discount: Money,
    /// `subtotal − discount`, never below zero.
    pub total: Money,
}

pub struct CouponRedemption;

impl CouponRedemption {
    /// Redeems `coupon_id` for `user_id` against `subtotal` on `today`.
    ///
    /// `order_id` is stored on the usage row when given.
    pub async fn redeem(
        conn: &mut SqliteConnection,
        coupon_id: &str,
        user_id: &str,
        order_id: Option<&str>,
        subtotal: Money,
        today: NaiveDate,
    ) -> DbResult<Redemption> {
        let coupon = CouponRepository::fetch(&mut *conn, coupon_id)
            .await?
            .ok_or_else(|| CoreError::not_found("Coupon", coupon_id))?;

        let already_used = CouponRepository::usage_exists(&mut *conn, &coupon.id, user_id).await?;
        check_eligibility(&coupon, user_id, today, already_used, subtotal)?;

        let discount = discount_for(&coupon, subtotal);

        CouponRepository::decrement(&mut *conn, &coupon.id, coupon.version).await?;
        match CouponRepository::insert_usage(&mut *conn, &coupon.id, user_id, order_id).await {
            Ok(_) => {}
            // another transaction recorded the pair after our existence check
            Err(DbError::UniqueViolation { .. }) => {
                return Err(CouponError::AlreadyUsed {
                    code: coupon.code.clone(),
                    user_id: user_id.to_string(),
                }
                .into());
            }
            Err(e) => return Err(e),
        }

        let total = subtotal.saturating_sub(discount);
        info!(
            coupon = %coupon.code,
            user_id = %user_id,
            subtotal = %subtotal,
            discount = %discount,
            total = %total,
            "Coupon redeemed"
        );

        Ok(Redemption {
            coupon,
            discount,
            total,
        })
    }

    /// Reports whether `user_id` may still use the coupon `code`.
    pub async fn check_usage(
        coupons: &CouponRepository,
        code: &str,
        user_id: &str,
    ) -> DbResult<Coupon> {
        let coupon = coupons
            .find_by_code(code)
            .await?
            .ok_or_else(|| CoreError::not_found("Coupon", code))?;

        if coupons.exists_by_coupon_and_user(&coupon.id, user_id).await? {
            return Err(CouponError::AlreadyUsed {
                code: coupon.code,
                user_id: user_id.to_string(),
            }
            .into());
        }

        Ok(coupon)
    }
}
