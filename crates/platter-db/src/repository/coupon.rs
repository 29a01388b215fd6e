//! # Coupon Repository
//!
//! Coupons and their per-user usage records.
//!
//! ## Redemption Writes
//! ```text
//! decrement(coupon, version)                 insert_usage(coupon, user)
//!   UPDATE coupons SET quantity - 1,           INSERT INTO coupon_usages
//!          version + 1                         UNIQUE (coupon_id, user_id)
//!   WHERE id = ? AND version = ?                     │
//!     AND quantity > 0                               ▼
//!          │                                 duplicate → AlreadyUsed
//!          ▼
//!   0 rows → Conflict
//! ```
//! Both run on the order transaction's connection; see
//! [`crate::redemption::CouponRedemption`].

use chrono::Utc;
use sqlx::{SqliteConnection, SqliteExecutor, SqlitePool};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use platter_core::coupon::validate_coupon_fields;
use platter_core::{Coupon, CouponDraft, CouponUsage, ValidationError};

const COUPON_COLUMNS: &str = "id, code, description, discount_bps, max_discount_cents, \
     min_order_value_cents, quantity, start_date, expiration_date, status, version";

#[derive(Debug, Clone)]
pub struct CouponRepository {
    pool: SqlitePool,
}

impl CouponRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CouponRepository { pool }
    }

    // =========================================================================
    // Lookups
    // =========================================================================

    pub async fn find(&self, id: &str) -> DbResult<Option<Coupon>> {
        Self::fetch(&self.pool, id).await
    }

    pub async fn find_by_code(&self, code: &str) -> DbResult<Option<Coupon>> {
        let coupon = sqlx::query_as::<_, Coupon>(&format!(
            "SELECT {} FROM coupons WHERE code = ?1",
            COUPON_COLUMNS
        ))
        .bind(code.trim())
        .fetch_optional(&self.pool)
        .await?;

        Ok(coupon)
    }

    pub async fn fetch<'e>(
        executor: impl SqliteExecutor<'e>,
        id: &str,
    ) -> DbResult<Option<Coupon>> {
        let coupon = sqlx::query_as::<_, Coupon>(&format!(
            "SELECT {} FROM coupons WHERE id = ?1",
            COUPON_COLUMNS
        ))
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(coupon)
    }

    /// Coupons ordered by code, one page at a time.
    pub async fn list(&self, limit: u32, offset: u32) -> DbResult<Vec<Coupon>> {
        let coupons = sqlx::query_as::<_, Coupon>(&format!(
            "SELECT {} FROM coupons ORDER BY code LIMIT ?1 OFFSET ?2",
            COUPON_COLUMNS
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(coupons)
    }

    /// Coupons the user has never redeemed.
    pub async fn list_unused_by_user(
        &self,
        user_id: &str,
        limit: u32,
        offset: u32,
    ) -> DbResult<Vec<Coupon>> {
        let coupons = sqlx::query_as::<_, Coupon>(&format!(
            r#"
            SELECT {} FROM coupons c
            WHERE NOT EXISTS (
                SELECT 1 FROM coupon_usages u
                WHERE u.coupon_id = c.id AND u.user_id = ?1
            )
            ORDER BY code
            LIMIT ?2 OFFSET ?3
            "#,
            COUPON_COLUMNS
        ))
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(coupons)
    }

    pub async fn exists_by_code(&self, code: &str) -> DbResult<bool> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM coupons WHERE code = ?1")
            .bind(code.trim())
            .fetch_one(&self.pool)
            .await?;

        Ok(count > 0)
    }

    /// True when another coupon (not `id`) already uses `code`.
    pub async fn exists_by_code_and_id_not(&self, code: &str, id: &str) -> DbResult<bool> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM coupons WHERE code = ?1 AND id <> ?2")
                .bind(code.trim())
                .bind(id)
                .fetch_one(&self.pool)
                .await?;

        Ok(count > 0)
    }

    pub async fn exists_by_coupon_and_user(&self, coupon_id: &str, user_id: &str) -> DbResult<bool> {
        Self::usage_exists(&self.pool, coupon_id, user_id).await
    }

    pub async fn usage_exists<'e>(
        executor: impl SqliteExecutor<'e>,
        coupon_id: &str,
        user_id: &str,
    ) -> DbResult<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM coupon_usages WHERE coupon_id = ?1 AND user_id = ?2",
        )
        .bind(coupon_id)
        .bind(user_id)
        .fetch_one(executor)
        .await?;

        Ok(count > 0)
    }

    pub async fn usages_for_coupon(&self, coupon_id: &str) -> DbResult<Vec<CouponUsage>> {
        let usages = sqlx::query_as::<_, CouponUsage>(
            r#"
            SELECT id, coupon_id, user_id, order_id, used_at
            FROM coupon_usages
            WHERE coupon_id = ?1
            ORDER BY used_at
            "#,
        )
        .bind(coupon_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(usages)
    }

    // =========================================================================
    // Redemption writes (transaction-scoped)
    // =========================================================================

    /// Takes one redemption off the coupon if it is still at `expected_version`
    /// and has stock left.
    pub async fn decrement(
        conn: &mut SqliteConnection,
        coupon_id: &str,
        expected_version: i64,
    ) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE coupons SET
                quantity = quantity - 1,
                version = version + 1
            WHERE id = ?1 AND version = ?2 AND quantity > 0
            "#,
        )
        .bind(coupon_id)
        .bind(expected_version)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::conflict("Coupon", coupon_id));
        }

        debug!(coupon_id = %coupon_id, version = expected_version, "Coupon decremented");
        Ok(())
    }

    pub async fn insert_usage(
        conn: &mut SqliteConnection,
        coupon_id: &str,
        user_id: &str,
        order_id: Option<&str>,
    ) -> DbResult<CouponUsage> {
        let usage = CouponUsage {
            id: Uuid::new_v4().to_string(),
            coupon_id: coupon_id.to_string(),
            user_id: user_id.to_string(),
            order_id: order_id.map(str::to_string),
            used_at: Utc::now(),
        };

        sqlx::query(
            r#"
            INSERT INTO coupon_usages (id, coupon_id, user_id, order_id, used_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&usage.id)
        .bind(&usage.coupon_id)
        .bind(&usage.user_id)
        .bind(&usage.order_id)
        .bind(usage.used_at)
        .execute(&mut *conn)
        .await?;

        Ok(usage)
    }

    // =========================================================================
    // Maintenance
    // =========================================================================

    /// Creates a coupon after field validation and a duplicate-code check.
    pub async fn create(&self, draft: CouponDraft) -> DbResult<Coupon> {
        let coupon = draft.into_coupon(Uuid::new_v4().to_string(), 0);
        validate_coupon_fields(&coupon)?;

        if self.exists_by_code(&coupon.code).await? {
            return Err(ValidationError::Duplicate {
                field: "code".to_string(),
                value: coupon.code,
            }
            .into());
        }

        self.insert(&coupon).await?;
        info!(id = %coupon.id, code = %coupon.code, "Coupon created");
        Ok(coupon)
    }

    /// Inserts a coupon row as-is (seeding, tests).
    pub async fn insert(&self, coupon: &Coupon) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO coupons (
                id, code, description, discount_bps, max_discount_cents,
                min_order_value_cents, quantity, start_date, expiration_date,
                status, version
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
        )
        .bind(&coupon.id)
        .bind(&coupon.code)
        .bind(&coupon.description)
        .bind(coupon.discount_bps)
        .bind(coupon.max_discount_cents)
        .bind(coupon.min_order_value_cents)
        .bind(coupon.quantity)
        .bind(&coupon.start_date)
        .bind(&coupon.expiration_date)
        .bind(&coupon.status)
        .bind(coupon.version)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Replaces every editable field of coupon `id`.
    pub async fn update(&self, id: &str, draft: CouponDraft) -> DbResult<Coupon> {
        let current = self
            .find(id)
            .await?
            .ok_or_else(|| DbError::not_found("Coupon", id))?;

        let coupon = draft.into_coupon(current.id, current.version + 1);
        validate_coupon_fields(&coupon)?;

        if self.exists_by_code_and_id_not(&coupon.code, id).await? {
            return Err(ValidationError::Duplicate {
                field: "code".to_string(),
                value: coupon.code,
            }
            .into());
        }

        let result = sqlx::query(
            r#"
            UPDATE coupons SET
                code = ?2,
                description = ?3,
                discount_bps = ?4,
                max_discount_cents = ?5,
                min_order_value_cents = ?6,
                quantity = ?7,
                start_date = ?8,
                expiration_date = ?9,
                status = ?10,
                version = version + 1
            WHERE id = ?1 AND version = ?11
            "#,
        )
        .bind(id)
        .bind(&coupon.code)
        .bind(&coupon.description)
        .bind(coupon.discount_bps)
        .bind(coupon.max_discount_cents)
        .bind(coupon.min_order_value_cents)
        .bind(coupon.quantity)
        .bind(&coupon.start_date)
        .bind(&coupon.expiration_date)
        .bind(&coupon.status)
        .bind(current.version)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::conflict("Coupon", id));
        }

        info!(id = %id, code = %coupon.code, "Coupon updated");
        Ok(coupon)
    }

    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM coupons WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Coupon", id));
        }

        info!(id = %id, "Coupon deleted");
        Ok(())
    }
}
