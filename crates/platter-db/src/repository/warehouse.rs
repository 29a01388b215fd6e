//! # Warehouse Repository
//!
//! Ingredient stock rows. Every write is a versioned compare-and-swap:
//!
//! ```sql
//! UPDATE warehouses SET ..., version = version + 1
//! WHERE id = ? AND version = ?
//! ```
//!
//! Zero affected rows means someone else wrote the row since we read it,
//! reported as [`DbError::Conflict`].

use sqlx::{SqliteConnection, SqliteExecutor, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use platter_core::inventory::Deduction;
use platter_core::Warehouse;

const WAREHOUSE_COLUMNS: &str =
    "id, ingredient_name, available_quantity, quantity_used, unit, version";

#[derive(Debug, Clone)]
pub struct WarehouseRepository {
    pool: SqlitePool,
}

impl WarehouseRepository {
    pub fn new(pool: SqlitePool) -> Self {
        WarehouseRepository { pool }
    }

    pub async fn find(&self, id: &str) -> DbResult<Option<Warehouse>> {
        Self::fetch(&self.pool, id).await
    }

    pub async fn list(&self) -> DbResult<Vec<Warehouse>> {
        let rows = sqlx::query_as::<_, Warehouse>(&format!(
            "SELECT {} FROM warehouses ORDER BY ingredient_name",
            WAREHOUSE_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    pub async fn fetch<'e>(
        executor: impl SqliteExecutor<'e>,
        id: &str,
    ) -> DbResult<Option<Warehouse>> {
        let row = sqlx::query_as::<_, Warehouse>(&format!(
            "SELECT {} FROM warehouses WHERE id = ?1",
            WAREHOUSE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(row)
    }

    /// Applies a planned deduction if the row is still at the planned version.
    pub async fn apply_deduction(conn: &mut SqliteConnection, plan: &Deduction) -> DbResult<()> {
        debug!(
            warehouse_id = %plan.warehouse_id,
            required = plan.required,
            new_available = plan.new_available,
            version = plan.expected_version,
            "Applying stock deduction"
        );

        let result = sqlx::query(
            r#"
            UPDATE warehouses SET
                available_quantity = ?2,
                quantity_used = ?3,
                version = version + 1
            WHERE id = ?1 AND version = ?4
            "#,
        )
        .bind(&plan.warehouse_id)
        .bind(plan.new_available)
        .bind(plan.new_used)
        .bind(plan.expected_version)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::conflict("Warehouse", &plan.warehouse_id));
        }

        Ok(())
    }

    pub async fn insert(&self, warehouse: &Warehouse) -> DbResult<()> {
        debug!(id = %warehouse.id, ingredient = %warehouse.ingredient_name, "Inserting warehouse entry");

        sqlx::query(
            r#"
            INSERT INTO warehouses (id, ingredient_name, available_quantity, quantity_used, unit, version)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&warehouse.id)
        .bind(&warehouse.ingredient_name)
        .bind(warehouse.available_quantity)
        .bind(warehouse.quantity_used)
        .bind(&warehouse.unit)
        .bind(warehouse.version)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Adds stock (a delivery). Versioned like every other write.
    pub async fn restock(&self, id: &str, quantity: f64) -> DbResult<Warehouse> {
        let current = self
            .find(id)
            .await?
            .ok_or_else(|| DbError::not_found("Warehouse", id))?;

        let result = sqlx::query(
            r#"
            UPDATE warehouses SET
                available_quantity = available_quantity + ?2,
                version = version + 1
            WHERE id = ?1 AND version = ?3
            "#,
        )
        .bind(id)
        .bind(quantity)
        .bind(current.version)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::conflict("Warehouse", id));
        }

        self.find(id)
            .await?
            .ok_or_else(|| DbError::not_found("Warehouse", id))
    }
}
