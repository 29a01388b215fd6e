//! # Order Repository
//!
//! Orders, their items and the options chosen on each item.
//!
//! ## Order Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. INSERT (inside the checkout transaction)                            │
//! │     └── insert_order() → Order { status: PENDING, total = subtotal }    │
//! │     └── insert_line()  → OrderItem + OrderItemOption snapshots          │
//! │     └── apply_discount() → total = subtotal − coupon discount           │
//! │                                                                         │
//! │  2. STATUS CHANGES (admin, outside checkout)                            │
//! │     └── update_status() guarded by the status read before the change    │
//! │                                                                         │
//! │  3. READ BACK                                                           │
//! │     └── get_details() → OrderDetails { order, lines }                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Items and options are never updated after insert.

use chrono::Utc;
use sqlx::{SqliteConnection, SqliteExecutor, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use platter_core::pricing::PricedLine;
use platter_core::{Order, OrderDetails, OrderItem, OrderItemOption, OrderLine, OrderStatus};

const ORDER_COLUMNS: &str = "id, user_id, address_id, status, note, payment_method, \
     shipping_fee_cents, subtotal_cents, discount_cents, total_price_cents, coupon_id, \
     created_at, updated_at";

#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
}

impl OrderRepository {
    pub fn new(pool: SqlitePool) -> Self {
        OrderRepository { pool }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    pub async fn find(&self, id: &str) -> DbResult<Option<Order>> {
        Self::fetch(&self.pool, id).await
    }

    pub async fn fetch<'e>(
        executor: impl SqliteExecutor<'e>,
        id: &str,
    ) -> DbResult<Option<Order>> {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {} FROM orders WHERE id = ?1",
            ORDER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(order)
    }

    /// Newest orders first, one page at a time.
    pub async fn list(&self, limit: u32, offset: u32) -> DbResult<Vec<Order>> {
        let orders = sqlx::query_as::<_, Order>(&format!(
            "SELECT {} FROM orders ORDER BY created_at DESC, id LIMIT ?1 OFFSET ?2",
            ORDER_COLUMNS
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(orders)
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub async fn get_items(&self, order_id: &str) -> DbResult<Vec<OrderItem>> {
        let items = sqlx::query_as::<_, OrderItem>(
            r#"
            SELECT id, order_id, dish_id, dish_name, quantity, unit_price_cents, line_total_cents
            FROM order_items
            WHERE order_id = ?1
            ORDER BY position
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    pub async fn get_item_options(&self, order_item_id: &str) -> DbResult<Vec<OrderItemOption>> {
        let options = sqlx::query_as::<_, OrderItemOption>(
            r#"
            SELECT id, order_item_id, selection_id, option_name, additional_price_cents
            FROM order_item_options
            WHERE order_item_id = ?1
            ORDER BY rowid
            "#,
        )
        .bind(order_item_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(options)
    }

    /// Loads an order with all its lines and their options.
    pub async fn get_details(&self, order_id: &str) -> DbResult<Option<OrderDetails>> {
        let Some(order) = self.find(order_id).await? else {
            return Ok(None);
        };

        let mut lines = Vec::new();
        for item in self.get_items(order_id).await? {
            let options = self.get_item_options(&item.id).await?;
            lines.push(OrderLine { item, options });
        }

        Ok(Some(OrderDetails { order, lines }))
    }

    // =========================================================================
    // Checkout writes (transaction-scoped)
    // =========================================================================

    /// Inserts a `PENDING` order whose total equals its subtotal.
    pub async fn insert_order(conn: &mut SqliteConnection, order: &Order) -> DbResult<()> {
        debug!(
            id = %order.id,
            user_id = %order.user_id,
            subtotal = order.subtotal_cents,
            "Inserting order"
        );

        sqlx::query(
            r#"
            INSERT INTO orders (
                id, user_id, address_id, status, note, payment_method,
                shipping_fee_cents, subtotal_cents, discount_cents, total_price_cents,
                coupon_id, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
            "#,
        )
        .bind(&order.id)
        .bind(&order.user_id)
        .bind(&order.address_id)
        .bind(order.status)
        .bind(&order.note)
        .bind(&order.payment_method)
        .bind(order.shipping_fee_cents)
        .bind(order.subtotal_cents)
        .bind(order.discount_cents)
        .bind(order.total_price_cents)
        .bind(&order.coupon_id)
        .bind(order.created_at)
        .bind(order.updated_at)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }

    /// Persists one priced line as an item plus option snapshots.
    pub async fn insert_line(
        conn: &mut SqliteConnection,
        order_id: &str,
        position: usize,
        line: &PricedLine,
    ) -> DbResult<OrderLine> {
        let item = OrderItem {
            id: Uuid::new_v4().to_string(),
            order_id: order_id.to_string(),
            dish_id: line.dish.id.clone(),
            dish_name: line.dish.name.clone(),
            quantity: line.quantity,
            unit_price_cents: line.unit_price.cents(),
            line_total_cents: line.line_total.cents(),
        };

        sqlx::query(
            r#"
            INSERT INTO order_items (
                id, order_id, dish_id, dish_name, quantity,
                unit_price_cents, line_total_cents, position
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&item.id)
        .bind(&item.order_id)
        .bind(&item.dish_id)
        .bind(&item.dish_name)
        .bind(item.quantity)
        .bind(item.unit_price_cents)
        .bind(item.line_total_cents)
        .bind(position as i64)
        .execute(&mut *conn)
        .await?;

        let mut options = Vec::with_capacity(line.options.len());
        for selection in &line.options {
            let option = OrderItemOption {
                id: Uuid::new_v4().to_string(),
                order_item_id: item.id.clone(),
                selection_id: selection.id.clone(),
                option_name: selection.option_name.clone(),
                additional_price_cents: selection.additional_price_cents,
            };

            sqlx::query(
                r#"
                INSERT INTO order_item_options (
                    id, order_item_id, selection_id, option_name, additional_price_cents
                ) VALUES (?1, ?2, ?3, ?4, ?5)
                "#,
            )
            .bind(&option.id)
            .bind(&option.order_item_id)
            .bind(&option.selection_id)
            .bind(&option.option_name)
            .bind(option.additional_price_cents)
            .execute(&mut *conn)
            .await?;

            options.push(option);
        }

        Ok(OrderLine { item, options })
    }

    /// Records the coupon and overwrites discount and total.
    pub async fn apply_discount(
        conn: &mut SqliteConnection,
        order_id: &str,
        coupon_id: &str,
        discount_cents: i64,
        total_price_cents: i64,
    ) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE orders SET
                coupon_id = ?2,
                discount_cents = ?3,
                total_price_cents = ?4,
                updated_at = ?5
            WHERE id = ?1
            "#,
        )
        .bind(order_id)
        .bind(coupon_id)
        .bind(discount_cents)
        .bind(total_price_cents)
        .bind(Utc::now())
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Order", order_id));
        }

        Ok(())
    }

    // =========================================================================
    // Status
    // =========================================================================

    /// Moves an order from `from` to `to`. Fails with `Conflict` if the status
    /// changed since it was read.
    pub async fn update_status(
        &self,
        order_id: &str,
        from: OrderStatus,
        to: OrderStatus,
    ) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE orders SET
                status = ?3,
                updated_at = ?4
            WHERE id = ?1 AND status = ?2
            "#,
        )
        .bind(order_id)
        .bind(from)
        .bind(to)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::conflict("Order", order_id));
        }

        debug!(order_id = %order_id, from = %from, to = %to, "Order status updated");
        Ok(())
    }
}
