//! # Order Service
//!
//! Turns a checkout request into a committed order.
//!
//! ## Checkout Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  validate_order_request()            no database access on failure      │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  ┌── attempt 1..=max_attempts ───────────────────────────────────────┐  │
//! │  │  BEGIN                                                            │  │
//! │  │   ├── user, address                           NotFound            │  │
//! │  │   ├── per line: dish, options, stock deduction InsufficientStock  │  │
//! │  │   ├── price lines at `today`, insert order PENDING                │  │
//! │  │   ├── insert item + option snapshots                              │  │
//! │  │   └── coupon? redeem + overwrite discount/total  Coupon*          │  │
//! │  │  COMMIT                                                           │  │
//! │  │  Conflict ──► sleep(n × backoff) ──► next attempt                 │  │
//! │  └───────────────────────────────────────────────────────────────────┘  │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  confirmation email (failure logged, order stands)                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Any error inside the attempt drops the transaction, which rolls back stock,
//! coupon and order rows together.

use std::sync::Arc;

use chrono::{Local, NaiveDate, Utc};
use serde::Serialize;
use tokio::time::sleep;
use tracing::{debug, info, warn};
use ts_rs::TS;
use uuid::Uuid;

use crate::config::CheckoutConfig;
use crate::error::{ApiError, ApiResult};
use crate::notify::{
    render_confirmation, render_status_update, ConfirmationEmail, Notifier,
    CONFIRMATION_SUBJECT, STATUS_UPDATE_SUBJECT,
};
use platter_core::pricing::{order_subtotal, PricedLine};
use platter_core::validation::validate_order_request;
use platter_core::{
    CoreError, Coupon, CreateOrderRequest, Money, Order, OrderDetails, OrderStatus,
};
use platter_db::{
    CatalogRepository, CouponRedemption, CustomerRepository, Database, DbResult,
    InventoryLedger, OrderRepository,
};

/// Whether the customer email went out.
#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct NotificationOutcome {
    pub sent: bool,
    pub error: Option<String>,
}

/// Result of a successful checkout.
#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct OrderConfirmation {
    pub details: OrderDetails,
    pub coupon_code: Option<String>,
    /// Transaction attempts used, 1 when nothing conflicted.
    pub attempts: u32,
    pub notification: NotificationOutcome,
}

/// Result of an admin status change.
#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct StatusChange {
    pub order: Order,
    pub previous: OrderStatus,
    pub notification: NotificationOutcome,
}

/// One page of orders, newest first.
#[derive(Debug, Clone, Serialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct OrderPage {
    pub orders: Vec<Order>,
    pub page: u32,
    pub page_size: u32,
    pub total: i64,
}

/// What a committed attempt hands to the notification step.
struct PlacedOrder {
    order: Order,
    email: String,
    lines: Vec<PricedLine>,
    coupon_code: Option<String>,
}

pub struct OrderService {
    db: Database,
    notifier: Arc<dyn Notifier>,
    config: CheckoutConfig,
}

impl OrderService {
    pub fn new(db: Database, notifier: Arc<dyn Notifier>, config: CheckoutConfig) -> Self {
        OrderService {
            db,
            notifier,
            config,
        }
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn config(&self) -> &CheckoutConfig {
        &self.config
    }

    // =========================================================================
    // Checkout
    // =========================================================================

    /// Places an order priced at today's local date.
    pub async fn create_order(&self, request: CreateOrderRequest) -> ApiResult<OrderConfirmation> {
        self.create_order_on(request, Local::now().date_naive()).await
    }

    /// Places an order priced at `today`.
    pub async fn create_order_on(
        &self,
        request: CreateOrderRequest,
        today: NaiveDate,
    ) -> ApiResult<OrderConfirmation> {
        validate_order_request(&request)?;

        let mut attempt = 0;
        let placed = loop {
            attempt += 1;
            match self.place_once(&request, today).await {
                Ok(placed) => break placed,
                Err(err) if err.is_retryable() && attempt < self.config.max_attempts => {
                    let wait = self.config.backoff(attempt);
                    warn!(
                        attempt,
                        max_attempts = self.config.max_attempts,
                        wait_ms = wait.as_millis() as u64,
                        error = %err,
                        "Order transaction conflicted, retrying"
                    );
                    sleep(wait).await;
                }
                Err(err) => return Err(err.into()),
            }
        };

        info!(
            order_id = %placed.order.id,
            user_id = %placed.order.user_id,
            subtotal = placed.order.subtotal_cents,
            discount = placed.order.discount_cents,
            total = placed.order.total_price_cents,
            attempts = attempt,
            "Order placed"
        );

        let html = render_confirmation(
            &ConfirmationEmail {
                lines: &placed.lines,
                coupon_code: placed.coupon_code.as_deref(),
                payment_method: &placed.order.payment_method,
                status: placed.order.status,
                shipping_fee: placed.order.shipping_fee(),
                total: placed.order.total_price(),
            },
            &self.config.currency_label,
        );
        let notification = self
            .deliver(&placed.order.id, &placed.email, CONFIRMATION_SUBJECT, &html)
            .await;

        let details = self
            .db
            .orders()
            .get_details(&placed.order.id)
            .await?
            .ok_or_else(|| ApiError::internal("Committed order could not be read back"))?;

        Ok(OrderConfirmation {
            details,
            coupon_code: placed.coupon_code,
            attempts: attempt,
            notification,
        })
    }

    /// One attempt of the order transaction. Dropping `tx` on any `?` rolls
    /// everything back.
    async fn place_once(
        &self,
        request: &CreateOrderRequest,
        today: NaiveDate,
    ) -> DbResult<PlacedOrder> {
        let mut tx = self.db.begin().await?;

        let user = CustomerRepository::fetch_user(&mut *tx, &request.user_id)
            .await?
            .ok_or_else(|| CoreError::not_found("User", &request.user_id))?;
        let address = CustomerRepository::fetch_address(&mut *tx, &request.address_id)
            .await?
            .filter(|a| a.user_id == user.id)
            .ok_or_else(|| CoreError::not_found("Address", &request.address_id))?;

        let mut lines = Vec::with_capacity(request.items.len());
        for item in &request.items {
            let dish = CatalogRepository::fetch_dish(&mut *tx, &item.dish_id)
                .await?
                .ok_or_else(|| CoreError::not_found("Dish", &item.dish_id))?;

            let mut options = Vec::with_capacity(item.selected_option_ids.len());
            for option_id in &item.selected_option_ids {
                let option = CatalogRepository::fetch_option(&mut *tx, option_id)
                    .await?
                    .ok_or_else(|| CoreError::not_found("DishOptionSelection", option_id))?;
                options.push(option);
            }

            InventoryLedger::deduct_dish(&mut tx, &dish, item.quantity).await?;

            let offers = CatalogRepository::fetch_offers(&mut *tx, &dish.id).await?;
            lines.push(PricedLine::new(dish, item.quantity, options, &offers, today)?);
        }

        let shipping_fee = Money::from_cents(request.shipping_fee_cents);
        let subtotal = order_subtotal(&lines, shipping_fee);
        let now = Utc::now();
        let mut order = Order {
            id: Uuid::new_v4().to_string(),
            user_id: user.id.clone(),
            address_id: address.id.clone(),
            status: OrderStatus::Pending,
            note: request.note.clone(),
            payment_method: request.payment_method.trim().to_string(),
            shipping_fee_cents: shipping_fee.cents(),
            subtotal_cents: subtotal.cents(),
            discount_cents: 0,
            total_price_cents: subtotal.cents(),
            coupon_id: None,
            created_at: now,
            updated_at: now,
        };
        OrderRepository::insert_order(&mut tx, &order).await?;

        for (position, line) in lines.iter().enumerate() {
            OrderRepository::insert_line(&mut tx, &order.id, position, line).await?;
        }

        let mut coupon_code = None;
        if let Some(coupon_id) = request.coupon() {
            let redemption = CouponRedemption::redeem(
                &mut tx,
                coupon_id,
                &user.id,
                Some(&order.id),
                subtotal,
                today,
            )
            .await?;

            OrderRepository::apply_discount(
                &mut tx,
                &order.id,
                &redemption.coupon.id,
                redemption.discount.cents(),
                redemption.total.cents(),
            )
            .await?;

            order.coupon_id = Some(redemption.coupon.id.clone());
            order.discount_cents = redemption.discount.cents();
            order.total_price_cents = redemption.total.cents();
            coupon_code = Some(redemption.coupon.code);
        }

        tx.commit().await?;
        debug!(order_id = %order.id, lines = lines.len(), "Order transaction committed");

        Ok(PlacedOrder {
            order,
            email: user.email,
            lines,
            coupon_code,
        })
    }

    // =========================================================================
    // Status
    // =========================================================================

    /// Applies an admin status change and emails the customer.
    ///
    /// `status` is free text (`"shipping"`, `" PAID "`); it must name a status
    /// reachable from the current one.
    pub async fn update_order_status(&self, order_id: &str, status: &str) -> ApiResult<StatusChange> {
        let next = status.parse::<OrderStatus>().map_err(CoreError::from)?;

        let orders = self.db.orders();
        let current = orders
            .find(order_id)
            .await?
            .ok_or_else(|| ApiError::not_found("Order", order_id))?;

        current.status.transition_to(next)?;
        orders.update_status(order_id, current.status, next).await?;

        let order = orders
            .find(order_id)
            .await?
            .ok_or_else(|| ApiError::not_found("Order", order_id))?;
        info!(order_id = %order_id, from = %current.status, to = %next, "Order status changed");

        let notification = match self.db.customers().find_user(&order.user_id).await? {
            Some(user) => {
                let html = render_status_update(order_id, next);
                self.deliver(order_id, &user.email, STATUS_UPDATE_SUBJECT, &html)
                    .await
            }
            None => {
                warn!(order_id = %order_id, user_id = %order.user_id, "Order owner missing, status email skipped");
                NotificationOutcome {
                    sent: false,
                    error: Some(format!("User not found: {}", order.user_id)),
                }
            }
        };

        Ok(StatusChange {
            order,
            previous: current.status,
            notification,
        })
    }

    // =========================================================================
    // Reads
    // =========================================================================

    pub async fn get_order(&self, order_id: &str) -> ApiResult<OrderDetails> {
        self.db
            .orders()
            .get_details(order_id)
            .await?
            .ok_or_else(|| ApiError::not_found("Order", order_id))
    }

    /// `page` starts at 1.
    pub async fn list_orders(&self, page: u32, page_size: u32) -> ApiResult<OrderPage> {
        if page == 0 || page_size == 0 || page_size > 100 {
            return Err(ApiError::validation(
                "page must be at least 1 and page size between 1 and 100",
            ));
        }

        let orders = self.db.orders();
        let offset = (page - 1).saturating_mul(page_size);
        Ok(OrderPage {
            orders: orders.list(page_size, offset).await?,
            page,
            page_size,
            total: orders.count().await?,
        })
    }

    /// The coupon behind `code`, if `user_id` has not used it yet.
    pub async fn check_coupon_usage(&self, code: &str, user_id: &str) -> ApiResult<Coupon> {
        let coupon = CouponRedemption::check_usage(&self.db.coupons(), code.trim(), user_id).await?;
        Ok(coupon)
    }

    // =========================================================================
    // Notification
    // =========================================================================

    async fn deliver(&self, order_id: &str, to: &str, subject: &str, html: &str) -> NotificationOutcome {
        match self.notifier.send(to, subject, html).await {
            Ok(()) => NotificationOutcome {
                sent: true,
                error: None,
            },
            Err(e) => {
                warn!(order_id = %order_id, to = %to, error = %e, "Notification failed, order kept");
                NotificationOutcome {
                    sent: false,
                    error: Some(e.to_string()),
                }
            }
        }
    }
}
