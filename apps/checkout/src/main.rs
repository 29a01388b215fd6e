//! # Platter Checkout Demo
//!
//! Seeds the demo restaurant and walks one order through its lifecycle.
//!
//! ## Usage
//! ```bash
//! # In-memory database, log notifier
//! cargo run -p checkout
//!
//! # Persist to a file and use a different currency label
//! PLATTER_DATABASE_PATH=./platter_dev.db PLATTER_CURRENCY_LABEL=USD cargo run -p checkout
//! ```

use std::sync::Arc;

use chrono::Local;
use tracing::info;

use checkout::{db_config, init_tracing, CheckoutConfig, LogNotifier, OrderService};
use platter_core::{CreateOrderRequest, Money, OrderLineRequest};
use platter_db::demo::{
    seed_demo_data, BUN_CHA, DEMO_ADDRESS_ID, DEMO_COUPON_CODE, DEMO_USER_ID, ICED_COFFEE,
    OPTION_LARGE_BOWL, PHO_BO,
};
use platter_db::Database;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    info!("Starting Platter checkout demo...");

    let config = CheckoutConfig::load()?;
    info!(
        database = ?config.database_path,
        max_attempts = config.max_attempts,
        currency = %config.currency_label,
        "Configuration loaded"
    );

    let db = Database::new(db_config(&config)).await?;
    let today = Local::now().date_naive();
    seed_demo_data(&db, today).await?;

    let notifier = Arc::new(LogNotifier::new(&config));
    let service = OrderService::new(db, notifier, config);

    // a reused database file has already spent the welcome coupon
    let coupon_id = match service.check_coupon_usage(DEMO_COUPON_CODE, DEMO_USER_ID).await {
        Ok(coupon) => Some(coupon.id),
        Err(err) => {
            info!(error = %err, "Ordering without coupon");
            None
        }
    };

    let request = CreateOrderRequest {
        user_id: DEMO_USER_ID.to_string(),
        address_id: DEMO_ADDRESS_ID.to_string(),
        items: vec![
            OrderLineRequest {
                dish_id: PHO_BO.to_string(),
                quantity: 2,
                selected_option_ids: vec![OPTION_LARGE_BOWL.to_string()],
            },
            OrderLineRequest {
                dish_id: BUN_CHA.to_string(),
                quantity: 1,
                selected_option_ids: Vec::new(),
            },
            OrderLineRequest {
                dish_id: ICED_COFFEE.to_string(),
                quantity: 2,
                selected_option_ids: Vec::new(),
            },
        ],
        shipping_fee_cents: 1_500,
        payment_method: "CASH".to_string(),
        note: Some("Extra herbs please".to_string()),
        coupon_id,
    };

    let confirmation = service.create_order(request).await?;
    let order = &confirmation.details.order;

    println!();
    println!("Order {}", order.id);
    for line in &confirmation.details.lines {
        println!(
            "  {:>2} × {:<16} {:>10}",
            line.item.quantity,
            line.item.dish_name,
            line.item.line_total()
        );
        for option in &line.options {
            println!("       + {}", option.option_name);
        }
    }
    println!("  Shipping              {:>10}", order.shipping_fee());
    println!("  Subtotal              {:>10}", order.subtotal());
    println!(
        "  Coupon {:<14} {:>10}",
        confirmation.coupon_code.as_deref().unwrap_or("-"),
        format!("-{}", Money::from_cents(order.discount_cents))
    );
    println!("  Total                 {:>10}", order.total_price());
    println!("  Email sent: {}", confirmation.notification.sent);

    let change = service.update_order_status(&order.id, "confirmed").await?;
    println!();
    println!("Status {} → {}", change.previous, change.order.status);

    let again = CreateOrderRequest {
        user_id: DEMO_USER_ID.to_string(),
        address_id: DEMO_ADDRESS_ID.to_string(),
        items: vec![OrderLineRequest {
            dish_id: ICED_COFFEE.to_string(),
            quantity: 1,
            selected_option_ids: Vec::new(),
        }],
        shipping_fee_cents: 0,
        payment_method: "CASH".to_string(),
        note: None,
        coupon_id: order.coupon_id.clone(),
    };
    if let Err(err) = service.create_order_on(again, today).await {
        println!("Second use of {} rejected: {}", DEMO_COUPON_CODE, err);
    }

    println!();
    for warehouse in service.db().warehouses().list().await? {
        println!(
            "  {:<16} {:>8.3} {}",
            warehouse.ingredient_name, warehouse.available_quantity, warehouse.unit
        );
    }

    service.db().close().await;
    Ok(())
}
