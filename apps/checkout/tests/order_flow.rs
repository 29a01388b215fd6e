//! End-to-end checkout tests against SQLite.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::NaiveDate;

use checkout::notify::{CONFIRMATION_SUBJECT, STATUS_UPDATE_SUBJECT};
use checkout::{
    ApiResult, CheckoutConfig, ErrorCode, OrderConfirmation, OrderService, RecordingNotifier,
};
use platter_core::{
    Address, CouponDraft, CreateOrderRequest, Dish, DishOptionSelection, Offer, OrderLineRequest,
    OrderStatus, Recipe, User, Warehouse,
};
use platter_db::{Database, DbConfig};

const PHO: &str = "d-pho";
const ROLLS: &str = "d-rolls";
const STEAK: &str = "d-steak";
const LARGE: &str = "opt-large";

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 15).unwrap()
}

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn dish(id: &str, name: &str, price_cents: i64) -> Dish {
    Dish {
        id: id.into(),
        name: name.into(),
        price_cents,
        offer_price_cents: None,
        category_id: None,
        thumb_image: Some(format!("https://img.example.com/{}.jpg", id)),
    }
}

fn warehouse(id: &str, name: &str, available: f64, unit: &str) -> Warehouse {
    Warehouse {
        id: id.into(),
        ingredient_name: name.into(),
        available_quantity: available,
        quantity_used: 0.0,
        unit: unit.into(),
        version: 0,
    }
}

fn recipe(id: &str, dish_id: &str, warehouse_id: &str, qty: f64, unit: &str) -> Recipe {
    Recipe {
        id: id.into(),
        dish_id: dish_id.into(),
        warehouse_id: warehouse_id.into(),
        quantity_used: qty,
        unit: unit.into(),
    }
}

/// Two customers, three dishes, a March offer on pho and the SPRING20 coupon.
async fn stock_restaurant(db: &Database, coupon_quantity: i64) -> String {
    for (user, address) in [("u1", "a1"), ("u2", "a2"), ("u3", "a3"), ("u4", "a4")] {
        db.customers()
            .insert_user(&User {
                id: user.into(),
                email: format!("{}@example.com", user),
                full_name: user.to_uppercase(),
            })
            .await
            .unwrap();
        db.customers()
            .insert_address(&Address {
                id: address.into(),
                user_id: user.into(),
                recipient_name: user.to_uppercase(),
                street: "1 Trang Tien".into(),
                phone: None,
            })
            .await
            .unwrap();
    }

    let catalog = db.catalog();
    catalog.insert_dish(&dish(PHO, "Pho Bo", 10_000)).await.unwrap();
    catalog.insert_dish(&dish(ROLLS, "Spring Rolls", 4_000)).await.unwrap();
    catalog.insert_dish(&dish(STEAK, "Steak Frites", 20_000)).await.unwrap();
    catalog
        .insert_option(&DishOptionSelection {
            id: LARGE.into(),
            dish_id: PHO.into(),
            option_name: "Large bowl".into(),
            additional_price_cents: 2_000,
        })
        .await
        .unwrap();
    catalog
        .insert_offer(&Offer {
            id: "offer-pho".into(),
            dish_id: PHO.into(),
            discount_bps: 1_000,
            start_date: day(2026, 3, 1),
            end_date: day(2026, 3, 31),
        })
        .await
        .unwrap();

    let warehouses = db.warehouses();
    warehouses.insert(&warehouse("w-beef", "Beef", 3.0, "KG")).await.unwrap();
    warehouses.insert(&warehouse("w-paper", "Rice paper", 100.0, "PIECE")).await.unwrap();

    catalog.insert_recipe(&recipe("r1", PHO, "w-beef", 500.0, "G")).await.unwrap();
    catalog.insert_recipe(&recipe("r2", STEAK, "w-beef", 1.0, "KG")).await.unwrap();
    catalog.insert_recipe(&recipe("r3", ROLLS, "w-paper", 2.0, "PIECE")).await.unwrap();

    db.coupons()
        .create(CouponDraft {
            code: "SPRING20".into(),
            description: None,
            discount_bps: 2_000,
            max_discount_cents: Some(1_500),
            min_order_value_cents: Some(5_000),
            max_usage: coupon_quantity,
            start_date: "2026-03-01".into(),
            expiration_date: "2026-03-31".into(),
            status: "ACTIVE".into(),
        })
        .await
        .unwrap()
        .id
}

fn test_config() -> CheckoutConfig {
    CheckoutConfig {
        retry_backoff_ms: 1,
        currency_label: "VND".into(),
        ..CheckoutConfig::default()
    }
}

async fn setup() -> (OrderService, RecordingNotifier, String) {
    let db = Database::new(DbConfig::in_memory()).await.unwrap();
    let coupon_id = stock_restaurant(&db, 5).await;
    let notifier = RecordingNotifier::new();
    let service = OrderService::new(db, Arc::new(notifier.clone()), test_config());
    (service, notifier, coupon_id)
}

fn line(dish_id: &str, quantity: i64) -> OrderLineRequest {
    OrderLineRequest {
        dish_id: dish_id.into(),
        quantity,
        selected_option_ids: Vec::new(),
    }
}

fn request(user: &str, items: Vec<OrderLineRequest>, shipping_cents: i64) -> CreateOrderRequest {
    CreateOrderRequest {
        user_id: user.into(),
        address_id: user.replace('u', "a"),
        items,
        shipping_fee_cents: shipping_cents,
        payment_method: "CASH".into(),
        note: None,
        coupon_id: None,
    }
}

async fn beef(service: &OrderService) -> Warehouse {
    service.db().warehouses().find("w-beef").await.unwrap().unwrap()
}

// =============================================================================
// Pricing and coupons
// =============================================================================

#[tokio::test]
async fn test_offer_price_plus_shipping() {
    let (service, notifier, _) = setup().await;

    let confirmation = service
        .create_order_on(request("u1", vec![line(PHO, 2)], 500), today())
        .await
        .unwrap();

    let order = &confirmation.details.order;
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.subtotal_cents, 18_500);
    assert_eq!(order.discount_cents, 0);
    assert_eq!(order.total_price_cents, 18_500);
    assert!(order.coupon_id.is_none());

    let item = &confirmation.details.lines[0].item;
    assert_eq!(item.dish_name, "Pho Bo");
    assert_eq!(item.unit_price_cents, 9_000);
    assert_eq!(item.line_total_cents, 18_000);

    let beef = beef(&service).await;
    assert_eq!(beef.available_quantity, 2.0);
    assert_eq!(beef.quantity_used, 1.0);

    assert!(confirmation.notification.sent);
    let sent = notifier.sent().await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "u1@example.com");
    assert_eq!(sent[0].subject, CONFIRMATION_SUBJECT);
    assert!(sent[0].html_body.contains("185.00 VND"));
}

#[tokio::test]
async fn test_coupon_discount_is_capped() {
    let (service, notifier, coupon_id) = setup().await;

    let mut req = request("u1", vec![line(PHO, 2)], 500);
    req.coupon_id = Some(coupon_id.clone());
    let confirmation = service.create_order_on(req, today()).await.unwrap();

    let details = &confirmation.details;
    assert_eq!(details.order.subtotal_cents, 18_500);
    assert_eq!(details.order.discount_cents, 1_500);
    assert_eq!(details.order.total_price_cents, 17_000);
    assert_eq!(details.order.coupon_id.as_deref(), Some(coupon_id.as_str()));
    assert_eq!(confirmation.coupon_code.as_deref(), Some("SPRING20"));

    // subtotal = Σ lines + shipping, total = subtotal − discount
    assert_eq!(
        details.items_total().cents() + details.order.shipping_fee_cents,
        details.order.subtotal_cents
    );
    assert_eq!(
        details.order.subtotal_cents - details.order.discount_cents,
        details.order.total_price_cents
    );

    let coupon = service.db().coupons().find(&coupon_id).await.unwrap().unwrap();
    assert_eq!(coupon.quantity, 4);
    let usages = service.db().coupons().usages_for_coupon(&coupon_id).await.unwrap();
    assert_eq!(usages.len(), 1);
    assert_eq!(usages[0].order_id.as_deref(), Some(details.order.id.as_str()));

    assert!(notifier.sent().await[0].html_body.contains("SPRING20"));
}

#[tokio::test]
async fn test_options_are_priced_and_snapshotted() {
    let (service, _, _) = setup().await;

    let mut pho = line(PHO, 1);
    pho.selected_option_ids = vec![LARGE.into()];
    let confirmation = service
        .create_order_on(request("u1", vec![pho, line(ROLLS, 3)], 0), today())
        .await
        .unwrap();

    let lines = &confirmation.details.lines;
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0].item.dish_id, PHO);
    assert_eq!(lines[0].item.line_total_cents, 11_000);
    assert_eq!(lines[0].options.len(), 1);
    assert_eq!(lines[0].options[0].option_name, "Large bowl");
    assert_eq!(lines[1].item.line_total_cents, 12_000);
    assert_eq!(confirmation.details.order.total_price_cents, 23_000);

    let paper = service.db().warehouses().find("w-paper").await.unwrap().unwrap();
    assert_eq!(paper.available_quantity, 94.0);
}

#[tokio::test]
async fn test_offer_outside_window_not_applied() {
    let (service, _, _) = setup().await;

    let confirmation = service
        .create_order_on(request("u1", vec![line(PHO, 1)], 0), day(2026, 4, 1))
        .await
        .unwrap();
    assert_eq!(confirmation.details.lines[0].item.unit_price_cents, 10_000);
}

#[tokio::test]
async fn test_same_coupon_twice_by_same_user() {
    let (service, _, coupon_id) = setup().await;

    let mut first = request("u1", vec![line(PHO, 2)], 500);
    first.coupon_id = Some(coupon_id.clone());
    service.create_order_on(first.clone(), today()).await.unwrap();

    let err = service.create_order_on(first, today()).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::CouponAlreadyUsed);

    let coupon = service.db().coupons().find(&coupon_id).await.unwrap().unwrap();
    assert_eq!(coupon.quantity, 4);
    // the second order's stock deduction was rolled back with it
    assert_eq!(beef(&service).await.available_quantity, 2.0);
    assert_eq!(service.db().orders().count().await.unwrap(), 1);
}

#[tokio::test]
async fn test_coupon_failure_rolls_back_order_and_stock() {
    let (service, notifier, coupon_id) = setup().await;

    let mut req = request("u1", vec![line(ROLLS, 1)], 0);
    req.coupon_id = Some(coupon_id.clone());
    let err = service.create_order_on(req, today()).await.unwrap_err();

    assert_eq!(err.code, ErrorCode::CouponMinimumNotMet);
    let paper = service.db().warehouses().find("w-paper").await.unwrap().unwrap();
    assert_eq!(paper.available_quantity, 100.0);
    assert_eq!(paper.version, 0);
    assert_eq!(service.db().orders().count().await.unwrap(), 0);
    assert_eq!(
        service.db().coupons().find(&coupon_id).await.unwrap().unwrap().quantity,
        5
    );
    assert!(notifier.sent().await.is_empty());
}

#[tokio::test]
async fn test_coupon_outside_validity_window() {
    let (service, _, coupon_id) = setup().await;

    let mut req = request("u1", vec![line(PHO, 1)], 0);
    req.coupon_id = Some(coupon_id.clone());
    let err = service
        .create_order_on(req.clone(), day(2026, 4, 1))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::CouponExpired);

    let err = service
        .create_order_on(req, day(2026, 2, 28))
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::CouponNotYetValid);
}

#[tokio::test]
async fn test_blank_coupon_id_is_ignored() {
    let (service, _, _) = setup().await;

    let mut req = request("u1", vec![line(PHO, 1)], 0);
    req.coupon_id = Some("   ".into());
    let confirmation = service.create_order_on(req, today()).await.unwrap();
    assert!(confirmation.coupon_code.is_none());
    assert_eq!(confirmation.details.order.discount_cents, 0);
}

#[tokio::test]
async fn test_check_coupon_usage() {
    let (service, _, coupon_id) = setup().await;

    let coupon = service.check_coupon_usage("SPRING20", "u1").await.unwrap();
    assert_eq!(coupon.id, coupon_id);

    let mut req = request("u1", vec![line(PHO, 2)], 0);
    req.coupon_id = Some(coupon_id);
    service.create_order_on(req, today()).await.unwrap();

    let err = service.check_coupon_usage("SPRING20", "u1").await.unwrap_err();
    assert_eq!(err.code, ErrorCode::CouponAlreadyUsed);
    assert!(service.check_coupon_usage("SPRING20", "u2").await.is_ok());
    assert_eq!(
        service.check_coupon_usage("NOPE", "u1").await.unwrap_err().code,
        ErrorCode::NotFound
    );
}

// =============================================================================
// Rejections leave no trace
// =============================================================================

#[tokio::test]
async fn test_zero_quantity_rejected_before_any_write() {
    let (service, notifier, _) = setup().await;

    let err = service
        .create_order_on(request("u1", vec![line(PHO, 1), line(PHO, 0)], 0), today())
        .await
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::InvalidQuantity);
    let beef = beef(&service).await;
    assert_eq!(beef.available_quantity, 3.0);
    assert_eq!(beef.version, 0);
    assert_eq!(service.db().orders().count().await.unwrap(), 0);
    assert!(notifier.sent().await.is_empty());
}

#[tokio::test]
async fn test_insufficient_stock_leaves_warehouse_untouched() {
    let (service, _, _) = setup().await;

    // pho is deducted first, then the steaks fail on the same warehouse
    let err = service
        .create_order_on(request("u1", vec![line(PHO, 2), line(STEAK, 5)], 0), today())
        .await
        .unwrap_err();

    assert_eq!(err.code, ErrorCode::InsufficientStock);
    assert!(err.message.contains("Steak Frites"));
    let beef = beef(&service).await;
    assert_eq!(beef.available_quantity, 3.0);
    assert_eq!(beef.quantity_used, 0.0);
    assert_eq!(service.db().orders().count().await.unwrap(), 0);
}

#[tokio::test]
async fn test_request_shape_validation() {
    let (service, _, _) = setup().await;

    let empty = request("u1", Vec::new(), 0);
    assert_eq!(
        service.create_order_on(empty, today()).await.unwrap_err().code,
        ErrorCode::ValidationError
    );

    let negative_fee = request("u1", vec![line(PHO, 1)], -1);
    assert_eq!(
        service.create_order_on(negative_fee, today()).await.unwrap_err().code,
        ErrorCode::ValidationError
    );

    let mut no_payment = request("u1", vec![line(PHO, 1)], 0);
    no_payment.payment_method = " ".into();
    assert_eq!(
        service.create_order_on(no_payment, today()).await.unwrap_err().code,
        ErrorCode::ValidationError
    );
}

#[tokio::test]
async fn test_unknown_references_are_not_found() {
    let (service, _, _) = setup().await;

    let ghost_user = request("u9", vec![line(PHO, 1)], 0);
    assert_eq!(
        service.create_order_on(ghost_user, today()).await.unwrap_err().code,
        ErrorCode::NotFound
    );

    let mut foreign_address = request("u1", vec![line(PHO, 1)], 0);
    foreign_address.address_id = "a2".into();
    assert_eq!(
        service.create_order_on(foreign_address, today()).await.unwrap_err().code,
        ErrorCode::NotFound
    );

    let ghost_dish = request("u1", vec![line("d-ghost", 1)], 0);
    assert_eq!(
        service.create_order_on(ghost_dish, today()).await.unwrap_err().code,
        ErrorCode::NotFound
    );

    let mut ghost_option = line(PHO, 1);
    ghost_option.selected_option_ids = vec!["opt-ghost".into()];
    let err = service
        .create_order_on(request("u1", vec![ghost_option], 0), today())
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::NotFound);

    let mut wrong_dish_option = line(ROLLS, 1);
    wrong_dish_option.selected_option_ids = vec![LARGE.into()];
    let err = service
        .create_order_on(request("u1", vec![wrong_dish_option], 0), today())
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::NotFound);

    let mut ghost_coupon = request("u1", vec![line(PHO, 1)], 0);
    ghost_coupon.coupon_id = Some("c-ghost".into());
    let err = service.create_order_on(ghost_coupon, today()).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::NotFound);

    assert_eq!(beef(&service).await.available_quantity, 3.0);
    assert_eq!(service.db().orders().count().await.unwrap(), 0);
}

// =============================================================================
// Notifications
// =============================================================================

#[tokio::test]
async fn test_notification_failure_keeps_order() {
    let (service, notifier, _) = setup().await;
    notifier.set_fail(true);

    let confirmation = service
        .create_order_on(request("u1", vec![line(PHO, 1)], 0), today())
        .await
        .unwrap();

    assert!(!confirmation.notification.sent);
    assert!(confirmation.notification.error.is_some());

    let stored = service.get_order(&confirmation.details.order.id).await.unwrap();
    assert_eq!(stored.order.total_price_cents, 9_000);
    assert_eq!(beef(&service).await.available_quantity, 2.5);
}

// =============================================================================
// Status lifecycle
// =============================================================================

#[tokio::test]
async fn test_status_lifecycle() {
    let (service, notifier, _) = setup().await;
    let order_id = service
        .create_order_on(request("u1", vec![line(PHO, 1)], 0), today())
        .await
        .unwrap()
        .details
        .order
        .id;

    let change = service.update_order_status(&order_id, "confirmed").await.unwrap();
    assert_eq!(change.previous, OrderStatus::Pending);
    assert_eq!(change.order.status, OrderStatus::Confirmed);
    assert!(change.notification.sent);

    let sent = notifier.sent().await;
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[1].subject, STATUS_UPDATE_SUBJECT);
    assert!(sent[1].html_body.contains("New Status: CONFIRMED"));

    let err = service.update_order_status(&order_id, "CONFIRMED").await.unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidStatusTransition);

    let err = service.update_order_status(&order_id, "pending").await.unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidStatusTransition);

    service.update_order_status(&order_id, " Shipping ").await.unwrap();
    service.update_order_status(&order_id, "DELIVERED").await.unwrap();

    let err = service.update_order_status(&order_id, "CANCELLED").await.unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidStatusTransition);

    let err = service.update_order_status(&order_id, "lost").await.unwrap_err();
    assert_eq!(err.code, ErrorCode::ValidationError);

    let err = service.update_order_status("ord-ghost", "PAID").await.unwrap_err();
    assert_eq!(err.code, ErrorCode::NotFound);

    let stored = service.get_order(&order_id).await.unwrap();
    assert_eq!(stored.order.status, OrderStatus::Delivered);
    assert_eq!(notifier.sent().await.len(), 4);
}

#[tokio::test]
async fn test_status_change_survives_notification_failure() {
    let (service, notifier, _) = setup().await;
    let order_id = service
        .create_order_on(request("u1", vec![line(PHO, 1)], 0), today())
        .await
        .unwrap()
        .details
        .order
        .id;

    notifier.set_fail(true);
    let change = service.update_order_status(&order_id, "CANCELLED").await.unwrap();
    assert!(!change.notification.sent);
    assert_eq!(
        service.get_order(&order_id).await.unwrap().order.status,
        OrderStatus::Cancelled
    );
}

// =============================================================================
// Reads
// =============================================================================

#[tokio::test]
async fn test_list_orders_pages() {
    let (service, _, _) = setup().await;
    for _ in 0..3 {
        service
            .create_order_on(request("u1", vec![line(ROLLS, 1)], 0), today())
            .await
            .unwrap();
    }

    let first = service.list_orders(1, 2).await.unwrap();
    assert_eq!(first.orders.len(), 2);
    assert_eq!(first.total, 3);

    let second = service.list_orders(2, 2).await.unwrap();
    assert_eq!(second.orders.len(), 1);
    assert!(first.orders.iter().all(|o| o.id != second.orders[0].id));

    assert_eq!(
        service.list_orders(0, 2).await.unwrap_err().code,
        ErrorCode::ValidationError
    );
}

#[tokio::test]
async fn test_get_unknown_order() {
    let (service, _, _) = setup().await;
    assert_eq!(
        service.get_order("ord-ghost").await.unwrap_err().code,
        ErrorCode::NotFound
    );
}

// =============================================================================
// Concurrency (file-backed, several pool connections)
// =============================================================================

struct TempDb {
    path: PathBuf,
}

impl TempDb {
    fn new() -> Self {
        let path = std::env::temp_dir().join(format!("platter-{}.db", uuid::Uuid::new_v4()));
        TempDb { path }
    }
}

impl Drop for TempDb {
    fn drop(&mut self) {
        for suffix in ["", "-wal", "-shm"] {
            let mut file = self.path.clone().into_os_string();
            file.push(suffix);
            let _ = std::fs::remove_file(file);
        }
    }
}

async fn concurrent_service(
    temp: &TempDb,
    coupon_quantity: i64,
    max_attempts: u32,
) -> (Arc<OrderService>, String) {
    let db = Database::new(DbConfig::new(temp.path.clone()).max_connections(4))
        .await
        .unwrap();
    let coupon_id = stock_restaurant(&db, coupon_quantity).await;
    let config = CheckoutConfig {
        max_attempts,
        ..test_config()
    };
    let service = OrderService::new(db, Arc::new(RecordingNotifier::new()), config);
    (Arc::new(service), coupon_id)
}

/// Places every request at once and collects the outcomes.
async fn place_all(
    service: &Arc<OrderService>,
    requests: Vec<CreateOrderRequest>,
) -> Vec<ApiResult<OrderConfirmation>> {
    let handles: Vec<_> = requests
        .into_iter()
        .map(|req| {
            let service = service.clone();
            tokio::spawn(async move { service.create_order_on(req, today()).await })
        })
        .collect();

    let mut results = Vec::new();
    for handle in handles {
        results.push(handle.await.unwrap());
    }
    results
}

fn with_coupon(mut req: CreateOrderRequest, coupon_id: &str) -> CreateOrderRequest {
    req.coupon_id = Some(coupon_id.to_string());
    req
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_redemptions_by_one_user() {
    let temp = TempDb::new();
    let (service, coupon_id) = concurrent_service(&temp, 5, 10).await;

    let requests = (0..4)
        .map(|_| with_coupon(request("u1", vec![line(ROLLS, 2)], 0), &coupon_id))
        .collect();

    let mut placed = 0;
    for result in place_all(&service, requests).await {
        match result {
            Ok(_) => placed += 1,
            Err(err) => assert_eq!(err.code, ErrorCode::CouponAlreadyUsed, "unexpected {:?}", err),
        }
    }

    assert_eq!(placed, 1);
    let coupons = service.db().coupons();
    let usages = coupons.usages_for_coupon(&coupon_id).await.unwrap();
    assert_eq!(usages.len(), 1);
    assert_eq!(coupons.find(&coupon_id).await.unwrap().unwrap().quantity, 4);
    assert_eq!(service.db().orders().count().await.unwrap(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_redemptions_never_overdraw() {
    let temp = TempDb::new();
    let (service, coupon_id) = concurrent_service(&temp, 2, 10).await;

    let requests = ["u1", "u2", "u3", "u4"]
        .into_iter()
        .map(|user| with_coupon(request(user, vec![line(ROLLS, 2)], 0), &coupon_id))
        .collect();

    let mut placed = 0;
    for result in place_all(&service, requests).await {
        match result {
            Ok(_) => placed += 1,
            Err(err) => assert_eq!(err.code, ErrorCode::CouponOutOfStock, "unexpected {:?}", err),
        }
    }

    assert_eq!(placed, 2);
    let coupon = service.db().coupons().find(&coupon_id).await.unwrap().unwrap();
    assert_eq!(coupon.quantity, 0);

    // every placed order took exactly its own rice paper
    let paper = service.db().warehouses().find("w-paper").await.unwrap().unwrap();
    assert_eq!(paper.available_quantity, 92.0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_deductions_respect_tight_stock() {
    let temp = TempDb::new();
    let (service, _) = concurrent_service(&temp, 5, 10).await;

    // 3 KG of beef, 1 KG per steak
    let requests = ["u1", "u2", "u3", "u4"]
        .into_iter()
        .map(|user| request(user, vec![line(STEAK, 1)], 0))
        .collect();

    let mut placed = 0;
    let mut short = 0;
    for result in place_all(&service, requests).await {
        match result {
            Ok(_) => placed += 1,
            Err(err) => {
                assert_eq!(err.code, ErrorCode::InsufficientStock, "unexpected {:?}", err);
                short += 1;
            }
        }
    }

    assert_eq!(placed, 3);
    assert_eq!(short, 1);
    let beef = beef(&service).await;
    assert_eq!(beef.available_quantity, 0.0);
    assert_eq!(beef.quantity_used, 3.0);
    assert_eq!(service.db().orders().count().await.unwrap(), 3);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_contended_orders_are_retried() {
    let temp = TempDb::new();
    let (service, _) = concurrent_service(&temp, 5, 10).await;

    let requests = ["u1", "u2", "u3", "u4"]
        .into_iter()
        .map(|user| request(user, vec![line(ROLLS, 1)], 0))
        .collect();

    let confirmations: Vec<_> = place_all(&service, requests)
        .await
        .into_iter()
        .map(|result| result.unwrap())
        .collect();

    assert!(confirmations.iter().all(|c| c.attempts <= 10));
    assert!(
        confirmations.iter().any(|c| c.attempts > 1),
        "no order needed a retry: {:?}",
        confirmations.iter().map(|c| c.attempts).collect::<Vec<_>>()
    );
    let paper = service.db().warehouses().find("w-paper").await.unwrap().unwrap();
    assert_eq!(paper.available_quantity, 92.0);
    assert_eq!(service.db().orders().count().await.unwrap(), 4);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_single_attempt_surfaces_conflict() {
    let temp = TempDb::new();
    let (service, _) = concurrent_service(&temp, 5, 1).await;

    let requests = ["u1", "u2", "u3", "u4"]
        .into_iter()
        .map(|user| request(user, vec![line(ROLLS, 1)], 0))
        .collect();

    let results = place_all(&service, requests).await;
    let placed = results.iter().filter(|r| r.is_ok()).count();
    let conflicts = results
        .iter()
        .filter(|r| matches!(r, Err(err) if err.code == ErrorCode::Conflict))
        .count();

    assert!(placed >= 1);
    assert!(conflicts >= 1);
    assert_eq!(placed + conflicts, 4);
    for confirmation in results.iter().flatten() {
        assert_eq!(confirmation.attempts, 1);
    }

    // losers left nothing behind
    let paper = service.db().warehouses().find("w-paper").await.unwrap().unwrap();
    assert_eq!(paper.available_quantity, 100.0 - placed as f64);
    assert_eq!(service.db().orders().count().await.unwrap(), placed as i64);
}
