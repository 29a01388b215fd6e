//! # Demo Data
//!
//! A small restaurant: one customer, a handful of dishes with options,
//! a dated offer, stocked ingredients and one welcome coupon. Used by the
//! `seed` binary and the checkout demo runner.

use chrono::{Duration, NaiveDate};
use tracing::info;

use crate::error::DbResult;
use crate::pool::Database;
use platter_core::{
    Address, CouponDraft, Dish, DishOptionSelection, Offer, Recipe, User, Warehouse, DATE_FORMAT,
};

pub const DEMO_USER_ID: &str = "demo-user";
pub const DEMO_ADDRESS_ID: &str = "demo-address";
pub const DEMO_COUPON_CODE: &str = "WELCOME20";

pub const PHO_BO: &str = "dish-pho-bo";
pub const BUN_CHA: &str = "dish-bun-cha";
pub const SPRING_ROLLS: &str = "dish-spring-rolls";
pub const ICED_COFFEE: &str = "dish-iced-coffee";

pub const OPTION_LARGE_BOWL: &str = "opt-pho-large";
pub const OPTION_EXTRA_BEEF: &str = "opt-pho-extra-beef";

/// (id, name, price_cents, offer_price_cents, image)
const DISHES: &[(&str, &str, i64, Option<i64>, &str)] = &[
    (PHO_BO, "Pho Bo", 10_000, None, "pho-bo.jpg"),
    (BUN_CHA, "Bun Cha", 8_500, Some(7_900), "bun-cha.jpg"),
    (SPRING_ROLLS, "Spring Rolls", 4_500, None, "spring-rolls.jpg"),
    (ICED_COFFEE, "Ca Phe Sua Da", 3_000, None, "ca-phe.jpg"),
];

/// (id, ingredient, available, unit)
const WAREHOUSES: &[(&str, &str, f64, &str)] = &[
    ("wh-beef", "Beef", 5.0, "KG"),
    ("wh-pork", "Pork", 4.0, "KG"),
    ("wh-noodles", "Rice noodles", 10.0, "KG"),
    ("wh-broth", "Beef broth", 20.0, "L"),
    ("wh-wrappers", "Rice paper", 200.0, "PIECE"),
    ("wh-coffee", "Ground coffee", 1_000.0, "G"),
    ("wh-milk", "Condensed milk", 2.0, "L"),
];

/// (dish, warehouse, quantity per portion, unit)
const RECIPES: &[(&str, &str, f64, &str)] = &[
    (PHO_BO, "wh-beef", 150.0, "G"),
    (PHO_BO, "wh-noodles", 200.0, "G"),
    (PHO_BO, "wh-broth", 500.0, "ML"),
    (BUN_CHA, "wh-pork", 180.0, "G"),
    (BUN_CHA, "wh-noodles", 150.0, "G"),
    (SPRING_ROLLS, "wh-wrappers", 4.0, "PIECE"),
    (SPRING_ROLLS, "wh-pork", 60.0, "G"),
    (ICED_COFFEE, "wh-coffee", 25.0, "G"),
    (ICED_COFFEE, "wh-milk", 30.0, "ML"),
];

/// Seeds the demo restaurant. Returns `false` without writing anything if
/// the demo customer already exists.
///
/// `today` anchors the offer and coupon windows.
pub async fn seed_demo_data(db: &Database, today: NaiveDate) -> DbResult<bool> {
    if db.customers().find_user(DEMO_USER_ID).await?.is_some() {
        info!("Demo data already present");
        return Ok(false);
    }

    db.customers()
        .insert_user(&User {
            id: DEMO_USER_ID.to_string(),
            email: "diner@example.com".to_string(),
            full_name: "Demo Diner".to_string(),
        })
        .await?;
    db.customers()
        .insert_address(&Address {
            id: DEMO_ADDRESS_ID.to_string(),
            user_id: DEMO_USER_ID.to_string(),
            recipient_name: "Demo Diner".to_string(),
            street: "36 Hang Bac, Hoan Kiem".to_string(),
            phone: Some("+84 900 000 000".to_string()),
        })
        .await?;

    let catalog = db.catalog();
    for (id, name, price, offer_price, image) in DISHES {
        catalog
            .insert_dish(&Dish {
                id: id.to_string(),
                name: name.to_string(),
                price_cents: *price,
                offer_price_cents: *offer_price,
                category_id: None,
                thumb_image: Some(format!("https://img.example.com/{}", image)),
            })
            .await?;
    }

    for (id, dish_id, name, extra) in [
        (OPTION_LARGE_BOWL, PHO_BO, "Large bowl", 2_000),
        (OPTION_EXTRA_BEEF, PHO_BO, "Extra beef", 3_500),
    ] {
        catalog
            .insert_option(&DishOptionSelection {
                id: id.to_string(),
                dish_id: dish_id.to_string(),
                option_name: name.to_string(),
                additional_price_cents: extra,
            })
            .await?;
    }

    catalog
        .insert_offer(&Offer {
            id: "offer-pho-week".to_string(),
            dish_id: PHO_BO.to_string(),
            discount_bps: 1_000,
            start_date: today - Duration::days(1),
            end_date: today + Duration::days(6),
        })
        .await?;

    for (id, ingredient, available, unit) in WAREHOUSES {
        db.warehouses()
            .insert(&Warehouse {
                id: id.to_string(),
                ingredient_name: ingredient.to_string(),
                available_quantity: *available,
                quantity_used: 0.0,
                unit: unit.to_string(),
                version: 0,
            })
            .await?;
    }

    for (idx, (dish_id, warehouse_id, quantity, unit)) in RECIPES.iter().enumerate() {
        catalog
            .insert_recipe(&Recipe {
                id: format!("recipe-{:02}", idx + 1),
                dish_id: dish_id.to_string(),
                warehouse_id: warehouse_id.to_string(),
                quantity_used: *quantity,
                unit: unit.to_string(),
            })
            .await?;
    }

    db.coupons()
        .create(CouponDraft {
            code: DEMO_COUPON_CODE.to_string(),
            description: Some("20% off your first order, up to 15.00".to_string()),
            discount_bps: 2_000,
            max_discount_cents: Some(1_500),
            min_order_value_cents: Some(5_000),
            max_usage: 100,
            start_date: (today - Duration::days(30)).format(DATE_FORMAT).to_string(),
            expiration_date: (today + Duration::days(30)).format(DATE_FORMAT).to_string(),
            status: "ACTIVE".to_string(),
        })
        .await?;

    info!(
        dishes = DISHES.len(),
        warehouses = WAREHOUSES.len(),
        recipes = RECIPES.len(),
        "Demo data seeded"
    );
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DbConfig;

    #[tokio::test]
    async fn test_seed_is_idempotent() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let today = NaiveDate::from_ymd_opt(2026, 3, 15).unwrap();

        assert!(seed_demo_data(&db, today).await.unwrap());
        assert!(!seed_demo_data(&db, today).await.unwrap());

        assert_eq!(db.catalog().list_dishes().await.unwrap().len(), DISHES.len());
        assert_eq!(db.warehouses().list().await.unwrap().len(), WAREHOUSES.len());
        assert!(db.coupons().find_by_code(DEMO_COUPON_CODE).await.unwrap().is_some());
    }
}
