//! # Inventory Ledger
//!
//! Draws ingredient stock down for the dishes of an order. Runs on the
//! connection of an open transaction; the caller commits or drops it.
//!
//! ## Flow per Dish
//! ```text
//! recipes_for(dish) ──► for each recipe:
//!                           fetch warehouse row (sees earlier writes of this tx)
//!                           plan_deduction()   ── InsufficientStock / IncompatibleUnits
//!                           apply_deduction()  ── Conflict on a stale version
//! ```
//! Two lines that share an ingredient read the row after the first line's
//! write, so the second plan is made against the reduced stock.

use sqlx::SqliteConnection;
use tracing::{debug, info};

use crate::error::DbResult;
use crate::repository::catalog::CatalogRepository;
use crate::repository::warehouse::WarehouseRepository;
use platter_core::inventory::{plan_deduction, Deduction};
use platter_core::{CoreError, Dish};

pub struct InventoryLedger;

impl InventoryLedger {
    /// Deducts every recipe ingredient of `dish` for `quantity` portions.
    pub async fn deduct_dish(
        conn: &mut SqliteConnection,
        dish: &Dish,
        quantity: i64,
    ) -> DbResult<Vec<Deduction>> {
        let recipes = CatalogRepository::fetch_recipes(&mut *conn, &dish.id).await?;
        let mut applied = Vec::with_capacity(recipes.len());

        for recipe in &recipes {
            let warehouse = WarehouseRepository::fetch(&mut *conn, &recipe.warehouse_id)
                .await?
                .ok_or_else(|| CoreError::not_found("Warehouse", &recipe.warehouse_id))?;

            let plan = plan_deduction(&dish.name, recipe, &warehouse, quantity)?;
            WarehouseRepository::apply_deduction(&mut *conn, &plan).await?;

            debug!(
                dish = %dish.name,
                ingredient = %warehouse.ingredient_name,
                required = plan.required,
                remaining = plan.new_available,
                "Stock deducted"
            );
            applied.push(plan);
        }

        Ok(applied)
    }

    /// Deducts stock for all lines of an order, stopping at the first failure.
    pub async fn deduct_order(
        conn: &mut SqliteConnection,
        lines: &[(&Dish, i64)],
    ) -> DbResult<Vec<Deduction>> {
        let mut applied = Vec::new();
        for (dish, quantity) in lines {
            applied.extend(Self::deduct_dish(&mut *conn, dish, *quantity).await?);
        }

        info!(lines = lines.len(), writes = applied.len(), "Order stock deducted");
        Ok(applied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig, DbError};
    use platter_core::{Recipe, Warehouse};

    fn dish(id: &str, name: &str) -> Dish {
        Dish {
            id: id.into(),
            name: name.into(),
            price_cents: 5_000,
            offer_price_cents: None,
            category_id: None,
            thumb_image: None,
        }
    }

    async fn setup() -> Database {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let catalog = db.catalog();
        catalog.insert_dish(&dish("d-pho", "Pho Bo")).await.unwrap();
        catalog.insert_dish(&dish("d-bun", "Bun Bo")).await.unwrap();

        db.warehouses()
            .insert(&Warehouse {
                id: "w-beef".into(),
                ingredient_name: "Beef".into(),
                available_quantity: 1.0,
                quantity_used: 0.0,
                unit: "KG".into(),
                version: 0,
            })
            .await
            .unwrap();

        for (id, dish_id) in [("r-pho", "d-pho"), ("r-bun", "d-bun")] {
            catalog
                .insert_recipe(&Recipe {
                    id: id.into(),
                    dish_id: dish_id.into(),
                    warehouse_id: "w-beef".into(),
                    quantity_used: 200.0,
                    unit: "G".into(),
                })
                .await
                .unwrap();
        }
        db
    }

    #[tokio::test]
    async fn test_shared_ingredient_accumulates() {
        let db = setup().await;
        let pho = dish("d-pho", "Pho Bo");
        let bun = dish("d-bun", "Bun Bo");

        let mut tx = db.begin().await.unwrap();
        let applied = InventoryLedger::deduct_order(&mut tx, &[(&pho, 2), (&bun, 3)])
            .await
            .unwrap();
        tx.commit().await.unwrap();

        assert_eq!(applied.len(), 2);
        let beef = db.warehouses().find("w-beef").await.unwrap().unwrap();
        assert_eq!(beef.available_quantity, 0.0);
        assert_eq!(beef.quantity_used, 1.0);
        assert_eq!(beef.version, 2);
    }

    #[tokio::test]
    async fn test_failure_rolls_back_earlier_lines() {
        let db = setup().await;
        let pho = dish("d-pho", "Pho Bo");
        let bun = dish("d-bun", "Bun Bo");

        let mut tx = db.begin().await.unwrap();
        let err = InventoryLedger::deduct_order(&mut tx, &[(&pho, 2), (&bun, 4)])
            .await
            .unwrap_err();
        drop(tx);

        match err {
            DbError::Domain(CoreError::InsufficientStock { dish, .. }) => assert_eq!(dish, "Bun Bo"),
            other => panic!("unexpected {:?}", other),
        }
        let beef = db.warehouses().find("w-beef").await.unwrap().unwrap();
        assert_eq!(beef.available_quantity, 1.0);
        assert_eq!(beef.version, 0);
    }

    #[tokio::test]
    async fn test_missing_warehouse_is_not_found() {
        let db = setup().await;
        db.catalog()
            .insert_recipe(&Recipe {
                id: "r-ghost".into(),
                dish_id: "d-pho".into(),
                warehouse_id: "w-ghost".into(),
                quantity_used: 1.0,
                unit: "PIECE".into(),
            })
            .await
            .unwrap();
        let pho = dish("d-pho", "Pho Bo");

        let mut tx = db.begin().await.unwrap();
        let err = InventoryLedger::deduct_dish(&mut tx, &pho, 1).await.unwrap_err();
        assert!(matches!(err, DbError::Domain(CoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_dish_without_recipe_deducts_nothing() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let plain = dish("d-tea", "Tra Da");
        let mut tx = db.begin().await.unwrap();
        let applied = InventoryLedger::deduct_dish(&mut tx, &plain, 5).await.unwrap();
        assert!(applied.is_empty());
    }
}
