//! # Catalog Repository
//!
//! Dishes, dish option selections, dated offers and recipes.
//!
//! Catalog rows are read-only from the checkout's point of view; pricing
//! snapshots are copied onto order items, so later edits here never change
//! a placed order.

use sqlx::{SqliteExecutor, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use platter_core::{Dish, DishOptionSelection, Offer, Recipe};

const DISH_COLUMNS: &str =
    "id, name, price_cents, offer_price_cents, category_id, thumb_image";

/// Repository for catalog reads (and inserts used by seeding).
#[derive(Debug, Clone)]
pub struct CatalogRepository {
    pool: SqlitePool,
}

impl CatalogRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CatalogRepository { pool }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    pub async fn find_dish(&self, id: &str) -> DbResult<Option<Dish>> {
        Self::fetch_dish(&self.pool, id).await
    }

    pub async fn list_dishes(&self) -> DbResult<Vec<Dish>> {
        let dishes = sqlx::query_as::<_, Dish>(&format!(
            "SELECT {} FROM dishes ORDER BY name",
            DISH_COLUMNS
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(dishes)
    }

    pub async fn find_option(&self, id: &str) -> DbResult<Option<DishOptionSelection>> {
        Self::fetch_option(&self.pool, id).await
    }

    pub async fn offers_for_dish(&self, dish_id: &str) -> DbResult<Vec<Offer>> {
        Self::fetch_offers(&self.pool, dish_id).await
    }

    pub async fn recipes_for_dish(&self, dish_id: &str) -> DbResult<Vec<Recipe>> {
        Self::fetch_recipes(&self.pool, dish_id).await
    }

    pub async fn fetch_dish<'e>(
        executor: impl SqliteExecutor<'e>,
        id: &str,
    ) -> DbResult<Option<Dish>> {
        let dish = sqlx::query_as::<_, Dish>(&format!(
            "SELECT {} FROM dishes WHERE id = ?1",
            DISH_COLUMNS
        ))
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(dish)
    }

    pub async fn fetch_option<'e>(
        executor: impl SqliteExecutor<'e>,
        id: &str,
    ) -> DbResult<Option<DishOptionSelection>> {
        let option = sqlx::query_as::<_, DishOptionSelection>(
            r#"
            SELECT id, dish_id, option_name, additional_price_cents
            FROM dish_option_selections
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await?;

        Ok(option)
    }

    /// All offers for a dish, active or not. Callers pick the active one
    /// for their pricing date.
    pub async fn fetch_offers<'e>(
        executor: impl SqliteExecutor<'e>,
        dish_id: &str,
    ) -> DbResult<Vec<Offer>> {
        let offers = sqlx::query_as::<_, Offer>(
            r#"
            SELECT id, dish_id, discount_bps, start_date, end_date
            FROM offers
            WHERE dish_id = ?1
            ORDER BY end_date, id
            "#,
        )
        .bind(dish_id)
        .fetch_all(executor)
        .await?;

        Ok(offers)
    }

    pub async fn fetch_recipes<'e>(
        executor: impl SqliteExecutor<'e>,
        dish_id: &str,
    ) -> DbResult<Vec<Recipe>> {
        let recipes = sqlx::query_as::<_, Recipe>(
            r#"
            SELECT id, dish_id, warehouse_id, quantity_used, unit
            FROM recipes
            WHERE dish_id = ?1
            ORDER BY id
            "#,
        )
        .bind(dish_id)
        .fetch_all(executor)
        .await?;

        Ok(recipes)
    }

    // =========================================================================
    // Inserts
    // =========================================================================

    pub async fn insert_dish(&self, dish: &Dish) -> DbResult<()> {
        debug!(id = %dish.id, name = %dish.name, "Inserting dish");

        sqlx::query(
            r#"
            INSERT INTO dishes (id, name, price_cents, offer_price_cents, category_id, thumb_image)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&dish.id)
        .bind(&dish.name)
        .bind(dish.price_cents)
        .bind(dish.offer_price_cents)
        .bind(&dish.category_id)
        .bind(&dish.thumb_image)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn insert_option(&self, option: &DishOptionSelection) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO dish_option_selections (id, dish_id, option_name, additional_price_cents)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(&option.id)
        .bind(&option.dish_id)
        .bind(&option.option_name)
        .bind(option.additional_price_cents)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn insert_offer(&self, offer: &Offer) -> DbResult<()> {
        debug!(id = %offer.id, dish_id = %offer.dish_id, bps = offer.discount_bps, "Inserting offer");

        sqlx::query(
            r#"
            INSERT INTO offers (id, dish_id, discount_bps, start_date, end_date)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&offer.id)
        .bind(&offer.dish_id)
        .bind(offer.discount_bps)
        .bind(offer.start_date)
        .bind(offer.end_date)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn insert_recipe(&self, recipe: &Recipe) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO recipes (id, dish_id, warehouse_id, quantity_used, unit)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&recipe.id)
        .bind(&recipe.dish_id)
        .bind(&recipe.warehouse_id)
        .bind(recipe.quantity_used)
        .bind(&recipe.unit)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
