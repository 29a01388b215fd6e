//! # Inventory Deduction
//!
//! Plans how one recipe line draws down one warehouse entry. Planning is
//! pure: the database layer applies the resulting [`Deduction`] with a
//! versioned write.
//!
//! ```text
//! recipe.quantity_used × ordered   (recipe unit)
//!            │ convert
//!            ▼
//! required                         (warehouse unit)
//!            │
//!            ├── available − required < 0 ──► InsufficientStock
//!            ▼
//! available −= required, used += required
//! ```

use crate::error::{CoreError, CoreResult};
use crate::types::{Recipe, Warehouse};
use crate::unit::{convert, round_quantity, Unit};

/// New stock levels for one warehouse entry.
#[derive(Debug, Clone, PartialEq)]
pub struct Deduction {
    pub warehouse_id: String,
    /// Amount drawn, in the warehouse unit.
    pub required: f64,
    pub new_available: f64,
    pub new_used: f64,
    /// Version the plan was computed against.
    pub expected_version: i64,
}

/// Plans deducting `ordered_qty` portions of `dish_name` from `warehouse`.
///
/// The warehouse passed in must be the current row, including any earlier
/// deductions from the same order.
pub fn plan_deduction(
    dish_name: &str,
    recipe: &Recipe,
    warehouse: &Warehouse,
    ordered_qty: i64,
) -> CoreResult<Deduction> {
    if ordered_qty <= 0 {
        return Err(CoreError::InvalidQuantity {
            quantity: ordered_qty,
        });
    }
    let recipe_unit: Unit = recipe.unit.parse()?;
    let stock_unit: Unit = warehouse.unit.parse()?;

    let required = convert(
        recipe.quantity_used * ordered_qty as f64,
        recipe_unit,
        stock_unit,
    )?;
    let remaining = round_quantity(warehouse.available_quantity - required);
    if remaining < 0.0 {
        return Err(CoreError::InsufficientStock {
            dish: dish_name.to_string(),
            ingredient: warehouse.ingredient_name.clone(),
            available: warehouse.available_quantity,
            required,
        });
    }

    Ok(Deduction {
        warehouse_id: warehouse.id.clone(),
        required,
        new_available: remaining,
        new_used: round_quantity(warehouse.quantity_used + required),
        expected_version: warehouse.version,
    })
}
