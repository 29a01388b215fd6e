//! # Pricing Engine
//!
//! Computes what a customer pays for each order line.
//!
//! ## Calculation Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. List price        offer price if configured, else base price        │
//! │  2. Effective price   list price − active dated offer (if any)          │
//! │  3. Line total        (effective + Σ option prices) × quantity          │
//! │  4. Subtotal          Σ line totals + shipping fee                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Overlapping Offers
//! When more than one offer is active for a dish on the same day, the one
//! ending soonest is applied. Ties go to the larger discount, then to the
//! lower offer id, so repeated pricing always picks the same offer.

use chrono::NaiveDate;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{Dish, DishOptionSelection, Offer};

/// Picks the offer that applies to `dish_id` on `date`, if any.
pub fn select_active_offer<'a>(
    dish_id: &str,
    offers: &'a [Offer],
    date: NaiveDate,
) -> Option<&'a Offer> {
    offers
        .iter()
        .filter(|o| o.dish_id == dish_id && o.is_active_on(date))
        .min_by(|a, b| {
            a.end_date
                .cmp(&b.end_date)
                .then_with(|| b.discount_bps.cmp(&a.discount_bps))
                .then_with(|| a.id.cmp(&b.id))
        })
}

/// Unit price of `dish` on `date`.
///
/// ## Example
/// ```rust
/// # use chrono::NaiveDate;
/// # use platter_core::pricing::effective_price;
/// # use platter_core::types::{Dish, Offer};
/// let dish = Dish {
///     id: "d1".into(),
///     name: "Pho Bo".into(),
///     price_cents: 10_000,
///     offer_price_cents: None,
///     category_id: None,
///     thumb_image: None,
/// };
/// let day = NaiveDate::from_ymd_opt(2026, 3, 5).unwrap();
/// let offer = Offer {
///     id: "o1".into(),
///     dish_id: "d1".into(),
///     discount_bps: 1000,
///     start_date: day,
///     end_date: day,
/// };
/// assert_eq!(effective_price(&dish, &[offer], day).cents(), 9_000);
/// ```
pub fn effective_price(dish: &Dish, offers: &[Offer], date: NaiveDate) -> Money {
    let list = dish.list_price();
    match select_active_offer(&dish.id, offers, date) {
        Some(offer) => list.apply_percentage_discount(offer.discount()),
        None => list,
    }
}

/// `(unit_price + Σ option prices) × quantity`.
pub fn line_total(
    unit_price: Money,
    options: &[DishOptionSelection],
    quantity: i64,
) -> CoreResult<Money> {
    if quantity <= 0 {
        return Err(CoreError::InvalidQuantity { quantity });
    }
    let extras: Money = options.iter().map(|o| o.additional_price()).sum();
    Ok((unit_price + extras).multiply_quantity(quantity))
}

/// A priced order line, ready to be persisted as a snapshot.
#[derive(Debug, Clone)]
pub struct PricedLine {
    pub dish: Dish,
    pub quantity: i64,
    pub unit_price: Money,
    pub options: Vec<DishOptionSelection>,
    pub line_total: Money,
}

impl PricedLine {
    pub fn new(
        dish: Dish,
        quantity: i64,
        options: Vec<DishOptionSelection>,
        offers: &[Offer],
        date: NaiveDate,
    ) -> CoreResult<Self> {
        for option in &options {
            if option.dish_id != dish.id {
                return Err(CoreError::not_found(
                    "DishOptionSelection",
                    format!("{} (dish {})", option.id, dish.id),
                ));
            }
        }
        let unit_price = effective_price(&dish, offers, date);
        let line_total = line_total(unit_price, &options, quantity)?;
        Ok(PricedLine {
            dish,
            quantity,
            unit_price,
            options,
            line_total,
        })
    }
}

/// `Σ line totals + shipping fee`.
pub fn order_subtotal(lines: &[PricedLine], shipping_fee: Money) -> Money {
    lines.iter().map(|l| l.line_total).sum::<Money>() + shipping_fee
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    fn dish(price: i64) -> Dish {
        Dish {
            id: "d1".into(),
            name: "Pho Bo".into(),
            price_cents: price,
            offer_price_cents: None,
            category_id: None,
            thumb_image: None,
        }
    }

    fn offer(id: &str, bps: u32, start: u32, end: u32) -> Offer {
        Offer {
            id: id.into(),
            dish_id: "d1".into(),
            discount_bps: bps,
            start_date: day(start),
            end_date: day(end),
        }
    }

    fn option(id: &str, cents: i64) -> DishOptionSelection {
        DishOptionSelection {
            id: id.into(),
            dish_id: "d1".into(),
            option_name: format!("extra {}", id),
            additional_price_cents: cents,
        }
    }

    #[test]
    fn test_offer_and_shipping_subtotal() {
        // 100 with 10% off, ×2, plus 5 shipping = 185
        let offers = vec![offer("o1", 1000, 1, 31)];
        let line = PricedLine::new(dish(10_000), 2, vec![], &offers, day(10)).unwrap();
        assert_eq!(line.unit_price.cents(), 9_000);

        let subtotal = order_subtotal(&[line], Money::from_major(5));
        assert_eq!(subtotal, Money::from_major(185));
    }

    #[test]
    fn test_no_active_offer_uses_list_price() {
        let offers = vec![offer("o1", 1000, 1, 5)];
        let mut d = dish(10_000);
        assert_eq!(effective_price(&d, &offers, day(6)).cents(), 10_000);

        d.offer_price_cents = Some(8_000);
        assert_eq!(effective_price(&d, &offers, day(6)).cents(), 8_000);
        // the dated offer stacks on the offer price
        assert_eq!(effective_price(&d, &offers, day(5)).cents(), 7_200);
    }

    #[test]
    fn test_soonest_expiring_offer_wins() {
        let offers = vec![
            offer("big", 5000, 1, 31),
            offer("small", 1000, 1, 10),
        ];
        let picked = select_active_offer("d1", &offers, day(5)).unwrap();
        assert_eq!(picked.id, "small");

        let picked = select_active_offer("d1", &offers, day(11)).unwrap();
        assert_eq!(picked.id, "big");
    }

    #[test]
    fn test_offer_tie_breaks() {
        let offers = vec![
            offer("b", 1000, 1, 10),
            offer("a", 1000, 1, 10),
            offer("c", 2000, 1, 10),
        ];
        assert_eq!(select_active_offer("d1", &offers, day(5)).unwrap().id, "c");

        let offers = vec![offer("b", 1000, 1, 10), offer("a", 1000, 1, 10)];
        assert_eq!(select_active_offer("d1", &offers, day(5)).unwrap().id, "a");
    }

    #[test]
    fn test_offers_for_other_dishes_are_ignored() {
        let mut other = offer("o2", 9000, 1, 31);
        other.dish_id = "d2".into();
        assert!(select_active_offer("d1", &[other], day(5)).is_none());
    }

    #[test]
    fn test_line_total_with_options() {
        let total = line_total(
            Money::from_cents(5_000),
            &[option("large", 1_000), option("egg", 500)],
            3,
        )
        .unwrap();
        assert_eq!(total.cents(), 19_500);
    }

    #[test]
    fn test_non_positive_quantity() {
        for qty in [0, -1] {
            let err = line_total(Money::from_cents(100), &[], qty).unwrap_err();
            assert!(matches!(err, CoreError::InvalidQuantity { quantity } if quantity == qty));
        }
    }

    #[test]
    fn test_option_from_other_dish_is_rejected() {
        let mut foreign = option("x", 100);
        foreign.dish_id = "d9".into();
        let err = PricedLine::new(dish(1_000), 1, vec![foreign], &[], day(1)).unwrap_err();
        assert!(matches!(err, CoreError::NotFound { .. }));
    }
}
