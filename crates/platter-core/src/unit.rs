//! # Measurement Units
//!
//! Units of measure used by recipes and warehouse entries, and conversion
//! between them.
//!
//! ## Dimensions
//! ```text
//! ┌──────────────┬─────────────────────────┬──────────────┐
//! │ Dimension    │ Units                   │ Base unit    │
//! ├──────────────┼─────────────────────────┼──────────────┤
//! │ Mass         │ MG, G, KG               │ G            │
//! │ Volume       │ ML, L                   │ ML           │
//! │ Count        │ PIECE                   │ PIECE        │
//! └──────────────┴─────────────────────────┴──────────────┘
//! ```
//! Conversion only happens inside one dimension. A recipe measured in grams
//! can draw from a warehouse entry kept in kilograms, never from one kept
//! in liters.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};

/// Decimal places kept on stock quantities after a conversion.
const QUANTITY_SCALE: f64 = 1_000_000.0;

/// Physical dimension of a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    Mass,
    Volume,
    Count,
}

/// A unit of measure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "UPPERCASE")]
pub enum Unit {
    #[serde(rename = "MG")]
    Milligram,
    #[serde(rename = "G")]
    Gram,
    #[serde(rename = "KG")]
    Kilogram,
    #[serde(rename = "ML")]
    Milliliter,
    #[serde(rename = "L")]
    Liter,
    Piece,
}

impl Unit {
    /// Canonical symbol, as stored in the database.
    pub const fn symbol(&self) -> &'static str {
        match self {
            Unit::Milligram => "MG",
            Unit::Gram => "G",
            Unit::Kilogram => "KG",
            Unit::Milliliter => "ML",
            Unit::Liter => "L",
            Unit::Piece => "PIECE",
        }
    }

    pub const fn dimension(&self) -> Dimension {
        match self {
            Unit::Milligram | Unit::Gram | Unit::Kilogram => Dimension::Mass,
            Unit::Milliliter | Unit::Liter => Dimension::Volume,
            Unit::Piece => Dimension::Count,
        }
    }

    /// How many base units one of this unit is worth.
    const fn base_factor(&self) -> f64 {
        match self {
            Unit::Milligram => 0.001,
            Unit::Gram => 1.0,
            Unit::Kilogram => 1000.0,
            Unit::Milliliter => 1.0,
            Unit::Liter => 1000.0,
            Unit::Piece => 1.0,
        }
    }

    /// Returns true when a quantity can be converted from `self` to `other`.
    pub fn is_compatible_with(&self, other: Unit) -> bool {
        self.dimension() == other.dimension()
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for Unit {
    type Err = ValidationError;

    /// Parses unit text case-insensitively, accepting symbols and names.
    ///
    /// ## Example
    /// ```rust
    /// use platter_core::unit::Unit;
    ///
    /// assert_eq!("kg".parse::<Unit>().unwrap(), Unit::Kilogram);
    /// assert_eq!("Grams".parse::<Unit>().unwrap(), Unit::Gram);
    /// assert!("cup".parse::<Unit>().is_err());
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mg" | "milligram" | "milligrams" => Ok(Unit::Milligram),
            "g" | "gr" | "gram" | "grams" => Ok(Unit::Gram),
            "kg" | "kilogram" | "kilograms" => Ok(Unit::Kilogram),
            "ml" | "milliliter" | "milliliters" | "millilitre" => Ok(Unit::Milliliter),
            "l" | "liter" | "liters" | "litre" => Ok(Unit::Liter),
            "piece" | "pieces" | "pc" | "pcs" | "unit" => Ok(Unit::Piece),
            _ => Err(ValidationError::NotAllowed {
                field: format!("unit '{}'", s.trim()),
                allowed: ["MG", "G", "KG", "ML", "L", "PIECE"]
                    .iter()
                    .map(|u| u.to_string())
                    .collect(),
            }),
        }
    }
}

/// Converts `quantity` expressed in `from` into `to`.
///
/// The result is rounded to six decimal places so that repeated deductions
/// stay deterministic.
///
/// ## Example
/// ```rust
/// use platter_core::unit::{convert, Unit};
///
/// assert_eq!(convert(250.0, Unit::Gram, Unit::Kilogram).unwrap(), 0.25);
/// assert!(convert(1.0, Unit::Gram, Unit::Liter).is_err());
/// ```
pub fn convert(quantity: f64, from: Unit, to: Unit) -> CoreResult<f64> {
    if !from.is_compatible_with(to) {
        return Err(CoreError::IncompatibleUnits { from, to });
    }
    if from == to {
        return Ok(round_quantity(quantity));
    }
    Ok(round_quantity(quantity * from.base_factor() / to.base_factor()))
}

/// Rounds a stock quantity to the ledger's precision.
pub fn round_quantity(quantity: f64) -> f64 {
    (quantity * QUANTITY_SCALE).round() / QUANTITY_SCALE
}
