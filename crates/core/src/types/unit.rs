//! Units of measure for ingredient quantities.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Unit of measure for an ingredient.
///
/// Every quantity on a batch, requirement, or delivery line is expressed in
/// the owning ingredient's unit; no automatic conversion happens between
/// units (a kilogram-tracked ingredient is never compared against grams).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Unit {
    Gram,
    Kilogram,
    Milliliter,
    Liter,
    /// Countable pieces (eggs, nori sheets, bowls).
    Piece,
}

impl Unit {
    /// Short display suffix for diagnostics (`"250 g"`, `"3 pcs"`).
    #[must_use]
    pub const fn suffix(self) -> &'static str {
        match self {
            Self::Gram => "g",
            Self::Kilogram => "kg",
            Self::Milliliter => "ml",
            Self::Liter => "l",
            Self::Piece => "pcs",
        }
    }
}

impl std::fmt::Display for Unit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Gram => write!(f, "gram"),
            Self::Kilogram => write!(f, "kilogram"),
            Self::Milliliter => write!(f, "milliliter"),
            Self::Liter => write!(f, "liter"),
            Self::Piece => write!(f, "piece"),
        }
    }
}

/// Error parsing a unit of measure from a string.
#[derive(Debug, Error)]
#[error("unknown unit of measure: {0}")]
pub struct UnitParseError(pub String);

impl std::str::FromStr for Unit {
    type Err = UnitParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "gram" | "g" => Ok(Self::Gram),
            "kilogram" | "kg" => Ok(Self::Kilogram),
            "milliliter" | "ml" => Ok(Self::Milliliter),
            "liter" | "l" => Ok(Self::Liter),
            "piece" | "pcs" => Ok(Self::Piece),
            other => Err(UnitParseError(other.to_string())),
        }
    }
}
