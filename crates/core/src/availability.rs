//! Resolved (derived) menu availability views.
//!
//! These records are computed on demand from the catalog and the batch
//! ledger; they are never persisted. Serialization order is deterministic
//! so that two resolutions with no intervening write are byte-identical.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::menu::{Category, SizeLabel};
use crate::types::{MenuItemId, Price, Unit};

/// An ingredient requirement a size could not satisfy, for diagnostic
/// display on the unavailable size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnmetRequirement {
    pub name: String,
    pub required: Decimal,
    pub available: Decimal,
    pub unit: Option<Unit>,
}

/// Availability of one size variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedSize {
    pub label: SizeLabel,
    pub price: Price,
    pub is_available: bool,
    /// Present only when the size is unavailable for stock reasons.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unavailable_ingredients: Option<Vec<UnmetRequirement>>,
}

/// A menu item annotated with per-size availability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedMenuItem {
    pub id: MenuItemId,
    pub name: String,
    pub description: String,
    pub category: Category,
    pub base_price: Price,
    pub sizes: Vec<ResolvedSize>,
    /// Manual flag AND at least one size available.
    pub is_available: bool,
}

/// Query filter for menu resolution; doubles as the cache key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MenuFilter {
    pub category: Option<Category>,
    /// Case-insensitive name substring.
    pub search: Option<String>,
}

impl MenuFilter {
    /// Canonical cache key. Distinct filters must never share an entry, so
    /// the key covers every field in a fixed order.
    #[must_use]
    pub fn cache_key(&self) -> String {
        let category = self
            .category
            .map_or_else(|| "*".to_string(), |c| format!("{c:?}").to_lowercase());
        let search = self
            .search
            .as_deref()
            .map_or_else(|| "*".to_string(), str::to_lowercase);
        format!("category={category}&search={search}")
    }
}
