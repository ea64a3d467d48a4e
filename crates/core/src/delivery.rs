//! Delivery intake records.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{DeliveryId, IngredientId};

/// One line of a delivery, producing one batch on the named ingredient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryItem {
    pub ingredient_id: IngredientId,
    /// Populated from the ingredient at intake time for display.
    pub ingredient_name: String,
    /// Quantity delivered, in the ingredient's unit.
    pub quantity: Decimal,
    /// Supplier packaging conversion factor (unit per piece).
    pub unit_per_pcs: Decimal,
    pub price: Decimal,
    pub expiration_date: DateTime<Utc>,
}

/// A received supplier delivery. A successfully saved delivery has exactly
/// one batch appended per line item; a failed intake leaves no record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Delivery {
    pub id: DeliveryId,
    pub supplier: String,
    pub delivery_number: String,
    pub delivery_date: DateTime<Utc>,
    pub address: String,
    pub items: Vec<DeliveryItem>,
    /// Client-supplied dedupe key; a replay returns this record unchanged.
    pub idempotency_key: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Delivery {
    /// Total cost across line items.
    #[must_use]
    pub fn total_cost(&self) -> Decimal {
        self.items.iter().map(|item| item.price).sum()
    }
}
