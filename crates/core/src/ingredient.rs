//! Ingredients and their expiry-dated stock batches.
//!
//! An ingredient owns an ordered collection of batches (stock lots). Each
//! batch carries its own expiry; availability is always computed against a
//! supplied `as_of` instant so the engine can inject a test clock.

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::types::{BatchId, DeliveryId, IngredientId, Unit};

/// Days-to-expiry window in which a batch counts as "expiring soon".
pub const EXPIRING_SOON_DAYS: i64 = 7;

/// A single stock lot of an ingredient.
///
/// Batches are owned by exactly one ingredient and identified by a stable
/// [`BatchId`]; positions in the owning vector are a display concern only.
/// A batch with zero quantity is logically exhausted - it is retained for
/// audit but never contributes to availability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Batch {
    pub id: BatchId,
    /// Quantity remaining, in the owning ingredient's unit. Never negative.
    pub quantity: Decimal,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    /// Delivery that produced this batch; `None` for manual stock entry.
    pub source_delivery: Option<DeliveryId>,
}

impl Batch {
    /// Create a batch. Quantity is assumed validated by the caller.
    #[must_use]
    pub fn new(
        quantity: Decimal,
        expires_at: DateTime<Utc>,
        created_at: DateTime<Utc>,
        source_delivery: Option<DeliveryId>,
    ) -> Self {
        Self {
            id: BatchId::new(),
            quantity,
            expires_at,
            created_at,
            source_delivery,
        }
    }

    /// A batch is expired iff its expiry is at or before `as_of`.
    #[must_use]
    pub fn is_expired(&self, as_of: DateTime<Utc>) -> bool {
        self.expires_at <= as_of
    }

    /// A batch is expiring soon iff it expires within
    /// [`EXPIRING_SOON_DAYS`] days of `as_of` (and is not yet expired).
    #[must_use]
    pub fn is_expiring_soon(&self, as_of: DateTime<Utc>) -> bool {
        !self.is_expired(as_of) && self.expires_at - as_of <= Duration::days(EXPIRING_SOON_DAYS)
    }

    /// Whether this batch counts toward availability at `as_of`.
    #[must_use]
    pub fn is_usable(&self, as_of: DateTime<Utc>) -> bool {
        self.quantity > Decimal::ZERO && !self.is_expired(as_of)
    }
}

/// A perishable ingredient with its stock batches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    pub id: IngredientId,
    /// Unique across all ingredients.
    pub name: String,
    pub unit: Unit,
    pub batches: Vec<Batch>,
    pub created_at: DateTime<Utc>,
}

impl Ingredient {
    #[must_use]
    pub fn new(name: String, unit: Unit, created_at: DateTime<Utc>) -> Self {
        Self {
            id: IngredientId::new(),
            name,
            unit,
            batches: Vec::new(),
            created_at,
        }
    }

    /// Total quantity available at `as_of`: the sum over usable batches.
    #[must_use]
    pub fn total_available(&self, as_of: DateTime<Utc>) -> Decimal {
        self.batches
            .iter()
            .filter(|b| b.is_usable(as_of))
            .map(|b| b.quantity)
            .sum()
    }

    /// Usable batches sorted nearest-expiry-first, the order in which
    /// consumption draws stock down.
    #[must_use]
    pub fn batches_by_expiry(&self, as_of: DateTime<Utc>) -> Vec<&Batch> {
        let mut usable: Vec<&Batch> = self.batches.iter().filter(|b| b.is_usable(as_of)).collect();
        usable.sort_by_key(|b| b.expires_at);
        usable
    }

    /// Count of batches already expired at `as_of`.
    #[must_use]
    pub fn expired_batches(&self, as_of: DateTime<Utc>) -> usize {
        self.batches.iter().filter(|b| b.is_expired(as_of)).count()
    }

    /// Count of batches expiring within the warning window at `as_of`.
    #[must_use]
    pub fn expiring_soon_batches(&self, as_of: DateTime<Utc>) -> usize {
        self.batches
            .iter()
            .filter(|b| b.is_expiring_soon(as_of))
            .count()
    }
}
