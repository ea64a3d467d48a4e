//! Batch ledger: per-ingredient stock lot operations.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::instrument;

use kombu_core::{Batch, DeliveryId, Ingredient, IngredientId, ValidationError};

use crate::cache::menu::MenuViewCache;
use crate::clock::Clock;
use crate::error::{AppError, Result};
use crate::store::MemoryStore;

/// Ledger operations over an ingredient's batches.
///
/// Every mutation runs inside one store write section and invalidates the
/// menu view cache on success.
#[derive(Clone)]
pub struct BatchLedger {
    store: MemoryStore,
    clock: Arc<dyn Clock>,
    menu_cache: Arc<MenuViewCache>,
}

impl BatchLedger {
    #[must_use]
    pub fn new(store: MemoryStore, clock: Arc<dyn Clock>, menu_cache: Arc<MenuViewCache>) -> Self {
        Self {
            store,
            clock,
            menu_cache,
        }
    }

    /// Total quantity available right now: the sum over non-expired,
    /// positive-quantity batches.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the ingredient does not exist.
    pub async fn total_available(&self, ingredient_id: IngredientId) -> Result<Decimal> {
        let as_of = self.clock.now();
        self.store
            .read(|catalog| {
                catalog
                    .ingredients
                    .get(&ingredient_id)
                    .map(|ingredient| ingredient.total_available(as_of))
                    .ok_or_else(|| not_found(ingredient_id))
            })
            .await
    }

    /// Append a new batch (delivery line or manual stock entry).
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] for a non-positive quantity and
    /// [`AppError::NotFound`] if the ingredient does not exist.
    #[instrument(skip(self), fields(%ingredient_id, %quantity))]
    pub async fn add_batch(
        &self,
        ingredient_id: IngredientId,
        quantity: Decimal,
        expires_at: DateTime<Utc>,
        source_delivery: Option<DeliveryId>,
    ) -> Result<Batch> {
        if quantity <= Decimal::ZERO {
            return Err(ValidationError::NonPositiveQuantity { quantity }.into());
        }

        let created_at = self.clock.now();
        let result = self
            .store
            .write(|catalog| {
                let ingredient = catalog
                    .ingredients
                    .get_mut(&ingredient_id)
                    .ok_or_else(|| not_found(ingredient_id))?;
                let batch = Batch::new(quantity, expires_at, created_at, source_delivery);
                ingredient.batches.push(batch.clone());
                Ok(batch)
            })
            .await;

        if result.is_ok() {
            self.menu_cache.invalidate_all();
        }
        result
    }

    /// Delete a batch by position, returning it.
    ///
    /// The positional index exists only at this boundary: it is resolved to
    /// the batch's stable id inside the write section, so a concurrent
    /// insertion cannot redirect the delete.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] for a missing ingredient and
    /// [`AppError::InvalidIndex`] for an out-of-bounds index.
    #[instrument(skip(self), fields(%ingredient_id, index))]
    pub async fn remove_batch_at(
        &self,
        ingredient_id: IngredientId,
        index: usize,
    ) -> Result<Batch> {
        let result = self
            .store
            .write(|catalog| {
                let ingredient = catalog
                    .ingredients
                    .get_mut(&ingredient_id)
                    .ok_or_else(|| not_found(ingredient_id))?;
                let len = ingredient.batches.len();
                let batch_id = ingredient
                    .batches
                    .get(index)
                    .map(|batch| batch.id)
                    .ok_or(AppError::InvalidIndex { index, len })?;
                let position = ingredient
                    .batches
                    .iter()
                    .position(|batch| batch.id == batch_id)
                    .ok_or(AppError::InvalidIndex { index, len })?;
                Ok(ingredient.batches.remove(position))
            })
            .await;

        if result.is_ok() {
            self.menu_cache.invalidate_all();
        }
        result
    }

    /// Consume `quantity` from the earliest-expiring usable batches.
    ///
    /// All-or-nothing: if the total available is short, no batch is touched.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] for a non-positive quantity,
    /// [`AppError::NotFound`] for a missing ingredient, and
    /// [`AppError::InsufficientStock`] when the draw cannot be satisfied.
    #[instrument(skip(self), fields(%ingredient_id, %quantity))]
    pub async fn consume(&self, ingredient_id: IngredientId, quantity: Decimal) -> Result<()> {
        if quantity <= Decimal::ZERO {
            return Err(ValidationError::NonPositiveQuantity { quantity }.into());
        }

        let as_of = self.clock.now();
        let result = self
            .store
            .write(|catalog| {
                let ingredient = catalog
                    .ingredients
                    .get_mut(&ingredient_id)
                    .ok_or_else(|| not_found(ingredient_id))?;
                consume_from(ingredient, quantity, as_of)
            })
            .await;

        if result.is_ok() {
            self.menu_cache.invalidate_all();
        }
        result
    }

    /// Restore previously consumed stock.
    ///
    /// The expiry of restored stock is never fabricated: the caller supplies
    /// it, and the quantity lands on the live batch with that exact expiry
    /// when one exists, else on a fresh batch.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] for a non-positive quantity and
    /// [`AppError::NotFound`] for a missing ingredient.
    #[instrument(skip(self), fields(%ingredient_id, %quantity))]
    pub async fn release(
        &self,
        ingredient_id: IngredientId,
        quantity: Decimal,
        expires_at: DateTime<Utc>,
    ) -> Result<Batch> {
        if quantity <= Decimal::ZERO {
            return Err(ValidationError::NonPositiveQuantity { quantity }.into());
        }

        let created_at = self.clock.now();
        let result = self
            .store
            .write(|catalog| {
                let ingredient = catalog
                    .ingredients
                    .get_mut(&ingredient_id)
                    .ok_or_else(|| not_found(ingredient_id))?;
                if let Some(batch) = ingredient
                    .batches
                    .iter_mut()
                    .find(|batch| batch.expires_at == expires_at)
                {
                    batch.quantity += quantity;
                    Ok(batch.clone())
                } else {
                    let batch = Batch::new(quantity, expires_at, created_at, None);
                    ingredient.batches.push(batch.clone());
                    Ok(batch)
                }
            })
            .await;

        if result.is_ok() {
            self.menu_cache.invalidate_all();
        }
        result
    }
}

fn not_found(ingredient_id: IngredientId) -> AppError {
    AppError::NotFound(format!("ingredient {ingredient_id}"))
}

/// Draw `quantity` from `ingredient`, nearest expiry first.
///
/// Checks the full amount against usable stock before mutating anything, so
/// a failed draw leaves every batch untouched. Exhausted batches are kept at
/// zero quantity for audit.
pub(crate) fn consume_from(
    ingredient: &mut Ingredient,
    quantity: Decimal,
    as_of: DateTime<Utc>,
) -> Result<()> {
    let available = ingredient.total_available(as_of);
    if available < quantity {
        return Err(AppError::InsufficientStock {
            ingredient: ingredient.name.clone(),
            requested: quantity,
            available,
        });
    }

    let draw_order: Vec<_> = ingredient
        .batches_by_expiry(as_of)
        .iter()
        .map(|batch| batch.id)
        .collect();

    let mut remaining = quantity;
    for batch_id in draw_order {
        if remaining.is_zero() {
            break;
        }
        if let Some(batch) = ingredient.batches.iter_mut().find(|b| b.id == batch_id) {
            let draw = batch.quantity.min(remaining);
            batch.quantity -= draw;
            remaining -= draw;
        }
    }
    debug_assert!(remaining.is_zero(), "availability was checked above");
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use rust_decimal::dec;

    use kombu_core::Unit;

    use super::*;

    fn ingredient_with_batches(batches: &[(Decimal, i64)]) -> Ingredient {
        let now = Utc::now();
        let mut ingredient = Ingredient::new("Nori".to_string(), Unit::Piece, now);
        for &(quantity, days) in batches {
            ingredient
                .batches
                .push(Batch::new(quantity, now + Duration::days(days), now, None));
        }
        ingredient
    }

    #[test]
    fn consume_draws_nearest_expiry_first() {
        let mut ingredient = ingredient_with_batches(&[(dec!(5), 10), (dec!(5), 2)]);
        let now = Utc::now();

        consume_from(&mut ingredient, dec!(7), now).expect("enough stock");

        // The 2-day batch empties before the 10-day batch is touched.
        let by_expiry = ingredient.batches_by_expiry(now);
        assert_eq!(by_expiry.len(), 1);
        assert_eq!(by_expiry[0].quantity, dec!(3));
        assert_eq!(ingredient.total_available(now), dec!(3));
    }

    #[test]
    fn consume_decreases_total_by_exactly_the_requested_amount() {
        let mut ingredient = ingredient_with_batches(&[(dec!(4), 3), (dec!(6), 8)]);
        let now = Utc::now();
        let before = ingredient.total_available(now);

        consume_from(&mut ingredient, dec!(5.5), now).expect("enough stock");

        assert_eq!(ingredient.total_available(now), before - dec!(5.5));
        assert!(ingredient.batches.iter().all(|b| b.quantity >= Decimal::ZERO));
    }

    #[test]
    fn failed_consume_mutates_nothing() {
        let mut ingredient = ingredient_with_batches(&[(dec!(5), 2), (dec!(5), -1)]);
        let now = Utc::now();
        let before = ingredient.clone();

        let err = consume_from(&mut ingredient, dec!(6), now).expect_err("expired stock excluded");
        assert!(matches!(
            err,
            AppError::InsufficientStock { requested, available, .. }
                if requested == dec!(6) && available == dec!(5)
        ));
        assert_eq!(ingredient, before);
    }

    #[test]
    fn exhausted_batches_are_retained_for_audit() {
        let mut ingredient = ingredient_with_batches(&[(dec!(5), 2)]);
        let now = Utc::now();

        consume_from(&mut ingredient, dec!(5), now).expect("enough stock");

        assert_eq!(ingredient.batches.len(), 1);
        assert_eq!(ingredient.batches[0].quantity, Decimal::ZERO);
        assert_eq!(ingredient.total_available(now), Decimal::ZERO);
    }
}
