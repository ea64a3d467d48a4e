//! In-memory document store for the stock engine.
//!
//! The persistence layer is an external collaborator from the engine's point
//! of view; this store keeps the repository shape (typed lookups, closure
//! scoped transactions) while holding documents in memory. All collections
//! live behind one `RwLock`: a `write` closure is a single atomic
//! check-then-mutate section, which is this store's equivalent of a
//! persistence-level decrement-if-sufficient conditional update. Two racing
//! order commits therefore serialize at the guard and cannot both pass the
//! same availability check.
//!
//! Nothing in the engine holds the guard across I/O; closures are synchronous
//! and return before any network or disk work happens.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

use kombu_core::{
    Delivery, DeliveryId, Ingredient, IngredientId, MenuItem, MenuItemId, Order, OrderId,
    Transaction,
};

/// Every collection the engine persists.
#[derive(Debug, Default)]
pub struct Catalog {
    pub ingredients: HashMap<IngredientId, Ingredient>,
    pub menu_items: HashMap<MenuItemId, MenuItem>,
    pub deliveries: HashMap<DeliveryId, Delivery>,
    pub orders: HashMap<OrderId, Order>,
    pub transactions: Vec<Transaction>,
    /// Idempotency keys already applied, mapping to the record they created.
    pub delivery_keys: HashMap<String, DeliveryId>,
    pub order_keys: HashMap<String, OrderId>,
}

impl Catalog {
    /// Case-insensitive unique-name lookup for ingredients.
    #[must_use]
    pub fn ingredient_by_name(&self, name: &str) -> Option<&Ingredient> {
        self.ingredients
            .values()
            .find(|i| i.name.eq_ignore_ascii_case(name))
    }

    /// Case-insensitive unique-name lookup for menu items.
    #[must_use]
    pub fn menu_item_by_name(&self, name: &str) -> Option<&MenuItem> {
        self.menu_items
            .values()
            .find(|m| m.name.eq_ignore_ascii_case(name))
    }
}

/// Shared handle to the in-memory store. Cheap to clone.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    catalog: Arc<RwLock<Catalog>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Run a read-only section against a consistent snapshot.
    pub async fn read<R>(&self, f: impl FnOnce(&Catalog) -> R) -> R {
        let catalog = self.catalog.read().await;
        f(&catalog)
    }

    /// Run an atomic check-then-mutate section. The closure either returns
    /// `Ok` having applied every mutation, or `Err` having applied none -
    /// callers validate before touching state.
    pub async fn write<R>(&self, f: impl FnOnce(&mut Catalog) -> R) -> R {
        let mut catalog = self.catalog.write().await;
        f(&mut catalog)
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use kombu_core::Unit;

    use super::*;

    #[tokio::test]
    async fn name_lookup_is_case_insensitive() {
        let store = MemoryStore::new();
        let nori = Ingredient::new("Nori".to_string(), Unit::Piece, Utc::now());
        store
            .write(|catalog| {
                catalog.ingredients.insert(nori.id, nori.clone());
            })
            .await;

        let found = store
            .read(|catalog| catalog.ingredient_by_name("nori").map(|i| i.id))
            .await;
        assert_eq!(found, Some(nori.id));
    }
}
