//! Availability resolver: pure per-size and per-item availability.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::instrument;

use kombu_core::{
    MenuFilter, MenuItem, ResolvedMenuItem, ResolvedSize, UnmetRequirement,
};

use crate::clock::Clock;
use crate::error::Result;
use crate::store::{Catalog, MemoryStore};

/// Resolves the menu catalog against current ledger state.
///
/// Resolution is a pure read: repeated calls without an intervening write
/// yield identical results. Errors from the store propagate; a missing
/// ingredient reference is a diagnostic on the size, never an error.
#[derive(Clone)]
pub struct AvailabilityResolver {
    store: MemoryStore,
    clock: Arc<dyn Clock>,
}

impl AvailabilityResolver {
    #[must_use]
    pub fn new(store: MemoryStore, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    /// Resolve every menu item matching `filter`, sorted by name.
    #[instrument(skip(self))]
    pub async fn resolve_menu(&self, filter: &MenuFilter) -> Result<Vec<ResolvedMenuItem>> {
        let as_of = self.clock.now();
        Ok(self
            .store
            .read(|catalog| resolve_catalog(catalog, filter, as_of))
            .await)
    }
}

/// Resolve the filtered catalog at `as_of`.
fn resolve_catalog(
    catalog: &Catalog,
    filter: &MenuFilter,
    as_of: DateTime<Utc>,
) -> Vec<ResolvedMenuItem> {
    let search = filter.search.as_deref().map(str::to_lowercase);
    let mut resolved: Vec<ResolvedMenuItem> = catalog
        .menu_items
        .values()
        .filter(|item| {
            filter.category.is_none_or(|category| item.category == category)
                && search
                    .as_deref()
                    .is_none_or(|needle| item.name.to_lowercase().contains(needle))
        })
        .filter_map(|item| resolve_item(catalog, item, as_of))
        .collect();
    resolved.sort_by(|a, b| a.name.cmp(&b.name));
    resolved
}

/// Resolve one menu item. Returns `None` only for an item with no sizes,
/// which definition-time validation makes unrepresentable.
fn resolve_item(
    catalog: &Catalog,
    item: &MenuItem,
    as_of: DateTime<Utc>,
) -> Option<ResolvedMenuItem> {
    let base_price = item.pricing.base_price()?;
    let sizes: Vec<ResolvedSize> = item
        .pricing
        .size_variants()
        .into_iter()
        .map(|size| {
            let unmet = unmet_requirements(catalog, &size.requirements, as_of);
            let stock_ok = unmet.is_empty();
            ResolvedSize {
                label: size.label,
                price: size.price,
                is_available: item.available && stock_ok,
                unavailable_ingredients: if stock_ok { None } else { Some(unmet) },
            }
        })
        .collect();

    let is_available = item.available && sizes.iter().any(|size| size.is_available);
    Some(ResolvedMenuItem {
        id: item.id,
        name: item.name.clone(),
        description: item.description.clone(),
        category: item.category,
        base_price,
        sizes,
        is_available,
    })
}

/// Requirements the current ledger cannot satisfy, with diagnostics.
fn unmet_requirements(
    catalog: &Catalog,
    requirements: &[kombu_core::IngredientRequirement],
    as_of: DateTime<Utc>,
) -> Vec<UnmetRequirement> {
    let mut unmet = Vec::new();
    for requirement in requirements {
        match catalog.ingredients.get(&requirement.ingredient_id) {
            Some(ingredient) => {
                let available = ingredient.total_available(as_of);
                if available < requirement.quantity {
                    unmet.push(UnmetRequirement {
                        name: ingredient.name.clone(),
                        required: requirement.quantity,
                        available,
                        unit: Some(ingredient.unit),
                    });
                }
            }
            // Dangling reference: unavailable with a reason, never an error.
            None => unmet.push(UnmetRequirement {
                name: format!("missing ingredient {}", requirement.ingredient_id),
                required: requirement.quantity,
                available: Decimal::ZERO,
                unit: None,
            }),
        }
    }
    unmet
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use rust_decimal::dec;

    use kombu_core::{
        Batch, Category, Ingredient, IngredientId, IngredientRequirement, Price, Pricing,
        SizeLabel, SizeVariant, Unit,
    };

    use super::*;

    fn catalog_with_nori(quantity: Decimal) -> (Catalog, IngredientId) {
        let now = Utc::now();
        let mut nori = Ingredient::new("Nori".to_string(), Unit::Piece, now);
        if quantity > Decimal::ZERO {
            nori.batches
                .push(Batch::new(quantity, now + Duration::days(30), now, None));
        }
        let id = nori.id;
        let mut catalog = Catalog::default();
        catalog.ingredients.insert(id, nori);
        (catalog, id)
    }

    fn miso_ramen(nori_id: IngredientId, required: Decimal) -> MenuItem {
        MenuItem::new(
            "Miso Ramen".to_string(),
            "Rich miso broth".to_string(),
            Category::Ramen,
            Pricing::Sized {
                sizes: vec![SizeVariant {
                    label: SizeLabel::Classic,
                    price: Price::new(dec!(185)).expect("positive"),
                    requirements: vec![IngredientRequirement {
                        ingredient_id: nori_id,
                        quantity: required,
                    }],
                }],
            },
            None,
        )
        .expect("valid item")
    }

    #[test]
    fn size_is_available_when_stock_covers_the_requirement() {
        let (mut catalog, nori_id) = catalog_with_nori(dec!(10));
        let item = miso_ramen(nori_id, dec!(2));
        catalog.menu_items.insert(item.id, item);

        let resolved = resolve_catalog(&catalog, &MenuFilter::default(), Utc::now());
        assert_eq!(resolved.len(), 1);
        assert!(resolved[0].is_available);
        assert!(resolved[0].sizes[0].is_available);
        assert!(resolved[0].sizes[0].unavailable_ingredients.is_none());
    }

    #[test]
    fn shortfall_is_reported_with_diagnostics() {
        let (mut catalog, nori_id) = catalog_with_nori(dec!(1));
        let item = miso_ramen(nori_id, dec!(2));
        catalog.menu_items.insert(item.id, item);

        let resolved = resolve_catalog(&catalog, &MenuFilter::default(), Utc::now());
        let size = &resolved[0].sizes[0];
        assert!(!size.is_available);
        let unmet = size.unavailable_ingredients.as_ref().expect("diagnostics");
        assert_eq!(unmet[0].name, "Nori");
        assert_eq!(unmet[0].required, dec!(2));
        assert_eq!(unmet[0].available, dec!(1));
        assert_eq!(unmet[0].unit, Some(Unit::Piece));
    }

    #[test]
    fn missing_ingredient_reference_is_a_diagnostic_not_an_error() {
        let mut catalog = Catalog::default();
        let item = miso_ramen(IngredientId::new(), dec!(2));
        catalog.menu_items.insert(item.id, item);

        let resolved = resolve_catalog(&catalog, &MenuFilter::default(), Utc::now());
        let size = &resolved[0].sizes[0];
        assert!(!size.is_available);
        let unmet = size.unavailable_ingredients.as_ref().expect("diagnostics");
        assert!(unmet[0].name.starts_with("missing ingredient"));
        assert_eq!(unmet[0].unit, None);
    }

    #[test]
    fn manual_flag_overrides_stock() {
        let (mut catalog, nori_id) = catalog_with_nori(dec!(10));
        let mut item = miso_ramen(nori_id, dec!(2));
        item.available = false;
        catalog.menu_items.insert(item.id, item);

        let resolved = resolve_catalog(&catalog, &MenuFilter::default(), Utc::now());
        assert!(!resolved[0].is_available);
        assert!(!resolved[0].sizes[0].is_available);
        // Not a stock problem, so no ingredient diagnostics.
        assert!(resolved[0].sizes[0].unavailable_ingredients.is_none());
    }

    #[test]
    fn size_with_no_requirements_is_always_available() {
        let mut catalog = Catalog::default();
        let item = MenuItem::new(
            "Green Tea".to_string(),
            String::new(),
            Category::Drink,
            Pricing::Flat {
                price: Price::new(dec!(45)).expect("positive"),
                requirements: vec![],
            },
            None,
        )
        .expect("valid item");
        catalog.menu_items.insert(item.id, item);

        let resolved = resolve_catalog(&catalog, &MenuFilter::default(), Utc::now());
        assert!(resolved[0].is_available);
        assert_eq!(resolved[0].sizes[0].label, SizeLabel::Classic);
    }

    #[test]
    fn filter_restricts_by_category_and_search() {
        let (mut catalog, nori_id) = catalog_with_nori(dec!(10));
        let ramen = miso_ramen(nori_id, dec!(2));
        let tea = MenuItem::new(
            "Green Tea".to_string(),
            String::new(),
            Category::Drink,
            Pricing::Flat {
                price: Price::new(dec!(45)).expect("positive"),
                requirements: vec![],
            },
            None,
        )
        .expect("valid item");
        catalog.menu_items.insert(ramen.id, ramen);
        catalog.menu_items.insert(tea.id, tea);

        let ramen_only = resolve_catalog(
            &catalog,
            &MenuFilter {
                category: Some(Category::Ramen),
                search: None,
            },
            Utc::now(),
        );
        assert_eq!(ramen_only.len(), 1);
        assert_eq!(ramen_only[0].name, "Miso Ramen");

        let searched = resolve_catalog(
            &catalog,
            &MenuFilter {
                category: None,
                search: Some("TEA".to_string()),
            },
            Utc::now(),
        );
        assert_eq!(searched.len(), 1);
        assert_eq!(searched[0].name, "Green Tea");
    }
}
