//! Stock mutator: catalog maintenance, delivery intake, order lifecycle.
//!
//! Every operation validates before it mutates, runs inside one store write
//! section, and invalidates the menu view cache when it changed menu or
//! ledger state. Deliveries and orders accept an optional idempotency key;
//! a replayed key returns the originally stored record without re-applying.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::instrument;

use kombu_core::{
    Batch, Category, Delivery, DeliveryId, DeliveryItem, Ingredient, IngredientId, MenuItem,
    MenuItemId, Order, OrderId, OrderLine, OrderStatus, Pricing, SizeLabel, Transaction,
    TransactionId, Unit, UnmetRequirement, ValidationError,
};

use crate::cache::menu::MenuViewCache;
use crate::clock::Clock;
use crate::error::{AppError, OrderConflict, Result};
use crate::stock::ledger::consume_from;
use crate::store::{Catalog, MemoryStore};

/// One line of a delivery intake request.
#[derive(Debug, Clone, Deserialize)]
pub struct DeliveryLineInput {
    pub ingredient_id: IngredientId,
    pub quantity: Decimal,
    pub unit_per_pcs: Decimal,
    pub price: Decimal,
    pub expiration_date: DateTime<Utc>,
}

/// A delivery intake request.
#[derive(Debug, Clone, Deserialize)]
pub struct DeliveryInput {
    pub supplier: String,
    pub delivery_number: String,
    pub delivery_date: DateTime<Utc>,
    pub address: String,
    #[serde(default)]
    pub idempotency_key: Option<String>,
    pub items: Vec<DeliveryLineInput>,
}

/// One line of an order placement request.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderLineInput {
    pub menu_item_id: MenuItemId,
    pub size: SizeLabel,
    pub quantity: u32,
}

/// An order placement request.
#[derive(Debug, Clone, Deserialize)]
pub struct OrderInput {
    pub table_number: u32,
    pub customer_name: String,
    #[serde(default)]
    pub idempotency_key: Option<String>,
    pub items: Vec<OrderLineInput>,
}

/// A menu item creation request.
#[derive(Debug, Clone, Deserialize)]
pub struct MenuItemInput {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub category: Category,
    pub pricing: Pricing,
    #[serde(default)]
    pub image_path: Option<String>,
}

/// A partial menu item update.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MenuItemPatch {
    pub description: Option<String>,
    pub available: Option<bool>,
    pub image_path: Option<String>,
    pub pricing: Option<Pricing>,
}

/// Write path of the stock engine.
#[derive(Clone)]
pub struct StockMutator {
    store: MemoryStore,
    clock: Arc<dyn Clock>,
    menu_cache: Arc<MenuViewCache>,
}

impl StockMutator {
    #[must_use]
    pub fn new(store: MemoryStore, clock: Arc<dyn Clock>, menu_cache: Arc<MenuViewCache>) -> Self {
        Self {
            store,
            clock,
            menu_cache,
        }
    }

    // =========================================================================
    // Catalog maintenance
    // =========================================================================

    /// Create an ingredient with an empty batch list.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] for an empty name and
    /// [`AppError::Conflict`] for a duplicate one.
    #[instrument(skip(self))]
    pub async fn create_ingredient(&self, name: String, unit: Unit) -> Result<Ingredient> {
        if name.trim().is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        let created_at = self.clock.now();
        self.store
            .write(|catalog| {
                if catalog.ingredient_by_name(&name).is_some() {
                    return Err(AppError::Conflict(format!(
                        "ingredient named {name:?} already exists"
                    )));
                }
                let ingredient = Ingredient::new(name, unit, created_at);
                catalog.ingredients.insert(ingredient.id, ingredient.clone());
                Ok(ingredient)
            })
            .await
    }

    /// Delete an ingredient and all of its batches.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the ingredient does not exist.
    #[instrument(skip(self), fields(%ingredient_id))]
    pub async fn delete_ingredient(&self, ingredient_id: IngredientId) -> Result<Ingredient> {
        let result = self
            .store
            .write(|catalog| {
                catalog
                    .ingredients
                    .remove(&ingredient_id)
                    .ok_or_else(|| AppError::NotFound(format!("ingredient {ingredient_id}")))
            })
            .await;

        if result.is_ok() {
            self.menu_cache.invalidate_all();
        }
        result
    }

    /// Create a validated menu item.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] for malformed pricing,
    /// [`AppError::BadRequest`] for a pricing shape that does not match the
    /// category, and [`AppError::Conflict`] for a duplicate name.
    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_menu_item(&self, input: MenuItemInput) -> Result<MenuItem> {
        check_pricing_shape(input.category, &input.pricing)?;
        let item = MenuItem::new(
            input.name,
            input.description,
            input.category,
            input.pricing,
            input.image_path,
        )?;

        let result = self
            .store
            .write(|catalog| {
                if catalog.menu_item_by_name(&item.name).is_some() {
                    return Err(AppError::Conflict(format!(
                        "menu item named {:?} already exists",
                        item.name
                    )));
                }
                catalog.menu_items.insert(item.id, item.clone());
                Ok(item)
            })
            .await;

        if result.is_ok() {
            self.menu_cache.invalidate_all();
        }
        result
    }

    /// Apply a partial update to a menu item.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] for a missing item and
    /// [`AppError::Validation`] / [`AppError::BadRequest`] for invalid
    /// replacement pricing.
    #[instrument(skip(self, patch), fields(%item_id))]
    pub async fn update_menu_item(
        &self,
        item_id: MenuItemId,
        patch: MenuItemPatch,
    ) -> Result<MenuItem> {
        if let Some(pricing) = &patch.pricing {
            pricing.validate()?;
        }

        let result = self
            .store
            .write(|catalog| {
                let item = catalog
                    .menu_items
                    .get_mut(&item_id)
                    .ok_or_else(|| AppError::NotFound(format!("menu item {item_id}")))?;
                if let Some(pricing) = patch.pricing {
                    check_pricing_shape(item.category, &pricing)?;
                    item.pricing = pricing;
                }
                if let Some(description) = patch.description {
                    item.description = description;
                }
                if let Some(available) = patch.available {
                    item.available = available;
                }
                if let Some(image_path) = patch.image_path {
                    item.image_path = Some(image_path);
                }
                Ok(item.clone())
            })
            .await;

        if result.is_ok() {
            self.menu_cache.invalidate_all();
        }
        result
    }

    /// Delete a menu item.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the item does not exist.
    #[instrument(skip(self), fields(%item_id))]
    pub async fn delete_menu_item(&self, item_id: MenuItemId) -> Result<MenuItem> {
        let result = self
            .store
            .write(|catalog| {
                catalog
                    .menu_items
                    .remove(&item_id)
                    .ok_or_else(|| AppError::NotFound(format!("menu item {item_id}")))
            })
            .await;

        if result.is_ok() {
            self.menu_cache.invalidate_all();
        }
        result
    }

    // =========================================================================
    // Delivery intake
    // =========================================================================

    /// Record a supplier delivery, appending one batch per line item.
    ///
    /// All line items are validated against the ingredient collection before
    /// any batch is appended; the first missing ingredient aborts the whole
    /// intake with no delivery record left behind.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] for an empty item list or a
    /// non-positive quantity, and [`AppError::NotFound`] naming the first
    /// missing ingredient.
    #[instrument(skip(self, input), fields(supplier = %input.supplier, items = input.items.len()))]
    pub async fn apply_delivery(&self, input: DeliveryInput) -> Result<Delivery> {
        if input.items.is_empty() {
            return Err(AppError::Validation(ValidationError::MissingField {
                field: "items",
            }));
        }
        for line in &input.items {
            if line.quantity <= Decimal::ZERO {
                return Err(ValidationError::NonPositiveQuantity {
                    quantity: line.quantity,
                }
                .into());
            }
        }

        let now = self.clock.now();
        let result = self
            .store
            .write(|catalog| {
                if let Some(key) = &input.idempotency_key
                    && let Some(existing) = catalog.delivery_keys.get(key)
                    && let Some(delivery) = catalog.deliveries.get(existing)
                {
                    return Ok(delivery.clone());
                }

                // Validate every line before the first batch is appended.
                let mut items = Vec::with_capacity(input.items.len());
                for line in &input.items {
                    let ingredient = catalog.ingredients.get(&line.ingredient_id).ok_or_else(
                        || AppError::NotFound(format!("ingredient {}", line.ingredient_id)),
                    )?;
                    items.push(DeliveryItem {
                        ingredient_id: line.ingredient_id,
                        ingredient_name: ingredient.name.clone(),
                        quantity: line.quantity,
                        unit_per_pcs: line.unit_per_pcs,
                        price: line.price,
                        expiration_date: line.expiration_date,
                    });
                }

                let delivery = Delivery {
                    id: DeliveryId::new(),
                    supplier: input.supplier.clone(),
                    delivery_number: input.delivery_number.clone(),
                    delivery_date: input.delivery_date,
                    address: input.address.clone(),
                    items,
                    idempotency_key: input.idempotency_key.clone(),
                    created_at: now,
                };

                for line in &delivery.items {
                    if let Some(ingredient) = catalog.ingredients.get_mut(&line.ingredient_id) {
                        ingredient.batches.push(Batch::new(
                            line.quantity,
                            line.expiration_date,
                            now,
                            Some(delivery.id),
                        ));
                    }
                }
                if let Some(key) = &delivery.idempotency_key {
                    catalog.delivery_keys.insert(key.clone(), delivery.id);
                }
                catalog.deliveries.insert(delivery.id, delivery.clone());
                Ok(delivery)
            })
            .await;

        if result.is_ok() {
            self.menu_cache.invalidate_all();
        }
        result
    }

    // =========================================================================
    // Order lifecycle
    // =========================================================================

    /// Place a pending order. No stock moves until completion.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Validation`] for an empty or zero-quantity line,
    /// [`AppError::NotFound`] for a missing menu item, and
    /// [`AppError::BadRequest`] for a size the item does not offer.
    #[instrument(skip(self, input), fields(table = input.table_number, lines = input.items.len()))]
    pub async fn place_order(&self, input: OrderInput) -> Result<Order> {
        if input.items.is_empty() {
            return Err(AppError::Validation(ValidationError::MissingField {
                field: "items",
            }));
        }
        for line in &input.items {
            if line.quantity == 0 {
                return Err(ValidationError::NonPositiveQuantity {
                    quantity: Decimal::ZERO,
                }
                .into());
            }
        }

        let now = self.clock.now();
        self.store
            .write(|catalog| {
                if let Some(key) = &input.idempotency_key
                    && let Some(existing) = catalog.order_keys.get(key)
                    && let Some(order) = catalog.orders.get(existing)
                {
                    return Ok(order.clone());
                }

                let mut lines = Vec::with_capacity(input.items.len());
                for line in &input.items {
                    let item = catalog.menu_items.get(&line.menu_item_id).ok_or_else(|| {
                        AppError::NotFound(format!("menu item {}", line.menu_item_id))
                    })?;
                    let size = item
                        .pricing
                        .size_variants()
                        .into_iter()
                        .find(|size| size.label == line.size)
                        .ok_or_else(|| {
                            AppError::BadRequest(format!(
                                "{} is not offered in size {}",
                                item.name, line.size
                            ))
                        })?;
                    lines.push(OrderLine {
                        menu_item_id: item.id,
                        menu_item_name: item.name.clone(),
                        size: line.size,
                        quantity: line.quantity,
                        unit_price: size.price.amount(),
                    });
                }

                let order = Order {
                    id: OrderId::new(),
                    table_number: input.table_number,
                    customer_name: input.customer_name.clone(),
                    lines,
                    status: OrderStatus::Pending,
                    idempotency_key: input.idempotency_key.clone(),
                    created_at: now,
                    updated_at: now,
                };
                if let Some(key) = &order.idempotency_key {
                    catalog.order_keys.insert(key.clone(), order.id);
                }
                catalog.orders.insert(order.id, order.clone());
                Ok(order)
            })
            .await
    }

    /// Complete an order: re-validate availability at commit time, consume
    /// stock once per distinct ingredient (quantities aggregated across
    /// lines), and append a transaction record.
    ///
    /// Runs entirely inside one store write section: a conflicting commit
    /// leaves the ledger byte-for-byte unchanged, and two racing commits
    /// cannot both pass the same availability check.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] for a missing order,
    /// [`AppError::Conflict`] for an already-terminal order, and
    /// [`AppError::StockConflict`] when any line is no longer satisfiable.
    #[instrument(skip(self), fields(%order_id))]
    pub async fn commit_order(&self, order_id: OrderId) -> Result<Order> {
        let as_of = self.clock.now();
        let result = self
            .store
            .write(|catalog| {
                let order = catalog
                    .orders
                    .get(&order_id)
                    .ok_or_else(|| AppError::NotFound(format!("order {order_id}")))?
                    .clone();
                if order.status.is_terminal() {
                    return Err(AppError::Conflict(format!(
                        "order {order_id} is already {}",
                        order.status
                    )));
                }

                let (aggregate, mut conflicts) = validate_lines(catalog, &order);
                let shortfalls = aggregate_shortfalls(catalog, &aggregate, as_of);
                if !shortfalls.is_empty() {
                    conflicts.extend(attribute_shortfalls(catalog, &order, &shortfalls));
                }
                if !conflicts.is_empty() {
                    return Err(AppError::StockConflict(conflicts));
                }

                // The aggregate was checked above under this same guard, so
                // each draw is satisfiable and the loop cannot partially fail.
                for (ingredient_id, needed) in aggregate {
                    let ingredient = catalog
                        .ingredients
                        .get_mut(&ingredient_id)
                        .ok_or_else(|| AppError::Internal("ingredient vanished mid-commit".to_string()))?;
                    consume_from(ingredient, needed, as_of)?;
                }

                finalize_order(catalog, order_id, OrderStatus::Completed, as_of)
            })
            .await;

        if result.is_ok() {
            self.menu_cache.invalidate_all();
        }
        result
    }

    /// Cancel a pending order. Stock is consumed only at completion, so
    /// cancellation releases nothing; the transaction record is still
    /// appended.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] for a missing order and
    /// [`AppError::Conflict`] for an already-terminal one.
    #[instrument(skip(self), fields(%order_id))]
    pub async fn cancel_order(&self, order_id: OrderId) -> Result<Order> {
        let as_of = self.clock.now();
        self.store
            .write(|catalog| {
                let order = catalog
                    .orders
                    .get(&order_id)
                    .ok_or_else(|| AppError::NotFound(format!("order {order_id}")))?;
                if order.status.is_terminal() {
                    return Err(AppError::Conflict(format!(
                        "order {order_id} is already {}",
                        order.status
                    )));
                }
                finalize_order(catalog, order_id, OrderStatus::Cancelled, as_of)
            })
            .await
    }
}

/// Reject pricing whose shape does not match the category: ramen items carry
/// explicit sizes, everything else a flat price.
fn check_pricing_shape(category: Category, pricing: &Pricing) -> Result<()> {
    match (category.is_sized(), pricing) {
        (true, Pricing::Sized { .. }) | (false, Pricing::Flat { .. }) => Ok(()),
        (true, Pricing::Flat { .. }) => Err(AppError::BadRequest(
            "ramen items require explicit size variants".to_string(),
        )),
        (false, Pricing::Sized { .. }) => Err(AppError::BadRequest(
            "only ramen items carry size variants".to_string(),
        )),
    }
}

/// Per-line catalog checks, plus the per-ingredient aggregate requirement
/// across all lines (so shared ingredients are not double-booked).
fn validate_lines(
    catalog: &Catalog,
    order: &Order,
) -> (HashMap<IngredientId, Decimal>, Vec<OrderConflict>) {
    let mut aggregate: HashMap<IngredientId, Decimal> = HashMap::new();
    let mut conflicts = Vec::new();

    for line in &order.lines {
        let Some(item) = catalog.menu_items.get(&line.menu_item_id) else {
            conflicts.push(OrderConflict {
                menu_item: line.menu_item_name.clone(),
                size: line.size,
                reasons: Vec::new(),
            });
            continue;
        };
        if !item.available {
            conflicts.push(OrderConflict {
                menu_item: line.menu_item_name.clone(),
                size: line.size,
                reasons: Vec::new(),
            });
            continue;
        }
        let Some(size) = item
            .pricing
            .size_variants()
            .into_iter()
            .find(|size| size.label == line.size)
        else {
            conflicts.push(OrderConflict {
                menu_item: line.menu_item_name.clone(),
                size: line.size,
                reasons: Vec::new(),
            });
            continue;
        };
        for requirement in &size.requirements {
            *aggregate.entry(requirement.ingredient_id).or_default() +=
                requirement.quantity * Decimal::from(line.quantity);
        }
    }

    (aggregate, conflicts)
}

/// Ingredients whose current stock cannot cover the aggregated requirement.
fn aggregate_shortfalls(
    catalog: &Catalog,
    aggregate: &HashMap<IngredientId, Decimal>,
    as_of: DateTime<Utc>,
) -> HashMap<IngredientId, UnmetRequirement> {
    let mut shortfalls = HashMap::new();
    for (&ingredient_id, &needed) in aggregate {
        match catalog.ingredients.get(&ingredient_id) {
            Some(ingredient) => {
                let available = ingredient.total_available(as_of);
                if available < needed {
                    shortfalls.insert(
                        ingredient_id,
                        UnmetRequirement {
                            name: ingredient.name.clone(),
                            required: needed,
                            available,
                            unit: Some(ingredient.unit),
                        },
                    );
                }
            }
            None => {
                shortfalls.insert(
                    ingredient_id,
                    UnmetRequirement {
                        name: format!("missing ingredient {ingredient_id}"),
                        required: needed,
                        available: Decimal::ZERO,
                        unit: None,
                    },
                );
            }
        }
    }
    shortfalls
}

/// Attach each aggregate shortfall to every order line that draws on the
/// short ingredient, for diagnostic display.
fn attribute_shortfalls(
    catalog: &Catalog,
    order: &Order,
    shortfalls: &HashMap<IngredientId, UnmetRequirement>,
) -> Vec<OrderConflict> {
    let mut conflicts = Vec::new();
    for line in &order.lines {
        let Some(item) = catalog.menu_items.get(&line.menu_item_id) else {
            continue;
        };
        let Some(size) = item
            .pricing
            .size_variants()
            .into_iter()
            .find(|size| size.label == line.size)
        else {
            continue;
        };
        let reasons: Vec<UnmetRequirement> = size
            .requirements
            .iter()
            .filter_map(|requirement| shortfalls.get(&requirement.ingredient_id).cloned())
            .collect();
        if !reasons.is_empty() {
            conflicts.push(OrderConflict {
                menu_item: line.menu_item_name.clone(),
                size: line.size,
                reasons,
            });
        }
    }
    conflicts
}

/// Apply the terminal status and append the transaction audit record.
fn finalize_order(
    catalog: &mut Catalog,
    order_id: OrderId,
    status: OrderStatus,
    as_of: DateTime<Utc>,
) -> Result<Order> {
    let order = catalog
        .orders
        .get_mut(&order_id)
        .ok_or_else(|| AppError::NotFound(format!("order {order_id}")))?;
    order.status = status;
    order.updated_at = as_of;
    let order = order.clone();

    catalog.transactions.push(Transaction {
        id: TransactionId::new(),
        order_id: order.id,
        table_number: order.table_number,
        customer_name: order.customer_name.clone(),
        total: order.total(),
        final_status: status,
        recorded_at: as_of,
    });
    Ok(order)
}
