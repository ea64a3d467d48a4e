//! Menu items, size variants, and ingredient requirements.
//!
//! Pricing is a tagged variant rather than a category-string branch: ramen
//! items carry explicit size variants (Classic/Deluxe/Supreme), every other
//! category carries a flat price that collapses internally to one
//! synthesized Classic size. Consumers that iterate sizes never see the
//! difference.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{IngredientId, MenuItemId, Price};

/// Menu category. `Ramen` is the distinguished multi-size category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Ramen,
    RiceBowl,
    Side,
    Drink,
    Dessert,
}

impl Category {
    /// Whether items in this category carry explicit size variants.
    #[must_use]
    pub const fn is_sized(self) -> bool {
        matches!(self, Self::Ramen)
    }
}

/// Size label for ramen variants. Non-ramen items synthesize `Classic`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizeLabel {
    Classic,
    Deluxe,
    Supreme,
}

impl std::fmt::Display for SizeLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Classic => write!(f, "Classic"),
            Self::Deluxe => write!(f, "Deluxe"),
            Self::Supreme => write!(f, "Supreme"),
        }
    }
}

/// A (ingredient, required quantity) pair on a size variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngredientRequirement {
    pub ingredient_id: IngredientId,
    /// Required quantity in the ingredient's unit. Strictly positive.
    pub quantity: Decimal,
}

/// A priced size variant with its ingredient requirements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SizeVariant {
    pub label: SizeLabel,
    pub price: Price,
    pub requirements: Vec<IngredientRequirement>,
}

/// Pricing shape of a menu item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Pricing {
    /// Explicit size variants (ramen).
    Sized { sizes: Vec<SizeVariant> },
    /// Single flat price (everything else).
    Flat {
        price: Price,
        requirements: Vec<IngredientRequirement>,
    },
}

impl Pricing {
    /// View the pricing as size variants, synthesizing a single `Classic`
    /// size for flat-priced items.
    #[must_use]
    pub fn size_variants(&self) -> Vec<SizeVariant> {
        match self {
            Self::Sized { sizes } => sizes.clone(),
            Self::Flat {
                price,
                requirements,
            } => vec![SizeVariant {
                label: SizeLabel::Classic,
                price: *price,
                requirements: requirements.clone(),
            }],
        }
    }

    /// Validate pricing shape: non-empty size list, unique labels, strictly
    /// positive requirement quantities.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] on the first violation found.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            Self::Flat { requirements, .. } => validate_requirements(requirements),
            Self::Sized { sizes } => {
                if sizes.is_empty() {
                    return Err(ValidationError::NoSizes);
                }
                let mut seen = Vec::with_capacity(sizes.len());
                for size in sizes {
                    if seen.contains(&size.label) {
                        return Err(ValidationError::DuplicateSizeLabel { label: size.label });
                    }
                    seen.push(size.label);
                    validate_requirements(&size.requirements)?;
                }
                Ok(())
            }
        }
    }

    /// Base price: the Classic size if present, else the minimum price.
    #[must_use]
    pub fn base_price(&self) -> Option<Price> {
        match self {
            Self::Flat { price, .. } => Some(*price),
            Self::Sized { sizes } => sizes
                .iter()
                .find(|s| s.label == SizeLabel::Classic)
                .map(|s| s.price)
                .or_else(|| sizes.iter().map(|s| s.price).min()),
        }
    }
}

/// Malformed menu or stock input, rejected before any mutation occurs.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("name must not be empty")]
    EmptyName,
    #[error("price must be positive, got {amount}")]
    NonPositivePrice { amount: Decimal },
    #[error("quantity must be positive, got {quantity}")]
    NonPositiveQuantity { quantity: Decimal },
    #[error("a sized menu item needs at least one size variant")]
    NoSizes,
    #[error("duplicate size label: {label}")]
    DuplicateSizeLabel { label: SizeLabel },
    #[error("ingredient requirement quantity must be positive, got {quantity}")]
    NonPositiveRequirement { quantity: Decimal },
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },
}

/// A catalog menu item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MenuItem {
    pub id: MenuItemId,
    /// Unique across the catalog.
    pub name: String,
    pub description: String,
    pub category: Category,
    /// Manual override: when false the item is unavailable regardless of
    /// stock.
    pub available: bool,
    /// Image resource path, served through the image cache.
    pub image_path: Option<String>,
    pub pricing: Pricing,
}

impl MenuItem {
    /// Create a validated menu item.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError`] on an empty name, an empty size list,
    /// duplicate size labels, or any non-positive requirement quantity.
    /// Definition time is the only place requirement quantities are
    /// checked; resolution assumes them valid.
    pub fn new(
        name: String,
        description: String,
        category: Category,
        pricing: Pricing,
        image_path: Option<String>,
    ) -> Result<Self, ValidationError> {
        if name.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }
        pricing.validate()?;

        Ok(Self {
            id: MenuItemId::new(),
            name,
            description,
            category,
            available: true,
            image_path,
            pricing,
        })
    }
}

fn validate_requirements(requirements: &[IngredientRequirement]) -> Result<(), ValidationError> {
    for requirement in requirements {
        if requirement.quantity <= Decimal::ZERO {
            return Err(ValidationError::NonPositiveRequirement {
                quantity: requirement.quantity,
            });
        }
    }
    Ok(())
}
