//! Kombu Core - Shared domain types for the stock engine.
//!
//! This crate provides the records and value types used across the Kombu
//! components:
//! - `server` - The stock/availability engine and its HTTP boundary
//! - `integration-tests` - End-to-end scenario tests
//!
//! # Architecture
//!
//! The core crate contains only types and validation - no I/O, no store
//! access, no HTTP. This keeps it lightweight and allows it to be used
//! anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, units of measure, money, statuses
//! - [`ingredient`] - Ingredients and expiry-dated stock batches
//! - [`menu`] - Menu items, size variants, ingredient requirements
//! - [`delivery`] - Delivery intake records
//! - [`order`] - Orders and transaction audit records
//! - [`availability`] - Resolved (derived) menu availability views

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod availability;
pub mod delivery;
pub mod ingredient;
pub mod menu;
pub mod order;
pub mod types;

pub use availability::{MenuFilter, ResolvedMenuItem, ResolvedSize, UnmetRequirement};
pub use delivery::{Delivery, DeliveryItem};
pub use ingredient::{Batch, Ingredient};
pub use menu::{
    Category, IngredientRequirement, MenuItem, Pricing, SizeLabel, SizeVariant, ValidationError,
};
pub use order::{Order, OrderLine, Transaction};
pub use types::*;
