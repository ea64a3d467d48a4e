//! The stock engine: batch ledger, availability resolver, stock mutator.
//!
//! # Architecture
//!
//! All three services share the [`MemoryStore`](crate::store::MemoryStore)
//! and the injected [`Clock`](crate::clock::Clock). Reads are pure; every
//! check-then-mutate sequence runs inside one store write section, and every
//! successful write to menu, ingredient, or batch state invalidates the menu
//! view cache before the call returns.
//!
//! - [`ledger`] - per-ingredient batch operations: totals, add/remove,
//!   nearest-expiry-first consumption, explicit-expiry release
//! - [`resolver`] - pure per-size/per-item availability over the catalog
//! - [`mutator`] - catalog maintenance, delivery intake, order lifecycle

pub mod ledger;
pub mod mutator;
pub mod resolver;

pub use ledger::BatchLedger;
pub use mutator::{
    DeliveryInput, DeliveryLineInput, MenuItemInput, MenuItemPatch, OrderInput, OrderLineInput,
    StockMutator,
};
pub use resolver::AvailabilityResolver;
