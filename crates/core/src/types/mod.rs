//! Core value types for Kombu.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod money;
pub mod status;
pub mod unit;

pub use id::*;
pub use money::Price;
pub use status::OrderStatus;
pub use unit::{Unit, UnitParseError};
