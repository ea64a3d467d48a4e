//! Kombu server library.
//!
//! This crate provides the stock engine and its HTTP boundary as a library,
//! allowing it to be tested and reused.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod auth;
pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod routes;
pub mod state;
pub mod stock;
pub mod store;
