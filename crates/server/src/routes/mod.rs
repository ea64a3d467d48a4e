//! HTTP route handlers for the stock engine.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                              - Health check
//!
//! # Menu
//! GET    /menu                                - Resolved, availability-annotated menu (cached)
//! POST   /menu                                - Create menu item
//! GET    /menu/items                          - Raw catalog listing
//! PATCH  /menu/{id}                           - Update fields / manual availability flag
//! DELETE /menu/{id}                           - Delete menu item
//!
//! # Ingredients
//! GET    /ingredients                         - Stock summaries
//! POST   /ingredients                         - Create ingredient
//! GET    /ingredients/{id}                    - Full batch detail with expiry summary
//! DELETE /ingredients/{id}                    - Delete ingredient and its batches
//! POST   /ingredients/{id}/batches            - Manual stock entry (explicit expiry)
//! DELETE /ingredients/{id}/batches/{index}    - Remove batch by position
//!
//! # Deliveries
//! GET    /deliveries                          - Intake history
//! POST   /deliveries                          - Record delivery (all-or-nothing)
//!
//! # Orders
//! GET    /orders                              - Orders, optionally filtered by status
//! POST   /orders                              - Place pending order
//! PATCH  /orders/{id}/status                  - Complete (commit) or cancel
//! GET    /transactions                        - Terminal-order audit records
//!
//! # Images
//! GET    /images/{file}                       - Image bytes through the LRU cache
//! DELETE /images/{file}                       - Drop cached bytes (image replaced/deleted)
//!
//! # Cache administration
//! POST   /admin/cache/invalidate              - Drop every menu view entry
//! GET    /admin/cache/stats                   - Hit/miss readout for both caches
//! ```
//!
//! Mutating and `/admin` routes pass through the authentication middleware;
//! reads are public.

pub mod admin;
pub mod deliveries;
pub mod images;
pub mod ingredients;
pub mod menu;
pub mod orders;

use axum::{
    Router, middleware,
    routing::{delete, get, patch, post},
};

use crate::auth;
use crate::state::AppState;

/// Assemble the full application router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/menu", get(menu::resolved).post(menu::create))
        .route("/menu/items", get(menu::list))
        .route("/menu/{id}", patch(menu::update).delete(menu::remove))
        .route(
            "/ingredients",
            get(ingredients::list).post(ingredients::create),
        )
        .route(
            "/ingredients/{id}",
            get(ingredients::show).delete(ingredients::remove),
        )
        .route("/ingredients/{id}/batches", post(ingredients::add_batch))
        .route(
            "/ingredients/{id}/batches/{index}",
            delete(ingredients::remove_batch),
        )
        .route("/deliveries", get(deliveries::list).post(deliveries::create))
        .route("/orders", get(orders::list).post(orders::place))
        .route("/orders/{id}/status", patch(orders::transition))
        .route("/transactions", get(orders::transactions))
        .route("/images/{file}", get(images::show).delete(images::remove))
        .route("/admin/cache/invalidate", post(admin::invalidate))
        .route("/admin/cache/stats", get(admin::stats))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_auth,
        ))
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}
