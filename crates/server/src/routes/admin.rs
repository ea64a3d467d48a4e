//! Cache administration route handlers.

use axum::Json;
use axum::extract::State;
use serde::Serialize;
use serde_json::json;

use crate::cache::CacheStats;
use crate::state::AppState;

/// Hit/miss readout for both caches.
#[derive(Debug, Serialize)]
pub struct AdminStats {
    pub menu: CacheStats,
    pub image: CacheStats,
}

/// `POST /admin/cache/invalidate` - drop every menu view entry. The image
/// cache is content-addressed and not touched here.
pub async fn invalidate(State(state): State<AppState>) -> Json<serde_json::Value> {
    state.menu_cache().invalidate_all();
    tracing::info!("menu view cache invalidated by operator");
    Json(json!({ "invalidated": true }))
}

/// `GET /admin/cache/stats`.
pub async fn stats(State(state): State<AppState>) -> Json<AdminStats> {
    Json(AdminStats {
        menu: state.menu_cache().stats().await,
        image: state.image_cache().stats(),
    })
}
