//! Menu route handlers.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;

use kombu_core::{MenuFilter, MenuItem, MenuItemId, ResolvedMenuItem};

use crate::error::Result;
use crate::state::AppState;
use crate::stock::{MenuItemInput, MenuItemPatch};

/// `GET /menu` - the availability-annotated menu, served from the view
/// cache when fresh.
pub async fn resolved(
    State(state): State<AppState>,
    Query(filter): Query<MenuFilter>,
) -> Result<Json<Vec<ResolvedMenuItem>>> {
    let resolver = state.resolver();
    let resolve_filter = filter.clone();
    let payload = state
        .menu_cache()
        .get_or_resolve(&filter, || async move {
            resolver.resolve_menu(&resolve_filter).await
        })
        .await?;
    Ok(Json((*payload).clone()))
}

/// `GET /menu/items` - the raw catalog, no availability annotation.
pub async fn list(State(state): State<AppState>) -> Json<Vec<MenuItem>> {
    let mut items = state
        .store()
        .read(|catalog| catalog.menu_items.values().cloned().collect::<Vec<_>>())
        .await;
    items.sort_by(|a, b| a.name.cmp(&b.name));
    Json(items)
}

/// `POST /menu` - create a menu item.
pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<MenuItemInput>,
) -> Result<(StatusCode, Json<MenuItem>)> {
    let item = state.mutator().create_menu_item(input).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

/// `PATCH /menu/{id}` - partial update, including the manual availability
/// flag.
pub async fn update(
    State(state): State<AppState>,
    Path(item_id): Path<MenuItemId>,
    Json(patch): Json<MenuItemPatch>,
) -> Result<Json<MenuItem>> {
    let item = state.mutator().update_menu_item(item_id, patch).await?;
    Ok(Json(item))
}

/// `DELETE /menu/{id}`.
pub async fn remove(
    State(state): State<AppState>,
    Path(item_id): Path<MenuItemId>,
) -> Result<Json<MenuItem>> {
    let item = state.mutator().delete_menu_item(item_id).await?;
    Ok(Json(item))
}
