//! Ingredient and batch route handlers.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use kombu_core::{Batch, Ingredient, IngredientId, Unit};

use crate::error::Result;
use crate::state::AppState;

/// Stock summary for the ingredient listing.
#[derive(Debug, Serialize)]
pub struct IngredientSummary {
    pub id: IngredientId,
    pub name: String,
    pub unit: Unit,
    pub total_available: Decimal,
    pub batch_count: usize,
    pub expired_batches: usize,
    pub expiring_soon_batches: usize,
}

/// Full ingredient detail with batches.
#[derive(Debug, Serialize)]
pub struct IngredientDetail {
    #[serde(flatten)]
    pub ingredient: Ingredient,
    pub total_available: Decimal,
    pub expired_batches: usize,
    pub expiring_soon_batches: usize,
}

#[derive(Debug, Deserialize)]
pub struct CreateIngredientRequest {
    pub name: String,
    pub unit: Unit,
}

#[derive(Debug, Deserialize)]
pub struct NewBatchRequest {
    pub quantity: Decimal,
    pub expires_at: DateTime<Utc>,
}

fn summarize(ingredient: &Ingredient, as_of: DateTime<Utc>) -> IngredientSummary {
    IngredientSummary {
        id: ingredient.id,
        name: ingredient.name.clone(),
        unit: ingredient.unit,
        total_available: ingredient.total_available(as_of),
        batch_count: ingredient.batches.len(),
        expired_batches: ingredient.expired_batches(as_of),
        expiring_soon_batches: ingredient.expiring_soon_batches(as_of),
    }
}

/// `GET /ingredients` - stock summaries, sorted by name.
pub async fn list(State(state): State<AppState>) -> Json<Vec<IngredientSummary>> {
    let as_of = state.clock().now();
    let mut summaries = state
        .store()
        .read(|catalog| {
            catalog
                .ingredients
                .values()
                .map(|ingredient| summarize(ingredient, as_of))
                .collect::<Vec<_>>()
        })
        .await;
    summaries.sort_by(|a, b| a.name.cmp(&b.name));
    Json(summaries)
}

/// `POST /ingredients` - create an ingredient with no stock.
pub async fn create(
    State(state): State<AppState>,
    Json(request): Json<CreateIngredientRequest>,
) -> Result<(StatusCode, Json<Ingredient>)> {
    let ingredient = state
        .mutator()
        .create_ingredient(request.name, request.unit)
        .await?;
    Ok((StatusCode::CREATED, Json(ingredient)))
}

/// `GET /ingredients/{id}` - full batch detail with expiry summary.
pub async fn show(
    State(state): State<AppState>,
    Path(ingredient_id): Path<IngredientId>,
) -> Result<Json<IngredientDetail>> {
    let as_of = state.clock().now();
    let detail = state
        .store()
        .read(|catalog| {
            catalog.ingredients.get(&ingredient_id).map(|ingredient| {
                IngredientDetail {
                    total_available: ingredient.total_available(as_of),
                    expired_batches: ingredient.expired_batches(as_of),
                    expiring_soon_batches: ingredient.expiring_soon_batches(as_of),
                    ingredient: ingredient.clone(),
                }
            })
        })
        .await
        .ok_or_else(|| crate::error::AppError::NotFound(format!("ingredient {ingredient_id}")))?;
    Ok(Json(detail))
}

/// `DELETE /ingredients/{id}` - delete the ingredient and all its batches.
pub async fn remove(
    State(state): State<AppState>,
    Path(ingredient_id): Path<IngredientId>,
) -> Result<Json<Ingredient>> {
    let ingredient = state.mutator().delete_ingredient(ingredient_id).await?;
    Ok(Json(ingredient))
}

/// `POST /ingredients/{id}/batches` - manual stock entry. The expiry is
/// part of the request; the engine never invents one.
pub async fn add_batch(
    State(state): State<AppState>,
    Path(ingredient_id): Path<IngredientId>,
    Json(request): Json<NewBatchRequest>,
) -> Result<(StatusCode, Json<Batch>)> {
    let batch = state
        .ledger()
        .add_batch(ingredient_id, request.quantity, request.expires_at, None)
        .await?;
    Ok((StatusCode::CREATED, Json(batch)))
}

/// `DELETE /ingredients/{id}/batches/{index}` - remove a batch by position,
/// returning it.
pub async fn remove_batch(
    State(state): State<AppState>,
    Path((ingredient_id, index)): Path<(IngredientId, usize)>,
) -> Result<Json<Batch>> {
    let batch = state.ledger().remove_batch_at(ingredient_id, index).await?;
    Ok(Json(batch))
}
