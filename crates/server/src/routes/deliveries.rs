//! Delivery intake route handlers.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use rust_decimal::Decimal;
use serde::Serialize;

use kombu_core::Delivery;

use crate::error::Result;
use crate::state::AppState;
use crate::stock::DeliveryInput;

/// Delivery with its computed line-item total.
#[derive(Debug, Serialize)]
pub struct DeliveryView {
    #[serde(flatten)]
    pub delivery: Delivery,
    pub total_cost: Decimal,
}

impl From<Delivery> for DeliveryView {
    fn from(delivery: Delivery) -> Self {
        let total_cost = delivery.total_cost();
        Self {
            delivery,
            total_cost,
        }
    }
}

/// `GET /deliveries` - intake history, newest first.
pub async fn list(State(state): State<AppState>) -> Json<Vec<DeliveryView>> {
    let mut deliveries = state
        .store()
        .read(|catalog| catalog.deliveries.values().cloned().collect::<Vec<_>>())
        .await;
    deliveries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Json(deliveries.into_iter().map(DeliveryView::from).collect())
}

/// `POST /deliveries` - record a delivery. All line items must reference
/// existing ingredients; the first miss aborts the whole intake and leaves
/// no delivery record.
pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<DeliveryInput>,
) -> Result<(StatusCode, Json<DeliveryView>)> {
    let delivery = state.mutator().apply_delivery(input).await?;
    Ok((StatusCode::CREATED, Json(delivery.into())))
}
