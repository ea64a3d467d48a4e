//! Order lifecycle route handlers.

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use kombu_core::{Order, OrderId, OrderLine, OrderStatus, Transaction};

use crate::error::{AppError, Result};
use crate::state::AppState;
use crate::stock::OrderInput;

/// Order with its computed bill total.
#[derive(Debug, Serialize)]
pub struct OrderView {
    pub id: OrderId,
    pub table_number: u32,
    pub customer_name: String,
    pub lines: Vec<OrderLine>,
    pub status: OrderStatus,
    pub total: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Order> for OrderView {
    fn from(order: Order) -> Self {
        let total = order.total();
        Self {
            id: order.id,
            table_number: order.table_number,
            customer_name: order.customer_name,
            lines: order.lines,
            status: order.status,
            total,
            created_at: order.created_at,
            updated_at: order.updated_at,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct OrderListQuery {
    pub status: Option<OrderStatus>,
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: OrderStatus,
}

/// `GET /orders` - orders, optionally filtered by status, newest first.
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<OrderListQuery>,
) -> Json<Vec<OrderView>> {
    let mut orders: Vec<OrderView> = state
        .store()
        .read(|catalog| {
            catalog
                .orders
                .values()
                .filter(|order| query.status.is_none_or(|status| order.status == status))
                .cloned()
                .map(OrderView::from)
                .collect::<Vec<_>>()
        })
        .await;
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Json(orders)
}

/// `POST /orders` - place a pending order. No stock moves here; commit
/// happens on the status transition to `completed`.
pub async fn place(
    State(state): State<AppState>,
    Json(input): Json<OrderInput>,
) -> Result<(StatusCode, Json<OrderView>)> {
    let order = state.mutator().place_order(input).await?;
    Ok((StatusCode::CREATED, Json(order.into())))
}

/// `PATCH /orders/{id}/status` - terminal transition. `completed` commits
/// (re-validates availability, consumes stock); `cancelled` just closes the
/// order. Either appends a transaction record.
pub async fn transition(
    State(state): State<AppState>,
    Path(order_id): Path<OrderId>,
    Json(request): Json<StatusRequest>,
) -> Result<Json<OrderView>> {
    let order = match request.status {
        OrderStatus::Completed => state.mutator().commit_order(order_id).await?,
        OrderStatus::Cancelled => state.mutator().cancel_order(order_id).await?,
        OrderStatus::Pending => {
            return Err(AppError::BadRequest(
                "an order cannot transition back to pending".to_string(),
            ));
        }
    };
    Ok(Json(order.into()))
}

/// `GET /transactions` - terminal-order audit records, newest first.
pub async fn transactions(State(state): State<AppState>) -> Json<Vec<Transaction>> {
    let mut records = state
        .store()
        .read(|catalog| catalog.transactions.clone())
        .await;
    records.sort_by(|a, b| b.recorded_at.cmp(&a.recorded_at));
    Json(records)
}
