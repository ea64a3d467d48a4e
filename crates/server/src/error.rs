//! Unified error handling for the stock engine and its HTTP boundary.
//!
//! Every error carries a stable kind (used by clients for dispatch) and a
//! human-readable message; the boundary decides the HTTP status. Errors from
//! lower layers propagate unchanged - in particular the cache layer never
//! converts an error into a stale-but-successful response.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

use kombu_core::{SizeLabel, UnmetRequirement, ValidationError};

/// A line of an order that failed commit-time re-validation.
#[derive(Debug, Clone, Serialize)]
pub struct OrderConflict {
    pub menu_item: String,
    pub size: SizeLabel,
    pub reasons: Vec<UnmetRequirement>,
}

/// Application-level error type for the engine and its routes.
#[derive(Debug, Error)]
pub enum AppError {
    /// Referenced entity does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Malformed input, rejected before any mutation occurred.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// A ledger draw was short on stock; state is unchanged.
    #[error("insufficient stock of {ingredient}: requested {requested}, available {available}")]
    InsufficientStock {
        ingredient: String,
        requested: Decimal,
        available: Decimal,
    },

    /// Commit-time availability re-check failed; no consumption happened.
    #[error("order no longer satisfiable: {} conflicting line(s)", .0.len())]
    StockConflict(Vec<OrderConflict>),

    /// Batch index out of range on positional delete.
    #[error("invalid batch index {index} (batch count {len})")]
    InvalidIndex { index: usize, len: usize },

    /// State conflict: duplicate unique name, terminal status transition.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Bad request from client (malformed path segment, unknown value).
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Caller failed the injected authentication policy.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Stable machine-readable kind.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::Validation(_) => "validation",
            Self::InsufficientStock { .. } => "insufficient_stock",
            Self::StockConflict(_) => "stock_conflict",
            Self::InvalidIndex { .. } => "invalid_index",
            Self::Conflict(_) => "conflict",
            Self::BadRequest(_) => "bad_request",
            Self::Unauthorized(_) => "unauthorized",
            Self::Internal(_) => "internal",
        }
    }

    const fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Validation(_) | Self::InvalidIndex { .. } | Self::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::InsufficientStock { .. } | Self::StockConflict(_) | Self::Conflict(_) => {
                StatusCode::CONFLICT
            }
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if matches!(self, Self::Internal(_)) {
            tracing::error!(error = %self, "request error");
        } else {
            tracing::debug!(error = %self, kind = self.kind(), "request rejected");
        }

        let status = self.status();
        let mut body = json!({
            "error": self.kind(),
            "message": self.to_string(),
        });
        if let Self::StockConflict(conflicts) = &self
            && let Ok(details) = serde_json::to_value(conflicts)
        {
            body["details"] = details;
        }

        (status, Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_are_stable() {
        assert_eq!(AppError::NotFound("x".to_string()).kind(), "not_found");
        assert_eq!(
            AppError::StockConflict(Vec::new()).kind(),
            "stock_conflict"
        );
        assert_eq!(
            AppError::InvalidIndex { index: 9, len: 2 }.kind(),
            "invalid_index"
        );
    }

    #[test]
    fn status_codes_follow_the_taxonomy() {
        fn get_status(err: AppError) -> StatusCode {
            err.into_response().status()
        }

        assert_eq!(
            get_status(AppError::NotFound("nori".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Validation(ValidationError::EmptyName)),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::InsufficientStock {
                ingredient: "nori".to_string(),
                requested: Decimal::TEN,
                available: Decimal::ONE,
            }),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(AppError::StockConflict(Vec::new())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(AppError::InvalidIndex { index: 3, len: 1 }),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Internal("boom".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
