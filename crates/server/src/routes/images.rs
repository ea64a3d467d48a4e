//! Image route handlers, backed by the LRU byte cache.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::header;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use crate::error::{AppError, Result};
use crate::state::AppState;

/// `GET /images/{file}` - image bytes, from cache when present, else from
/// the image directory (then cached). Serving a miss also kicks off a
/// detached preload pass for other frequently requested images.
pub async fn show(State(state): State<AppState>, Path(file): Path<String>) -> Result<Response> {
    validate_file_name(&file)?;

    if let Some(bytes) = state.image_cache().get(&file) {
        return Ok(respond(&file, bytes.as_ref().clone()));
    }

    let path = state.config().image_dir.join(&file);
    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|_| AppError::NotFound(format!("image {file}")))?;
    state.image_cache().insert(file.clone(), bytes.clone());
    state.start_image_preload();
    Ok(respond(&file, bytes))
}

/// `DELETE /images/{file}` - drop the cached bytes after an image is
/// replaced or deleted on disk.
pub async fn remove(
    State(state): State<AppState>,
    Path(file): Path<String>,
) -> Result<Json<serde_json::Value>> {
    validate_file_name(&file)?;
    let removed = state.image_cache().remove(&file);
    Ok(Json(json!({ "removed": removed })))
}

fn validate_file_name(file: &str) -> Result<()> {
    if file.is_empty() || file.contains('/') || file.contains('\\') || file.contains("..") {
        return Err(AppError::BadRequest(format!("invalid image name {file:?}")));
    }
    Ok(())
}

fn respond(file: &str, bytes: Vec<u8>) -> Response {
    let content_type = match file.rsplit('.').next() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("webp") => "image/webp",
        Some("gif") => "image/gif",
        Some("svg") => "image/svg+xml",
        _ => "application/octet-stream",
    };
    ([(header::CONTENT_TYPE, content_type)], bytes).into_response()
}
