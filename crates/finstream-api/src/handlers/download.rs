//! Single-use file downloads gated by download tokens.

use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::Response,
};
use finstream_core::AppError;
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct DownloadQuery {
    pub token: Option<String>,
}

/// Download a stored artifact with a single-use token
#[utoipa::path(
    get,
    path = "/api/v0/downloads/{file_id}",
    tag = "downloads",
    params(
        ("file_id" = String, Path, description = "Storage key of the artifact (URL-encoded)"),
        ("token" = String, Query, description = "Single-use download token")
    ),
    responses(
        (status = 200, description = "Artifact bytes as attachment"),
        (status = 401, description = "Missing, invalid, or already-used token", body = ErrorResponse),
        (status = 404, description = "File not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn download_file(
    State(state): State<Arc<AppState>>,
    Path(file_id): Path<String>,
    Query(query): Query<DownloadQuery>,
) -> Result<Response, HttpAppError> {
    let token = query.token.as_deref().ok_or_else(|| {
        AppError::Unauthorized("Missing download token".to_string())
    })?;

    // Verification consumes the nonce, so a retried URL gets a 401.
    state.tokens.verify_and_consume_download_token(token, &file_id)?;

    let data = state.storage.download(&file_id).await.map_err(|e| {
        tracing::warn!(key = %file_id, error = %e, "Download fetch failed");
        AppError::NotFound("File not found".to_string())
    })?;

    let filename = file_id.rsplit('/').next().unwrap_or(&file_id).to_string();
    let content_type = super::content_type_for(&file_id);

    tracing::info!(
        key = %file_id,
        size_bytes = data.len(),
        "File download served"
    );

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", filename),
        )
        .body(Body::from(data))
        .map_err(|e| {
            HttpAppError::from(AppError::Internal(format!(
                "Failed to build download response: {}",
                e
            )))
        })
}
