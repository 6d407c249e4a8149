//! Token issue endpoints for playback and downloads.

use crate::error::{ErrorResponse, HttpAppError, ValidatedJson};
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use finstream_core::AppError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

#[derive(Debug, Deserialize, ToSchema)]
pub struct PlaybackTokenRequest {
    /// Authenticated user the token is issued for; omitted for anonymous
    /// playback.
    #[serde(default)]
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PlaybackTokenResponse {
    pub token: String,
    pub video_id: String,
    /// Expiry as epoch milliseconds
    pub expires_at: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DownloadTokenResponse {
    pub token: String,
    pub file_id: String,
    /// Expiry as epoch milliseconds
    pub expires_at: i64,
}

/// Issue a short-lived playback token for a processed video
#[utoipa::path(
    post,
    path = "/api/v0/videos/{video_id}/playback-token",
    tag = "videos",
    params(
        ("video_id" = String, Path, description = "Public video identifier")
    ),
    request_body = PlaybackTokenRequest,
    responses(
        (status = 200, description = "Playback token issued", body = PlaybackTokenResponse),
        (status = 404, description = "Video not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn issue_playback_token(
    State(state): State<Arc<AppState>>,
    Path(video_id): Path<String>,
    ValidatedJson(request): ValidatedJson<PlaybackTokenRequest>,
) -> Result<impl IntoResponse, HttpAppError> {
    // Only issue tokens for videos that exist; readiness is checked at
    // stream time so a player can pre-fetch a token during processing.
    state
        .videos
        .find_by_public_id(&video_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Video not found".to_string()))?;

    let issued = state
        .tokens
        .issue_stream_token(&video_id, request.user_id.as_deref())?;

    tracing::debug!(
        video_id = %video_id,
        user_id = ?request.user_id,
        "Playback token issued"
    );

    Ok(Json(PlaybackTokenResponse {
        token: issued.token,
        video_id,
        expires_at: issued.expires_at,
    }))
}

/// Issue a single-use download token for a stored artifact
#[utoipa::path(
    post,
    path = "/api/v0/downloads/{file_id}/token",
    tag = "downloads",
    params(
        ("file_id" = String, Path, description = "Storage key of the artifact (URL-encoded)")
    ),
    responses(
        (status = 200, description = "Download token issued", body = DownloadTokenResponse),
        (status = 404, description = "File not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn issue_download_token(
    State(state): State<Arc<AppState>>,
    Path(file_id): Path<String>,
) -> Result<impl IntoResponse, HttpAppError> {
    if !state.storage.exists(&file_id).await? {
        return Err(HttpAppError::from(AppError::NotFound(
            "File not found".to_string(),
        )));
    }

    let issued = state.tokens.issue_download_token(&file_id)?;

    tracing::debug!(file_id = %file_id, "Download token issued");

    Ok(Json(DownloadTokenResponse {
        token: issued.token,
        file_id,
        expires_at: issued.expires_at,
    }))
}
