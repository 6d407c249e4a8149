//! Token-gated HLS stream gateway.
//!
//! Serves playlists and segments for processed videos. Every request must
//! carry a valid token; playlists are rewritten on the way out so each
//! resource line carries the current token, keeping players working without
//! any client-side URL handling.

use crate::error::{ErrorResponse, HttpAppError};
use crate::state::AppState;
use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use finstream_core::AppError;
use futures::StreamExt;
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct StreamQuery {
    pub token: Option<String>,
}

/// Append `token` as a query parameter to every non-comment playlist line
/// that references a `.ts` or `.m3u8` resource.
fn rewrite_manifest(manifest: &str, token: &str) -> String {
    let mut out: Vec<String> = Vec::new();
    for line in manifest.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            out.push(line.to_string());
            continue;
        }
        // The resource path is the part before any existing query string.
        let resource = trimmed.split('?').next().unwrap_or(trimmed);
        if resource.ends_with(".ts") || resource.ends_with(".m3u8") {
            let separator = if trimmed.contains('?') { '&' } else { '?' };
            out.push(format!("{}{}token={}", line, separator, token));
        } else {
            out.push(line.to_string());
        }
    }
    let mut rewritten = out.join("\n");
    if manifest.ends_with('\n') {
        rewritten.push('\n');
    }
    rewritten
}

/// Serve an HLS asset (playlist or segment) for a processed video
#[utoipa::path(
    get,
    path = "/api/v0/videos/{video_id}/stream/{path}",
    tag = "videos",
    params(
        ("video_id" = String, Path, description = "Public video identifier"),
        ("path" = String, Path, description = "Asset path relative to the video's HLS directory"),
        ("token" = String, Query, description = "Playback token")
    ),
    responses(
        (status = 200, description = "HLS playlist or segment"),
        (status = 400, description = "Video not ready or invalid path", body = ErrorResponse),
        (status = 401, description = "Missing or invalid token", body = ErrorResponse),
        (status = 404, description = "Video or asset not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
pub async fn stream_asset(
    State(state): State<Arc<AppState>>,
    Path((video_id, path)): Path<(String, String)>,
    Query(query): Query<StreamQuery>,
) -> Result<Response, HttpAppError> {
    // Token check comes first; nothing is fetched for unauthorized requests.
    let token = query.token.as_deref().ok_or_else(|| {
        AppError::Unauthorized("Missing playback token".to_string())
    })?;

    // Accept a stream token for any asset of the video, or a segment token
    // bound to exactly this path.
    state
        .tokens
        .verify_stream_token(token, &video_id)
        .map(|_| ())
        .or_else(|stream_err| {
            state
                .tokens
                .verify_segment_token(token, &video_id, &path)
                .map_err(|_| stream_err)
        })?;

    if path.contains("..") || path.contains('\\') || path.starts_with('/') {
        return Err(HttpAppError::from(AppError::BadRequest(
            "Invalid asset path".to_string(),
        )));
    }

    let video = state
        .videos
        .find_by_public_id(&video_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Video not found".to_string()))?;

    if !video.is_ready() {
        return Err(HttpAppError::from(AppError::BadRequest(format!(
            "Video is not ready for streaming (status: {})",
            video.processing_status
        ))));
    }

    // is_ready() guarantees the path is present.
    let Some(base) = video.hls_segments_path.as_deref() else {
        return Err(HttpAppError::from(AppError::Internal(
            "Video marked ready without an HLS path".to_string(),
        )));
    };
    let asset_key = format!("{}/{}", base.trim_end_matches('/'), path);

    let content_type = super::content_type_for(&path);
    let is_manifest = content_type == "application/vnd.apple.mpegurl";

    let response = if is_manifest {
        // Playlists are buffered so resource lines can be rewritten to carry
        // the token, and served no-cache since the token embedded in them
        // expires quickly.
        let raw = state.storage.download(&asset_key).await.map_err(|e| {
            tracing::warn!(key = %asset_key, error = %e, "Playlist fetch failed");
            AppError::NotFound("Stream asset not found".to_string())
        })?;
        let manifest = String::from_utf8(raw).map_err(|_| {
            AppError::Internal(format!("Playlist {} is not valid UTF-8", asset_key))
        })?;
        let rewritten = rewrite_manifest(&manifest, token);

        Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, content_type)
            .header(header::CACHE_CONTROL, "no-cache")
            .body(Body::from(rewritten))
    } else {
        // Segments are immutable once transcoded; stream them straight
        // through with a long-lived cache header.
        let stream = state.storage.download_stream(&asset_key).await.map_err(|e| {
            tracing::warn!(key = %asset_key, error = %e, "Segment fetch failed");
            AppError::NotFound("Stream asset not found".to_string())
        })?;
        let body_stream = stream.map(|result| {
            result.map_err(|e| std::io::Error::other(format!("Storage stream error: {}", e)))
        });

        Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, content_type)
            .header(header::CACHE_CONTROL, "public, max-age=31536000, immutable")
            .body(Body::from_stream(body_stream))
    };

    response.map_err(|e| {
        HttpAppError::from(AppError::Internal(format!(
            "Failed to build stream response: {}",
            e
        )))
    })
}
