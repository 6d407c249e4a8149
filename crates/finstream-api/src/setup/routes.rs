//! Route configuration and setup

use crate::api_doc::ApiDoc;
use crate::handlers;
use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Json, Router,
};
use finstream_core::Config;
use std::sync::Arc;
use tower::limit::ConcurrencyLimitLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;

/// Multipart framing overhead allowed on top of the largest chunk payload.
const BODY_LIMIT_OVERHEAD_BYTES: usize = 1024 * 1024;

/// Build the application router
pub fn create_router(config: &Config, state: Arc<AppState>) -> Result<Router, anyhow::Error> {
    let cors = setup_cors(config)?;
    spawn_consumed_token_eviction(&state);

    let body_limit = config
        .max_video_size_bytes
        .max(config.max_document_size_bytes)
        + BODY_LIMIT_OVERHEAD_BYTES;

    // Server-level concurrency limit to protect against resource exhaustion under extreme load
    let http_concurrency_limit = std::env::var("HTTP_CONCURRENCY_LIMIT")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or(10_000)
        .max(1);

    let app = Router::new()
        .route(
            "/api/v0/uploads/{kind}/chunk",
            post(handlers::upload_chunk::upload_chunk),
        )
        .route(
            "/api/v0/uploads/{kind}/complete",
            post(handlers::upload_complete::complete_upload),
        )
        .route(
            "/api/v0/videos/{video_id}/playback-token",
            post(handlers::playback_token::issue_playback_token),
        )
        .route(
            "/api/v0/videos/{video_id}/stream/{*path}",
            get(handlers::video_stream::stream_asset),
        )
        .route(
            "/api/v0/downloads/{file_id}/token",
            post(handlers::playback_token::issue_download_token),
        )
        .route(
            "/api/v0/downloads/{file_id}",
            get(handlers::download::download_file),
        )
        .route("/api/openapi.json", get(openapi_json))
        .route("/health", get(health_check))
        .layer(ConcurrencyLimitLayer::new(http_concurrency_limit))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(RequestBodyLimitLayer::new(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    Ok(app)
}

/// Setup CORS configuration
fn setup_cors(config: &Config) -> Result<CorsLayer, anyhow::Error> {
    let exposed = [header::CONTENT_TYPE, header::RANGE, header::CONTENT_LENGTH];
    let cors = if config.cors_origins.contains(&"*".to_string()) {
        tracing::warn!("CORS configured to allow all origins - not recommended for production");
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers(Any)
            .expose_headers(exposed)
    } else {
        let origins: Result<Vec<HeaderValue>, _> =
            config.cors_origins.iter().map(|o| o.parse()).collect();

        CorsLayer::new()
            .allow_origin(origins.map_err(|e| anyhow::anyhow!("Invalid CORS origin: {}", e))?)
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([header::CONTENT_TYPE, header::RANGE])
            .expose_headers(exposed)
    };
    Ok(cors)
}

/// Periodic sweep of the consumed download-token set to bound its memory.
fn spawn_consumed_token_eviction(state: &Arc<AppState>) {
    let consumed = state.tokens.consumed();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(tokio::time::Duration::from_secs(300));
        loop {
            interval.tick().await;
            consumed.evict_expired();
        }
    });
}

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
