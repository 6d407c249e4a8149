//! Server startup and graceful shutdown

use crate::setup::routes::create_router;
use crate::state::AppState;
use anyhow::Result;
use axum::Router;
use finstream_core::Config;
use finstream_db::{PgVideoRepository, VideoRepository};
use finstream_storage::{ChunkStore, LocalStorage, Storage};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;

/// Wire up storage, database, and state, and build the router.
pub async fn initialize_app(config: &Config) -> Result<Router> {
    let storage: Arc<dyn Storage> = Arc::new(
        LocalStorage::new(
            config.storage_path.clone(),
            config.storage_base_url.clone(),
        )
        .await?,
    );
    let chunks = ChunkStore::new(config.temp_upload_path.clone()).await?;

    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .connect(&config.database_url)
        .await?;
    let videos: Arc<dyn VideoRepository> = Arc::new(PgVideoRepository::new(pool));

    let state = Arc::new(AppState::new(config.clone(), storage, chunks, videos));
    create_router(config, state)
}

/// Start the server with graceful shutdown
pub async fn start_server(config: &Config, app: Router) -> Result<()> {
    let addr = format!("0.0.0.0:{}", config.server_port);
    tracing::info!(addr = %addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!(
        environment = %config.environment,
        max_video_mb = config.max_video_size_bytes / 1024 / 1024,
        max_document_mb = config.max_document_size_bytes / 1024 / 1024,
        video_extensions = %config.video_allowed_extensions.join(","),
        document_extensions = %config.document_allowed_extensions.join(","),
        stream_token_ttl_secs = config.stream_token_ttl_secs,
        "Server ready and accepting connections"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Signal handler for graceful shutdown
///
/// Listens for Ctrl+C (SIGINT) and SIGTERM signals to initiate graceful shutdown.
///
/// # Panics
/// - Panics if Ctrl+C signal handler cannot be installed (unrecoverable system error)
/// - On Unix systems, panics if SIGTERM signal handler cannot be installed (unrecoverable system error)
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            tracing::info!("Received terminate signal");
        },
    }

    tracing::info!("Shutting down gracefully...");
}
