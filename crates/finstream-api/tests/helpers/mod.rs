//! Test helpers: build AppState and router for integration tests.
//!
//! Tests run against an in-memory video repository and tempdir-backed
//! storage, so no database or external service is needed.

#![allow(dead_code)]

use axum_test::TestServer;
use chrono::Utc;
use finstream_api::setup::create_router;
use finstream_api::state::AppState;
use finstream_core::models::{ProcessingStatus, Video};
use finstream_core::Config;
use finstream_db::{InMemoryVideoRepository, VideoRepository};
use finstream_storage::{ChunkStore, LocalStorage, Storage};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;
use uuid::Uuid;

/// Test application with handles to the backing stores.
pub struct TestApp {
    pub server: TestServer,
    pub storage: Arc<dyn Storage>,
    pub videos: Arc<InMemoryVideoRepository>,
    pub chunk_dir: TempDir,
    pub _storage_dir: TempDir,
}

pub fn test_config() -> Config {
    Config {
        server_port: 0,
        environment: "test".to_string(),
        cors_origins: vec!["*".to_string()],
        database_url: String::new(),
        db_max_connections: 1,
        video_token_secret: "integration-test-secret-key".to_string(),
        stream_token_ttl_secs: 30,
        segment_token_ttl_secs: 10,
        download_token_ttl_secs: 60,
        storage_path: String::new(),
        storage_base_url: "http://localhost:4000/media".to_string(),
        temp_upload_path: String::new(),
        max_video_size_bytes: 10 * 1024 * 1024,
        video_allowed_extensions: vec!["mp4".to_string(), "mov".to_string()],
        video_allowed_content_types: vec![
            "video/mp4".to_string(),
            "video/quicktime".to_string(),
            "application/octet-stream".to_string(),
        ],
        max_document_size_bytes: 5 * 1024 * 1024,
        document_allowed_extensions: vec!["pdf".to_string()],
        document_allowed_content_types: vec![
            "application/pdf".to_string(),
            "application/octet-stream".to_string(),
        ],
    }
}

pub async fn setup_test_app() -> TestApp {
    setup_test_app_with(test_config()).await
}

pub async fn setup_test_app_with(config: Config) -> TestApp {
    let storage_dir = tempfile::tempdir().expect("Failed to create storage tempdir");
    let chunk_dir = tempfile::tempdir().expect("Failed to create chunk tempdir");

    let storage: Arc<dyn Storage> = Arc::new(
        LocalStorage::new(
            storage_dir.path().to_path_buf(),
            config.storage_base_url.clone(),
        )
        .await
        .expect("Failed to create local storage"),
    );
    let chunks = ChunkStore::new(chunk_dir.path())
        .await
        .expect("Failed to create chunk store");
    let videos = Arc::new(InMemoryVideoRepository::new());

    let state = Arc::new(AppState::new(
        config.clone(),
        storage.clone(),
        chunks,
        videos.clone() as Arc<dyn VideoRepository>,
    ));
    let router = create_router(&config, state).expect("Failed to build router");
    let server = TestServer::new(router).expect("Failed to start test server");

    TestApp {
        server,
        storage,
        videos,
        chunk_dir,
        _storage_dir: storage_dir,
    }
}

/// A video that finished HLS processing.
pub fn ready_video(video_id: &str, hls_path: &str) -> Video {
    Video {
        id: Uuid::new_v4(),
        video_id: video_id.to_string(),
        title: format!("Test video {}", video_id),
        processing_status: ProcessingStatus::Completed,
        hls_segments_path: Some(hls_path.to_string()),
        duration_secs: Some(120.0),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

/// A video still being transcoded.
pub fn processing_video(video_id: &str) -> Video {
    Video {
        id: Uuid::new_v4(),
        video_id: video_id.to_string(),
        title: format!("Test video {}", video_id),
        processing_status: ProcessingStatus::Processing,
        hls_segments_path: None,
        duration_secs: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

/// Names of leftover chunk files in the temp upload directory.
pub fn chunk_files(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .expect("Failed to read chunk dir")
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| name.contains(".chunk."))
        .collect();
    names.sort();
    names
}
