//! Shared application state for handlers.

use finstream_core::Config;
use finstream_db::VideoRepository;
use finstream_storage::{ChunkStore, Storage};
use std::sync::Arc;

use crate::tokens::TokenService;

/// Application state shared across all request handlers.
///
/// Cheap to clone: everything is behind an `Arc` or already a handle.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub storage: Arc<dyn Storage>,
    pub chunks: ChunkStore,
    pub videos: Arc<dyn VideoRepository>,
    pub tokens: TokenService,
}

impl AppState {
    pub fn new(
        config: Config,
        storage: Arc<dyn Storage>,
        chunks: ChunkStore,
        videos: Arc<dyn VideoRepository>,
    ) -> Self {
        let tokens = TokenService::new(&config);
        Self {
            config: Arc::new(config),
            storage,
            chunks,
            videos,
            tokens,
        }
    }
}
