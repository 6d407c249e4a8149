//! Finstream Storage Library
//!
//! Storage abstraction and implementations for the upload/streaming pipeline:
//! the [`Storage`] trait with a local-filesystem backend, collision-resistant
//! artifact key generation, and the temporary [`ChunkStore`] used by chunked
//! uploads.
//!
//! # Storage key format
//!
//! Keys are relative paths under the storage root (e.g. `media/{filename}`,
//! `hls/{video_id}/index.m3u8`). Keys must not contain `..` or a leading `/`.
//! Final artifact names are generated in the `keys` module and never derived
//! from user input.

pub mod chunks;
pub mod keys;
pub mod local;
pub mod traits;

// Re-export commonly used types
pub use chunks::{ChunkStore, ChunkStoreError};
pub use keys::generate_artifact_name;
pub use local::LocalStorage;
pub use traits::{Storage, StorageError, StorageResult};
