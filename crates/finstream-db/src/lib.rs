//! Database access for the streaming pipeline.
//!
//! The pipeline reads video records owned by the CMS layer; it never writes
//! them. [`VideoRepository`] is the seam: the Postgres implementation backs
//! production, the in-memory implementation backs tests and local
//! development without a database.

pub mod memory;
pub mod video;

pub use memory::InMemoryVideoRepository;
pub use video::{PgVideoRepository, VideoRepository};
