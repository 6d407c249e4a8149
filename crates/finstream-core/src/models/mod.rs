//! Data models for the application
//!
//! Domain types consumed by the streaming and upload pipeline. The `Video`
//! record itself is owned by the CMS layer; this crate only reads it.

mod video;

pub use video::*;
