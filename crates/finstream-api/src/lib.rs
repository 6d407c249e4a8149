//! Finstream API Library
//!
//! HTTP surface for the chunked-upload and HLS-streaming pipeline: handlers,
//! token service, application state, and setup. The binary in `main.rs` is a
//! thin wrapper; integration tests build routers through [`setup`] directly.

mod api_doc;
mod handlers;
mod validation;

// Public modules
pub mod error;
pub mod setup;
pub mod state;
pub mod telemetry;
pub mod tokens;

// Re-exports
pub use error::ErrorResponse;
pub use tokens::{TokenError, TokenService};
