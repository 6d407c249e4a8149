//! Application setup: routes, state wiring, and server startup.

pub mod routes;
pub mod server;

pub use routes::create_router;
pub use server::{initialize_app, start_server};
