//! Finstream API server binary.

use anyhow::Result;
use finstream_api::setup::{initialize_app, start_server};
use finstream_api::telemetry;
use finstream_core::Config;

#[tokio::main]
async fn main() -> Result<()> {
    telemetry::init_tracing();

    let config = Config::from_env()?;
    config.validate()?;

    let app = initialize_app(&config).await?;
    start_server(&config, app).await
}
