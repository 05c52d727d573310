//! Desktop notification overlay client.
//!
//! Receives pushed or polled notifications from a remote server,
//! deduplicates them, dispatches them to a rendering surface, and
//! manages each on-screen notification's display lifecycle.

pub mod app;
pub mod config;
pub mod dispatcher;
pub mod handler;
pub mod lifecycle;
pub mod registry;
pub mod services;
pub mod shutdown;
pub mod surface;

use config::AppConfig;

/// Load .env from multiple candidate paths.
fn load_dotenv() {
    let candidates = [".env", "../.env", "../../.env"];
    for path in &candidates {
        if dotenvy::from_filename(path).is_ok() {
            tracing::info!("Loaded .env from: {path}");
            return;
        }
    }
    tracing::info!("No .env file found, using system environment variables");
}

/// Load runtime configuration from the environment.
pub fn init_config() -> Result<AppConfig, anyhow::Error> {
    load_dotenv();
    let config = AppConfig::load()?;
    tracing::info!(
        identity = %config.identity,
        transport = ?config.transport_mode,
        "Configuration loaded"
    );
    Ok(config)
}
