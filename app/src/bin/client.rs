//! Notification client binary.
//!
//! Connects the configured transport, runs the delivery pipeline with a
//! headless logging surface, and shuts down cleanly on Ctrl+C. A real
//! desktop embedder swaps in its own surface factory.

use tracing_subscriber::EnvFilter;

use notify_overlay_lib::app::SharedState;
use notify_overlay_lib::surface::LogSurfaceFactory;
use notify_overlay_lib::{handler, init_config, shutdown};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    tracing::info!("Starting notification client");

    let config = init_config()?;
    let state = SharedState::new(config);

    let pipeline_state = state.clone();
    let pipeline = tokio::spawn(async move {
        handler::run(pipeline_state, Box::new(LogSurfaceFactory)).await;
    });

    tracing::info!("Notification client running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c().await?;

    shutdown::graceful_shutdown(&state).await;
    pipeline.abort();
    Ok(())
}
