//! Graceful shutdown sequencing.
//!
//! Also the system-suspend path: the embedder closes the transport here
//! and starts a fresh client on resume.

use std::time::Duration;

use tokio::time::sleep;

use crate::app::SharedState;

pub async fn graceful_shutdown(state: &SharedState) {
    tracing::info!("Shutdown sequence started");

    state.shutdown_token().cancel();
    tracing::info!("Shutdown: pipeline cancelled");

    match state.take_transport_shutdown().await {
        Some(tx) => {
            if tx.send(()).await.is_ok() {
                tracing::info!("Shutdown: transport stop signal sent");
            } else {
                // Already stopped; closing twice is a logged no-op.
                tracing::warn!("Shutdown: transport was already stopped");
            }
        }
        None => {
            tracing::info!("Shutdown: no transport running");
        }
    }

    sleep(Duration::from_millis(200)).await;
    tracing::info!("Shutdown sequence completed");
}
