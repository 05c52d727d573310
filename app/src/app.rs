//! Shared application context.
//!
//! One explicit context object owns the config, the shutdown token, and
//! the active transport's stop handle, with a single teardown path in
//! [`crate::shutdown`]. No module-level singletons.

use std::sync::Arc;

use tokio::sync::{Mutex, RwLock, mpsc};
use tokio_util::sync::CancellationToken;

use crate::config::AppConfig;

/// Application shared state, cheap to clone.
#[derive(Clone)]
pub struct SharedState {
    inner: Arc<SharedStateInner>,
}

struct SharedStateInner {
    /// Application configuration (reloadable)
    config: RwLock<AppConfig>,
    /// Cancels the pipeline loop on shutdown
    shutdown: CancellationToken,
    /// Stop handle for the active transport client, if one is running
    transport_shutdown: Mutex<Option<mpsc::Sender<()>>>,
}

impl SharedState {
    pub fn new(config: AppConfig) -> Self {
        Self {
            inner: Arc::new(SharedStateInner {
                config: RwLock::new(config),
                shutdown: CancellationToken::new(),
                transport_shutdown: Mutex::new(None),
            }),
        }
    }

    /// Get a read lock on the current config.
    pub async fn config(&self) -> tokio::sync::RwLockReadGuard<'_, AppConfig> {
        self.inner.config.read().await
    }

    pub fn shutdown_token(&self) -> &CancellationToken {
        &self.inner.shutdown
    }

    /// Record the stop handle of the transport client that just started.
    pub async fn set_transport_shutdown(&self, tx: mpsc::Sender<()>) {
        let mut slot = self.inner.transport_shutdown.lock().await;
        *slot = Some(tx);
    }

    /// Take the transport stop handle, leaving the slot empty.
    pub async fn take_transport_shutdown(&self) -> Option<mpsc::Sender<()>> {
        let mut slot = self.inner.transport_shutdown.lock().await;
        slot.take()
    }
}
