//! Push transport: persistent message-bus subscription over WebSocket.
//!
//! Connects to the bus, subscribes to the per-identity topic, and treats
//! each inbound message as a new notification. Handles welcome/keepalive
//! frames and reconnects after a fixed delay on any connection loss.

mod connection;

use std::time::Duration;

use tokio::sync::{mpsc, watch};

use crate::model::Notification;
use crate::{ConnectionStatus, NotifyError};

const EVENT_CHANNEL_CAPACITY: usize = 256;
const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(5);
const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(10);

/// Push client configuration.
#[derive(Debug, Clone)]
pub struct PushConfig {
    pub url: String,
    pub identity: String,
    pub heartbeat_interval: Duration,
    pub reconnect_delay: Duration,
}

impl PushConfig {
    pub fn new(url: String, identity: String) -> Self {
        Self {
            url,
            identity,
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
        }
    }

    /// The per-identity subscription topic.
    pub(crate) fn topic(&self) -> String {
        format!("notifications.user-{}", self.identity)
    }
}

/// Message-bus subscription client with auto-reconnect.
///
/// Notifications are delivered via `mpsc::Receiver<Notification>`. Every
/// delivered message is a distinct event; no deduplication is applied.
pub struct PushClient;

impl PushClient {
    /// Start the subscription loop. Returns the notification receiver,
    /// a shutdown sender, and a connection-status watch.
    ///
    /// Fails only on an invalid bus URL; connection errors after this
    /// point are absorbed by the reconnect supervisor.
    pub async fn connect(
        config: PushConfig,
    ) -> Result<
        (
            mpsc::Receiver<Notification>,
            mpsc::Sender<()>,
            watch::Receiver<ConnectionStatus>,
        ),
        NotifyError,
    > {
        url::Url::parse(&config.url)?;
        let (event_tx, event_rx) = mpsc::channel::<Notification>(EVENT_CHANNEL_CAPACITY);
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>(1);
        let (status_tx, status_rx) = watch::channel(ConnectionStatus::Disconnected);
        tokio::spawn(Self::run_loop(config, event_tx, shutdown_rx, status_tx));
        Ok((event_rx, shutdown_tx, status_rx))
    }

    /// Reconnect supervisor.
    ///
    /// The single loop owns every reconnect decision, so at most one
    /// reconnect attempt is ever pending: connection errors, keepalive
    /// timeouts, and server closes all funnel into the same delayed
    /// retry below.
    async fn run_loop(
        config: PushConfig,
        event_tx: mpsc::Sender<Notification>,
        mut shutdown_rx: mpsc::Receiver<()>,
        status_tx: watch::Sender<ConnectionStatus>,
    ) {
        loop {
            if shutdown_rx.try_recv().is_ok() {
                tracing::info!("Push client shutdown requested");
                return;
            }
            match Self::connect_once(&config, &event_tx, &mut shutdown_rx, &status_tx).await {
                Ok(()) => {
                    tracing::info!("Push connection closed cleanly");
                    return;
                }
                Err(e) => {
                    let _ = status_tx.send(ConnectionStatus::Disconnected);
                    tracing::warn!(
                        error = %e,
                        delay_secs = config.reconnect_delay.as_secs(),
                        "Push connection lost, will reconnect"
                    );
                    tokio::select! {
                        _ = shutdown_rx.recv() => {
                            tracing::info!("Push client shutdown during reconnect delay");
                            return;
                        }
                        _ = tokio::time::sleep(config.reconnect_delay) => {}
                    }
                }
            }
        }
    }
}
