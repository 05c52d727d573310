//! HTTP polling transport.
//!
//! Asks the server "are there notifications for this identity?" on a
//! fixed schedule. Failures are logged and absorbed; polling continues
//! at the next scheduled tick with no backoff.

use std::time::Duration;

use serde::Deserialize;
use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;

use crate::model::Notification;
use crate::{ConnectionStatus, NotifyError};

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Polling client configuration.
#[derive(Debug, Clone)]
pub struct PollConfig {
    pub base_url: String,
    pub endpoint: String,
    pub identity: String,
    pub interval: Duration,
}

/// Server response to a poll request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PollResponse {
    #[serde(default)]
    has_notification: bool,
    #[serde(default)]
    notification: Option<Notification>,
}

/// Fixed-interval HTTP polling client.
///
/// Notifications are delivered via `mpsc::Receiver<Notification>`.
/// The same pending notification may be returned by consecutive polls
/// until the server clears it; deduplication is the caller's concern.
pub struct PollClient;

impl PollClient {
    /// Start the polling loop. Returns the notification receiver, a
    /// shutdown sender, and a connection-status watch.
    pub fn connect(
        config: PollConfig,
    ) -> (
        mpsc::Receiver<Notification>,
        mpsc::Sender<()>,
        watch::Receiver<ConnectionStatus>,
    ) {
        let (event_tx, event_rx) = mpsc::channel::<Notification>(EVENT_CHANNEL_CAPACITY);
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>(1);
        let (status_tx, status_rx) = watch::channel(ConnectionStatus::Disconnected);
        tokio::spawn(Self::run_loop(config, event_tx, shutdown_rx, status_tx));
        (event_rx, shutdown_tx, status_rx)
    }

    async fn run_loop(
        config: PollConfig,
        event_tx: mpsc::Sender<Notification>,
        mut shutdown_rx: mpsc::Receiver<()>,
        status_tx: watch::Sender<ConnectionStatus>,
    ) {
        let http = reqwest::Client::new();
        let mut ticker = tokio::time::interval(config.interval);
        // A slow response must not cause a burst of catch-up polls.
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    tracing::info!("Poll client shutdown requested");
                    return;
                }
                _ = ticker.tick() => {}
            }

            match Self::poll_once(&http, &config).await {
                Ok(pending) => {
                    let _ = status_tx.send(ConnectionStatus::Connected);
                    if let Some(notification) = pending {
                        tracing::debug!(id = %notification.id, "Poll returned a pending notification");
                        if event_tx.send(notification).await.is_err() {
                            tracing::info!("Notification receiver dropped, stopping poll loop");
                            return;
                        }
                    }
                }
                Err(e) => {
                    let _ = status_tx.send(ConnectionStatus::Disconnected);
                    tracing::warn!(error = %e, "Poll request failed, will retry at next tick");
                }
            }
        }
    }

    async fn poll_once(
        http: &reqwest::Client,
        config: &PollConfig,
    ) -> Result<Option<Notification>, NotifyError> {
        let url = format!(
            "{}{}",
            config.base_url.trim_end_matches('/'),
            config.endpoint
        );
        let resp = http
            .get(&url)
            .query(&[("userId", config.identity.as_str())])
            .send()
            .await?
            .error_for_status()?;
        let body: PollResponse = resp.json().await?;
        if body.has_notification {
            Ok(body.notification)
        } else {
            Ok(None)
        }
    }
}
