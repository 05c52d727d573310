use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, watch};
use tokio_tungstenite::connect_async;

use super::*;

#[derive(Debug, Deserialize)]
struct BusFrame {
    #[serde(rename = "type")]
    frame_type: String,
    #[serde(default)]
    data: serde_json::Value,
}

#[derive(Debug, Serialize)]
struct SubscribeFrame<'a> {
    #[serde(rename = "type")]
    frame_type: &'static str,
    topic: &'a str,
}

enum FrameAction {
    Continue,
    Notification(Notification),
}

impl PushClient {
    pub(super) async fn connect_once(
        config: &PushConfig,
        event_tx: &mpsc::Sender<Notification>,
        shutdown_rx: &mut mpsc::Receiver<()>,
        status_tx: &watch::Sender<ConnectionStatus>,
    ) -> Result<(), NotifyError> {
        use tokio_tungstenite::tungstenite::Message as Msg;

        tracing::info!(url = %config.url, "Connecting to notification bus");
        let (mut ws, _) = connect_async(&config.url).await?;
        Self::wait_for_welcome(&mut ws, config.heartbeat_interval).await?;

        let topic = config.topic();
        let subscribe = serde_json::to_string(&SubscribeFrame {
            frame_type: "subscribe",
            topic: &topic,
        })?;
        ws.send(Msg::text(subscribe)).await?;
        tracing::info!(topic = %topic, "Subscribed to notification topic");
        let _ = status_tx.send(ConnectionStatus::Connected);

        // A missed heartbeat window counts as a close.
        let timeout = config.heartbeat_interval * 2;
        loop {
            tokio::select! {
                _ = shutdown_rx.recv() => {
                    tracing::info!("Push shutdown during listen");
                    let _ = ws.close(None).await;
                    return Ok(());
                }
                result = tokio::time::timeout(timeout, ws.next()) => {
                    match result {
                        Ok(Some(Ok(Msg::Text(text)))) => {
                            if let FrameAction::Notification(n) = Self::handle_frame(&text) {
                                if event_tx.send(n).await.is_err() {
                                    tracing::info!("Notification receiver dropped, closing push connection");
                                    let _ = ws.close(None).await;
                                    return Ok(());
                                }
                            }
                        }
                        Ok(Some(Ok(Msg::Ping(data)))) => {
                            let _ = ws.send(Msg::Pong(data)).await;
                        }
                        Ok(Some(Ok(Msg::Close(_)))) | Ok(None) => {
                            tracing::warn!("Notification bus closed the connection");
                            return Err(NotifyError::Transport("server closed".into()));
                        }
                        Ok(Some(Err(e))) => return Err(NotifyError::WebSocket(e)),
                        Ok(Some(Ok(_))) => {}
                        Err(_) => {
                            tracing::warn!("Push keepalive timeout");
                            return Err(NotifyError::Timeout);
                        }
                    }
                }
            }
        }
    }

    async fn wait_for_welcome(
        ws: &mut tokio_tungstenite::WebSocketStream<
            tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
        >,
        heartbeat_interval: std::time::Duration,
    ) -> Result<(), NotifyError> {
        use tokio_tungstenite::tungstenite::Message as Msg;
        loop {
            match tokio::time::timeout(heartbeat_interval * 2, ws.next()).await {
                Ok(Some(Ok(Msg::Text(text)))) => {
                    let frame: BusFrame = serde_json::from_str(&text)?;
                    if frame.frame_type == "welcome" {
                        tracing::info!("Notification bus welcome received");
                        return Ok(());
                    }
                }
                Ok(Some(Ok(_))) => continue,
                Ok(Some(Err(e))) => return Err(NotifyError::WebSocket(e)),
                Ok(None) => return Err(NotifyError::Transport("connection closed".into())),
                Err(_) => return Err(NotifyError::Timeout),
            }
        }
    }

    /// Classify one inbound frame.
    ///
    /// Malformed frames and malformed notification bodies are logged and
    /// dropped; the connection stays up. Delivery is at-most-once from
    /// this client's perspective, so there is nothing to retry.
    fn handle_frame(text: &str) -> FrameAction {
        let frame: BusFrame = match serde_json::from_str(text) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::warn!(error = %e, "Dropping malformed bus frame");
                return FrameAction::Continue;
            }
        };
        match frame.frame_type.as_str() {
            "keepalive" => {
                tracing::trace!("Bus keepalive received");
                FrameAction::Continue
            }
            "notification" => match Notification::from_value(frame.data) {
                Ok(n) => {
                    tracing::debug!(id = %n.id, kind = n.kind.tag(), "Push notification received");
                    FrameAction::Notification(n)
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Dropping malformed notification payload");
                    FrameAction::Continue
                }
            },
            other => {
                tracing::debug!(frame_type = other, "Unhandled bus frame");
                FrameAction::Continue
            }
        }
    }
}

#[cfg(test)]
pub(super) fn classify_frame_for_test(text: &str) -> Option<Notification> {
    match PushClient::handle_frame(text) {
        FrameAction::Notification(n) => Some(n),
        FrameAction::Continue => None,
    }
}
