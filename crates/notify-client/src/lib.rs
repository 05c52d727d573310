//! Notification transport client library.
//!
//! Provides the wire-level notification model and two interchangeable
//! delivery strategies: an HTTP polling client and a persistent
//! message-bus (WebSocket) subscription with automatic reconnection.

pub mod model;
pub mod poll;
pub mod push;

pub use model::{DisplayTimeDefaults, Notification, NotificationKind};
pub use poll::{PollClient, PollConfig};
pub use push::{PushClient, PushConfig};

/// Unified error type for the notify-client crate.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Connection timeout")]
    Timeout,

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),
}

/// Connection state of a transport client, reported over a watch channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
    Connected,
    Disconnected,
}

/// Which delivery strategy to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportMode {
    Poll,
    Push,
}

impl Default for TransportMode {
    fn default() -> Self {
        Self::Poll
    }
}

impl TransportMode {
    pub fn from_str_setting(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "push" => Self::Push,
            _ => Self::Poll,
        }
    }
}
