//! Notification wire model.
//!
//! The server delivers a flat JSON object: `id`, `type` (one of five
//! tags), `message`, and optional `isPermanent`, `displayTime`, `amount`
//! fields. An unknown `type` tag is a deserialization error, never a
//! silent fallthrough.

use std::time::Duration;

use serde::{Deserialize, Serialize};

fn default_permanent() -> bool {
    true
}

/// A notification as delivered by the server.
///
/// Immutable after creation; dismissal removes it from the visible set
/// without touching its fields.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    #[serde(flatten)]
    pub kind: NotificationKind,
    /// Wire default is `true`: a notification with no `isPermanent`
    /// field stays on screen until the user dismisses it.
    #[serde(default = "default_permanent")]
    pub is_permanent: bool,
    /// Display duration in milliseconds. Only meaningful when
    /// `is_permanent` is false; a kind-specific default applies when
    /// absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_time: Option<u64>,
}

/// The closed set of notification kinds, tagged by `type` on the wire.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum NotificationKind {
    #[serde(rename = "INFO")]
    Info {
        #[serde(default)]
        message: String,
    },
    #[serde(rename = "ERROR")]
    Error {
        #[serde(default)]
        message: String,
    },
    #[serde(rename = "COINS")]
    Coins {
        #[serde(default)]
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        amount: Option<i64>,
    },
    #[serde(rename = "FREE_HTML")]
    FreeHtml {
        #[serde(rename = "message", default)]
        markup: String,
    },
    #[serde(rename = "URL_HTML")]
    UrlHtml {
        #[serde(rename = "message", default)]
        url: String,
    },
}

impl NotificationKind {
    /// The wire tag for this kind.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Info { .. } => "INFO",
            Self::Error { .. } => "ERROR",
            Self::Coins { .. } => "COINS",
            Self::FreeHtml { .. } => "FREE_HTML",
            Self::UrlHtml { .. } => "URL_HTML",
        }
    }
}

/// Per-kind auto-dismiss defaults, in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayTimeDefaults {
    pub info: u64,
    pub error: u64,
    pub coins: u64,
    pub free_html: u64,
    pub url_html: u64,
}

impl Default for DisplayTimeDefaults {
    fn default() -> Self {
        Self {
            info: 5_000,
            error: 15_000,
            coins: 15_000,
            free_html: 20_000,
            url_html: 10_000,
        }
    }
}

impl DisplayTimeDefaults {
    pub fn for_kind(&self, kind: &NotificationKind) -> u64 {
        match kind {
            NotificationKind::Info { .. } => self.info,
            NotificationKind::Error { .. } => self.error,
            NotificationKind::Coins { .. } => self.coins,
            NotificationKind::FreeHtml { .. } => self.free_html,
            NotificationKind::UrlHtml { .. } => self.url_html,
        }
    }
}

impl Notification {
    /// The auto-dismiss duration: the explicit `displayTime` when the
    /// server sent one, otherwise the kind-specific default.
    pub fn effective_display_time(&self, defaults: &DisplayTimeDefaults) -> Duration {
        let ms = self
            .display_time
            .unwrap_or_else(|| defaults.for_kind(&self.kind));
        Duration::from_millis(ms)
    }

    /// Parse a notification from a raw JSON value.
    pub fn from_value(value: serde_json::Value) -> Result<Self, serde_json::Error> {
        serde_json::from_value(value)
    }
}
