//! Runtime application configuration loaded from the environment.

use notify_client::{DisplayTimeDefaults, TransportMode};

/// Runtime configuration populated from environment variables.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Caller identity the server addresses notifications to.
    pub identity: String,
    pub transport_mode: TransportMode,
    pub base_url: String,
    pub notifications_endpoint: String,
    pub push_url: String,
    pub poll_interval_ms: u64,
    pub heartbeat_interval_ms: u64,
    pub reconnect_delay_ms: u64,
    pub display_times: DisplayTimeDefaults,
    pub sound_enabled: bool,
    pub sound_command: String,
    pub sound_dir: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            identity: String::new(),
            transport_mode: TransportMode::Poll,
            base_url: "http://localhost:3001".into(),
            notifications_endpoint: "/notifications/check".into(),
            push_url: "ws://localhost:3001/ws".into(),
            poll_interval_ms: 10_000,
            heartbeat_interval_ms: 10_000,
            reconnect_delay_ms: 5_000,
            display_times: DisplayTimeDefaults::default(),
            sound_enabled: false,
            sound_command: String::new(),
            sound_dir: "sounds".into(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables, falling back to
    /// the defaults above for anything unset.
    pub fn load() -> Result<Self, anyhow::Error> {
        let base = Self::default();

        let identity = env_str("NOTIFY_USER_ID", &base.identity);
        if identity.is_empty() {
            anyhow::bail!("NOTIFY_USER_ID is not set");
        }

        let defaults = DisplayTimeDefaults::default();
        Ok(Self {
            identity,
            transport_mode: TransportMode::from_str_setting(&env_str("NOTIFY_TRANSPORT", "poll")),
            base_url: env_str("NOTIFY_API_URL", &base.base_url),
            notifications_endpoint: env_str(
                "NOTIFY_NOTIFICATIONS_ENDPOINT",
                &base.notifications_endpoint,
            ),
            push_url: env_str("NOTIFY_PUSH_URL", &base.push_url),
            poll_interval_ms: env_u64("NOTIFY_POLL_INTERVAL", base.poll_interval_ms),
            heartbeat_interval_ms: env_u64(
                "NOTIFY_HEARTBEAT_INTERVAL",
                base.heartbeat_interval_ms,
            ),
            reconnect_delay_ms: env_u64("NOTIFY_RECONNECT_DELAY", base.reconnect_delay_ms),
            display_times: DisplayTimeDefaults {
                info: env_u64("NOTIFY_TIMEOUT_INFO", defaults.info),
                error: env_u64("NOTIFY_TIMEOUT_ERROR", defaults.error),
                coins: env_u64("NOTIFY_TIMEOUT_COINS", defaults.coins),
                free_html: env_u64("NOTIFY_TIMEOUT_FREE_HTML", defaults.free_html),
                url_html: env_u64("NOTIFY_TIMEOUT_URL_HTML", defaults.url_html),
            },
            sound_enabled: env_bool("NOTIFY_SOUND_ENABLED", base.sound_enabled),
            sound_command: env_str("NOTIFY_SOUND_COMMAND", &base.sound_command),
            sound_dir: env_str("NOTIFY_SOUND_DIR", &base.sound_dir),
        })
    }
}

fn env_str(key: &str, default: &str) -> String {
    match std::env::var(key) {
        Ok(v) if !v.is_empty() => v,
        _ => default.to_string(),
    }
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_bool(key: &str, default: bool) -> bool {
    match std::env::var(key) {
        Ok(v) => v == "true",
        Err(_) => default,
    }
}
