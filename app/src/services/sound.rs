//! Audible notification cues.
//!
//! Fire-and-forget: the cue is spawned through an external player
//! command and every failure is logged and swallowed. A missing player
//! or sound file never blocks or fails a delivery.

use std::path::PathBuf;

use notify_client::NotificationKind;

/// Sound cue settings, from [`crate::config::AppConfig`].
#[derive(Debug, Clone)]
pub struct SoundSettings {
    pub enabled: bool,
    /// External player command, e.g. `paplay` or `afplay`.
    pub command: String,
    pub dir: PathBuf,
}

impl SoundSettings {
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            command: String::new(),
            dir: PathBuf::new(),
        }
    }
}

/// The cue file played for a notification kind.
pub fn cue_file(kind: &NotificationKind) -> &'static str {
    match kind {
        NotificationKind::Info { .. } => "info.wav",
        NotificationKind::Error { .. } => "error.wav",
        NotificationKind::Coins { .. } => "coins.wav",
        NotificationKind::FreeHtml { .. } | NotificationKind::UrlHtml { .. } => "default.wav",
    }
}

/// Play the cue for a notification kind, best-effort.
pub fn play_cue(settings: &SoundSettings, kind: &NotificationKind) {
    if !settings.enabled || settings.command.is_empty() {
        return;
    }

    let path = settings.dir.join(cue_file(kind));
    if !path.exists() {
        tracing::warn!(path = %path.display(), "Sound file not found, skipping cue");
        return;
    }

    match tokio::process::Command::new(&settings.command)
        .arg(&path)
        .spawn()
    {
        Ok(mut child) => {
            tokio::spawn(async move {
                if let Err(e) = child.wait().await {
                    tracing::warn!(error = %e, "Sound player exited abnormally");
                }
            });
        }
        Err(e) => {
            tracing::warn!(error = %e, command = %settings.command, "Failed to start sound player");
        }
    }
}
