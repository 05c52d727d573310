//! Rendering-surface boundary.
//!
//! The surface (the actual overlay window) lives outside this core; it
//! receives commands and reports events over a channel pair. The
//! factory abstracts on-demand creation so the dispatcher can rebuild a
//! surface that went away.

use serde::Serialize;
use tokio::sync::mpsc;

use notify_client::Notification;

pub const COMMAND_CHANNEL_CAPACITY: usize = 64;

/// Commands sent from the core to the rendering surface.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum SurfaceCommand {
    /// Make the surface window visible if it is currently hidden.
    Reveal,
    /// Display a notification.
    Show(Notification),
    /// Remove the on-screen element matching this id.
    Remove { id: String },
    /// No notifications remain visible; the surface may hide itself.
    AllClear,
}

/// Events reported by the rendering surface.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceEvent {
    /// The surface finished initializing and can accept Show commands.
    Ready,
    /// The user dismissed the notification with this id.
    Dismiss { id: String },
    /// The surface was torn down (window closed).
    Closed,
}

/// Command-side handle to a live rendering surface.
#[derive(Debug, Clone)]
pub struct SurfaceHandle {
    commands: mpsc::Sender<SurfaceCommand>,
}

impl SurfaceHandle {
    pub fn new(commands: mpsc::Sender<SurfaceCommand>) -> Self {
        Self { commands }
    }

    pub fn is_closed(&self) -> bool {
        self.commands.is_closed()
    }

    pub async fn send(&self, command: SurfaceCommand) -> Result<(), anyhow::Error> {
        self.commands
            .send(command)
            .await
            .map_err(|_| anyhow::anyhow!("surface command channel closed"))
    }
}

/// Creates rendering surfaces on demand.
pub trait SurfaceFactory: Send {
    /// Build a new surface, returning its command handle and the
    /// receiver for its events. The surface signals `Ready` once it can
    /// accept Show commands.
    fn create(&self) -> Result<(SurfaceHandle, mpsc::Receiver<SurfaceEvent>), anyhow::Error>;
}

/// Headless surface for running without a desktop window: logs every
/// command and reports Ready immediately.
pub struct LogSurfaceFactory;

impl SurfaceFactory for LogSurfaceFactory {
    fn create(&self) -> Result<(SurfaceHandle, mpsc::Receiver<SurfaceEvent>), anyhow::Error> {
        let (command_tx, mut command_rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);
        let (event_tx, event_rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);

        tokio::spawn(async move {
            if event_tx.send(SurfaceEvent::Ready).await.is_err() {
                return;
            }
            while let Some(command) = command_rx.recv().await {
                match &command {
                    SurfaceCommand::Show(n) => {
                        tracing::info!(id = %n.id, kind = n.kind.tag(), "surface: show notification");
                    }
                    SurfaceCommand::Remove { id } => {
                        tracing::info!(id = %id, "surface: remove notification");
                    }
                    SurfaceCommand::AllClear => {
                        tracing::info!("surface: no notifications remaining");
                    }
                    SurfaceCommand::Reveal => {
                        tracing::debug!("surface: reveal");
                    }
                }
            }
            let _ = event_tx.send(SurfaceEvent::Closed).await;
        });

        Ok((SurfaceHandle::new(command_tx), event_rx))
    }
}
