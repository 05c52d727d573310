//! Dispatcher: forwards accepted notifications to the rendering surface.
//!
//! Creates the surface on demand, queues deliveries while it is still
//! initializing, and flushes the queue exactly once, in arrival order,
//! when the surface reports ready.

use tokio::sync::mpsc;

use notify_client::Notification;

use crate::services::sound::{self, SoundSettings};
use crate::surface::{SurfaceCommand, SurfaceEvent, SurfaceFactory, SurfaceHandle};

/// Outcome of a dispatch attempt.
pub enum DispatchResult {
    /// Delivered (or queued for the initializing surface). Carries the
    /// event receiver of a freshly created surface, which the caller
    /// must start polling.
    Delivered(Option<mpsc::Receiver<SurfaceEvent>>),
    /// Surface creation failed; the notification was dropped.
    Dropped,
}

pub struct Dispatcher {
    factory: Box<dyn SurfaceFactory>,
    surface: Option<SurfaceHandle>,
    ready: bool,
    pending: Vec<Notification>,
    sound: SoundSettings,
}

impl Dispatcher {
    pub fn new(factory: Box<dyn SurfaceFactory>, sound: SoundSettings) -> Self {
        Self {
            factory,
            surface: None,
            ready: false,
            pending: Vec::new(),
            sound,
        }
    }

    /// Deliver a notification to the surface, creating one on demand.
    pub async fn dispatch(&mut self, notification: Notification) -> DispatchResult {
        let new_events = match self.ensure_surface() {
            Ok(events) => events,
            Err(e) => {
                tracing::error!(
                    id = %notification.id,
                    error = %e,
                    "Surface creation failed, dropping notification"
                );
                return DispatchResult::Dropped;
            }
        };

        sound::play_cue(&self.sound, &notification.kind);

        if self.ready {
            self.send(SurfaceCommand::Reveal).await;
            tracing::debug!(id = %notification.id, "Dispatching notification to surface");
            self.send(SurfaceCommand::Show(notification)).await;
        } else {
            tracing::debug!(id = %notification.id, "Surface not ready, queueing notification");
            self.pending.push(notification);
        }

        DispatchResult::Delivered(new_events)
    }

    /// The surface finished initializing; flush anything queued.
    pub async fn mark_ready(&mut self) {
        self.ready = true;
        if self.pending.is_empty() {
            return;
        }
        tracing::info!(count = self.pending.len(), "Surface ready, flushing queued notifications");
        self.send(SurfaceCommand::Reveal).await;
        for notification in std::mem::take(&mut self.pending) {
            self.send(SurfaceCommand::Show(notification)).await;
        }
    }

    /// The surface went away; forget the handle and anything queued for it.
    pub fn surface_lost(&mut self) {
        if self.surface.take().is_some() {
            tracing::info!(dropped = self.pending.len(), "Rendering surface closed");
        }
        self.ready = false;
        self.pending.clear();
    }

    /// Ask the surface to remove the element matching this id.
    pub async fn remove(&mut self, id: &str) {
        self.send(SurfaceCommand::Remove { id: id.to_string() }).await;
    }

    /// Tell the surface that no notifications remain visible.
    pub async fn all_clear(&mut self) {
        self.send(SurfaceCommand::AllClear).await;
    }

    fn ensure_surface(
        &mut self,
    ) -> Result<Option<mpsc::Receiver<SurfaceEvent>>, anyhow::Error> {
        let stale = match &self.surface {
            Some(surface) if !surface.is_closed() => return Ok(None),
            Some(_) => true,
            None => false,
        };
        if stale {
            tracing::warn!("Surface handle is closed, recreating");
            self.surface_lost();
        }

        tracing::info!("Creating rendering surface");
        let (handle, events) = self.factory.create()?;
        self.surface = Some(handle);
        self.ready = false;
        Ok(Some(events))
    }

    async fn send(&mut self, command: SurfaceCommand) {
        let Some(surface) = self.surface.clone() else {
            return;
        };
        if surface.send(command).await.is_err() {
            tracing::warn!("Surface command channel closed mid-send");
            self.surface_lost();
        }
    }
}
