//! Notification pipeline: transport intake, dedupe, dispatch, lifecycle.
//!
//! Connects the configured transport strategy, then drives a single
//! event loop over inbound payloads, surface events, and expiry timers.
//! Everything here is best-effort: failures are logged and the loop
//! keeps running.

use std::time::Duration;

use tokio::sync::mpsc;

use notify_client::{
    ConnectionStatus, Notification, PollClient, PollConfig, PushClient, PushConfig, TransportMode,
};

use crate::app::SharedState;
use crate::dispatcher::{DispatchResult, Dispatcher};
use crate::lifecycle::{LifecycleManager, Removal};
use crate::registry::Registry;
use crate::services::sound::SoundSettings;
use crate::surface::{SurfaceEvent, SurfaceFactory};

/// Connect the transport and run the pipeline until shutdown.
pub async fn run(state: SharedState, factory: Box<dyn SurfaceFactory>) {
    let config = state.config().await.clone();

    let (event_rx, shutdown_tx, status_rx) = match config.transport_mode {
        TransportMode::Poll => {
            let (rx, tx, status) = PollClient::connect(PollConfig {
                base_url: config.base_url.clone(),
                endpoint: config.notifications_endpoint.clone(),
                identity: config.identity.clone(),
                interval: Duration::from_millis(config.poll_interval_ms),
            });
            (rx, tx, status)
        }
        TransportMode::Push => {
            let push_config = PushConfig {
                url: config.push_url.clone(),
                identity: config.identity.clone(),
                heartbeat_interval: Duration::from_millis(config.heartbeat_interval_ms),
                reconnect_delay: Duration::from_millis(config.reconnect_delay_ms),
            };
            match PushClient::connect(push_config).await {
                Ok(transport) => transport,
                Err(e) => {
                    tracing::error!(error = %e, "Push transport refused to start");
                    return;
                }
            }
        }
    };
    state.set_transport_shutdown(shutdown_tx).await;

    tokio::spawn(log_connection_status(status_rx));

    let dedupe = config.transport_mode == TransportMode::Poll;
    let sound = SoundSettings {
        enabled: config.sound_enabled,
        command: config.sound_command.clone(),
        dir: config.sound_dir.clone().into(),
    };
    let dispatcher = Dispatcher::new(factory, sound);
    run_pipeline(&state, dispatcher, event_rx, dedupe).await;
}

/// Log transport connection transitions (tray/status consumers watch
/// the same channel).
async fn log_connection_status(mut status_rx: tokio::sync::watch::Receiver<ConnectionStatus>) {
    let mut last = *status_rx.borrow();
    while status_rx.changed().await.is_ok() {
        let status = *status_rx.borrow();
        if status != last {
            match status {
                ConnectionStatus::Connected => tracing::info!("Transport connected"),
                ConnectionStatus::Disconnected => tracing::warn!("Transport disconnected"),
            }
            last = status;
        }
    }
}

/// Core event loop. Runs until shutdown is requested or the transport
/// channel closes.
pub(crate) async fn run_pipeline(
    state: &SharedState,
    mut dispatcher: Dispatcher,
    mut event_rx: mpsc::Receiver<Notification>,
    dedupe: bool,
) {
    let defaults = state.config().await.display_times.clone();
    let mut registry = Registry::new();
    let (mut lifecycle, mut expiry_rx) = LifecycleManager::new(defaults);
    let mut surface_events: Option<mpsc::Receiver<SurfaceEvent>> = None;
    let cancel = state.shutdown_token().clone();

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Pipeline stopping (shutdown)");
                return;
            }
            inbound = event_rx.recv() => {
                let Some(notification) = inbound else {
                    tracing::info!("Transport channel closed, pipeline stopping");
                    return;
                };
                if dedupe && !registry.accept(&notification) {
                    continue;
                }
                match dispatcher.dispatch(notification.clone()).await {
                    DispatchResult::Delivered(new_events) => {
                        if let Some(events) = new_events {
                            surface_events = Some(events);
                        }
                        lifecycle.track(&notification);
                    }
                    DispatchResult::Dropped => {}
                }
            }
            event = recv_surface_event(&mut surface_events) => {
                match event {
                    Some(SurfaceEvent::Ready) => dispatcher.mark_ready().await,
                    Some(SurfaceEvent::Dismiss { id }) => {
                        // The surface already removed the element; only
                        // bookkeeping and the empty-set signal remain.
                        if let Removal::Removed { all_clear: true } = lifecycle.dismiss(&id) {
                            dispatcher.all_clear().await;
                        }
                    }
                    Some(SurfaceEvent::Closed) | None => {
                        dispatcher.surface_lost();
                        surface_events = None;
                    }
                }
            }
            Some(id) = expiry_rx.recv() => {
                if let Removal::Removed { all_clear } = lifecycle.expire(&id) {
                    dispatcher.remove(&id).await;
                    if all_clear {
                        dispatcher.all_clear().await;
                    }
                }
            }
        }
    }
}

/// Await the next surface event, or pend forever while no surface exists.
async fn recv_surface_event(
    events: &mut Option<mpsc::Receiver<SurfaceEvent>>,
) -> Option<SurfaceEvent> {
    match events {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use notify_client::NotificationKind;

    use super::*;
    use crate::config::AppConfig;
    use crate::surface::{COMMAND_CHANNEL_CAPACITY, SurfaceCommand, SurfaceHandle};

    struct Harness {
        transport_tx: mpsc::Sender<Notification>,
        commands: mpsc::Receiver<SurfaceCommand>,
        events_tx: mpsc::Sender<SurfaceEvent>,
        state: SharedState,
    }

    /// Factory wired to externally held channels; reports Ready as soon
    /// as it is created.
    struct WiredFactory {
        command_tx: std::sync::Mutex<Option<mpsc::Sender<SurfaceCommand>>>,
        event_rx: std::sync::Mutex<Option<mpsc::Receiver<SurfaceEvent>>>,
        ready_tx: mpsc::Sender<SurfaceEvent>,
    }

    impl SurfaceFactory for WiredFactory {
        fn create(&self) -> Result<(SurfaceHandle, mpsc::Receiver<SurfaceEvent>), anyhow::Error> {
            let command_tx = self
                .command_tx
                .lock()
                .unwrap()
                .take()
                .ok_or_else(|| anyhow::anyhow!("surface already created"))?;
            let event_rx = self.event_rx.lock().unwrap().take().unwrap();
            let ready_tx = self.ready_tx.clone();
            tokio::spawn(async move {
                let _ = ready_tx.send(SurfaceEvent::Ready).await;
            });
            Ok((SurfaceHandle::new(command_tx), event_rx))
        }
    }

    fn start_pipeline(dedupe: bool) -> Harness {
        let (transport_tx, transport_rx) = mpsc::channel(16);
        let (command_tx, commands) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);
        let (events_tx, event_rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);

        let factory = WiredFactory {
            command_tx: std::sync::Mutex::new(Some(command_tx)),
            event_rx: std::sync::Mutex::new(Some(event_rx)),
            ready_tx: events_tx.clone(),
        };

        let mut config = AppConfig::default();
        config.identity = "97254".into();
        let state = SharedState::new(config);

        let dispatcher = Dispatcher::new(Box::new(factory), SoundSettings::disabled());
        let pipeline_state = state.clone();
        tokio::spawn(async move {
            run_pipeline(&pipeline_state, dispatcher, transport_rx, dedupe).await;
        });

        Harness {
            transport_tx,
            commands,
            events_tx,
            state,
        }
    }

    fn notification(id: &str, kind: NotificationKind, is_permanent: bool) -> Notification {
        Notification {
            id: id.into(),
            kind,
            is_permanent,
            display_time: None,
        }
    }

    async fn next_command(commands: &mut mpsc::Receiver<SurfaceCommand>) -> SurfaceCommand {
        tokio::time::timeout(Duration::from_secs(30), commands.recv())
            .await
            .expect("timed out waiting for surface command")
            .expect("command channel closed")
    }

    async fn next_show(commands: &mut mpsc::Receiver<SurfaceCommand>) -> Notification {
        loop {
            if let SurfaceCommand::Show(n) = next_command(commands).await {
                return n;
            }
        }
    }

    #[tokio::test]
    async fn duplicate_poll_delivery_is_suppressed() {
        let mut h = start_pipeline(true);
        let n1 = notification(
            "n1",
            NotificationKind::Info {
                message: "hello".into(),
            },
            true,
        );

        h.transport_tx.send(n1.clone()).await.unwrap();
        h.transport_tx.send(n1).await.unwrap();
        let n2 = notification(
            "n2",
            NotificationKind::Info {
                message: "next".into(),
            },
            true,
        );
        h.transport_tx.send(n2).await.unwrap();

        assert_eq!(next_show(&mut h.commands).await.id, "n1");
        // The duplicate n1 was suppressed; n2 comes straight after.
        assert_eq!(next_show(&mut h.commands).await.id, "n2");
    }

    #[tokio::test]
    async fn push_mode_redelivers_same_id() {
        let mut h = start_pipeline(false);
        let n = notification(
            "n1",
            NotificationKind::Info {
                message: "hello".into(),
            },
            true,
        );
        h.transport_tx.send(n.clone()).await.unwrap();
        h.transport_tx.send(n).await.unwrap();

        assert_eq!(next_show(&mut h.commands).await.id, "n1");
        assert_eq!(next_show(&mut h.commands).await.id, "n1");
    }

    #[tokio::test(start_paused = true)]
    async fn timed_notification_is_removed_and_all_clear_sent() {
        let mut h = start_pipeline(false);
        let n = notification(
            "n2",
            NotificationKind::Coins {
                message: String::new(),
                amount: Some(1000),
            },
            false,
        );
        h.transport_tx.send(n).await.unwrap();
        assert_eq!(next_show(&mut h.commands).await.id, "n2");

        // COINS default is 15s; the expiry removes it and, as the last
        // visible notification, triggers the empty-set signal.
        let removed = next_command(&mut h.commands).await;
        assert!(matches!(removed, SurfaceCommand::Remove { ref id } if id == "n2"));
        assert!(matches!(
            next_command(&mut h.commands).await,
            SurfaceCommand::AllClear
        ));
    }

    #[tokio::test]
    async fn explicit_dismiss_of_last_notification_sends_all_clear() {
        let mut h = start_pipeline(false);
        let n = notification(
            "n1",
            NotificationKind::Info {
                message: "hello".into(),
            },
            true,
        );
        h.transport_tx.send(n).await.unwrap();
        assert_eq!(next_show(&mut h.commands).await.id, "n1");

        h.events_tx
            .send(SurfaceEvent::Dismiss { id: "n1".into() })
            .await
            .unwrap();
        assert!(matches!(
            next_command(&mut h.commands).await,
            SurfaceCommand::AllClear
        ));

        // Dismissing again is a no-op: no second AllClear arrives.
        h.events_tx
            .send(SurfaceEvent::Dismiss { id: "n1".into() })
            .await
            .unwrap();
        let n2 = notification(
            "n2",
            NotificationKind::Info {
                message: "again".into(),
            },
            true,
        );
        h.transport_tx.send(n2).await.unwrap();
        assert_eq!(next_show(&mut h.commands).await.id, "n2");
    }

    #[tokio::test]
    async fn shutdown_token_stops_the_pipeline() {
        let h = start_pipeline(false);
        h.state.shutdown_token().cancel();
        // After cancellation the pipeline drops its command sender.
        let mut commands = h.commands;
        tokio::time::timeout(Duration::from_secs(5), async {
            loop {
                if commands.recv().await.is_none() {
                    break;
                }
            }
        })
        .await
        .expect("pipeline did not stop");
    }
}
