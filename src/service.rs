//! The media controls service: one control task serializing timer ticks,
//! bus registration events, and user intents over the shared state.

use std::{sync::Arc, time::Duration};

use futures::{StreamExt, stream::BoxStream};
use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
    time::MissedTickBehavior,
};
use tracing::{info, instrument};

use crate::{
    config::Config,
    controller::SessionController,
    display_name,
    error::ControlError,
    registry::PlayerRegistry,
    selector,
    transport::{RegistrationEvent, Transport, dbus::DbusTransport},
    types::{MediaState, PlaybackState, PlayerCommand, PlayerId, percent_to_ms},
};

/// One entry in the player selection list exposed to menus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerEntry {
    /// Player session identifier
    pub id: PlayerId,

    /// Resolved human-readable name
    pub display_name: String,

    /// Whether this is the active player
    pub is_active: bool,
}

/// User intents accepted by the control loop.
#[derive(Debug, Clone)]
enum Intent {
    PlayPause,
    Previous,
    Next,
    SelectPlayer(PlayerId),
    SeekPercent(u8),
}

/// Handle to a running media controls service.
///
/// State flows out through watch channels and intents flow in through a
/// queue, so any presentation layer only ever sees complete snapshots.
/// Dropping the handle stops the control task.
pub struct MediaControls {
    intents: mpsc::UnboundedSender<Intent>,
    state_rx: watch::Receiver<MediaState>,
    players_rx: watch::Receiver<Vec<PlayerEntry>>,
    task: JoinHandle<()>,
}

impl MediaControls {
    /// Start the service against the D-Bus session bus.
    ///
    /// Performs the initial player scan and best-player connect before
    /// returning, then keeps polling on the configured interval.
    ///
    /// # Errors
    /// Returns an error if the session bus connection or the registration
    /// signal subscription fails.
    pub async fn start(config: Config) -> Result<Self, ControlError> {
        let transport = Arc::new(DbusTransport::session().await?);
        Self::with_transport(transport, config).await
    }

    /// Start the service on an explicit transport implementation.
    ///
    /// # Errors
    /// Returns an error if the registration signal subscription fails.
    #[instrument(skip_all)]
    pub async fn with_transport(
        transport: Arc<dyn Transport>,
        config: Config,
    ) -> Result<Self, ControlError> {
        let events = transport.registration_events().await?;

        let (intent_tx, intent_rx) = mpsc::unbounded_channel();
        let (state_tx, state_rx) = watch::channel(MediaState::default());
        let (players_tx, players_rx) = watch::channel(Vec::new());

        let mut control_loop = ControlLoop {
            transport: transport.clone(),
            registry: PlayerRegistry::new(config.ignored_players),
            controller: SessionController::new(transport),
            state_tx,
            players_tx,
        };

        control_loop.initialize().await;
        info!("Media controls service started");

        let poll_interval = Duration::from_millis(config.poll_interval_ms.max(1));
        let task = tokio::spawn(control_loop.run(poll_interval, events, intent_rx));

        Ok(Self {
            intents: intent_tx,
            state_rx,
            players_rx,
            task,
        })
    }

    /// Snapshot of the current normalized player state.
    pub fn current_state(&self) -> MediaState {
        self.state_rx.borrow().clone()
    }

    /// Players available for selection, in discovery order.
    pub fn players(&self) -> Vec<PlayerEntry> {
        self.players_rx.borrow().clone()
    }

    /// One-line label for the widget: "No player" without an active
    /// session, otherwise "title - artist" (artist omitted when unknown),
    /// otherwise the active player's display name.
    pub fn label(&self) -> String {
        let state = self.state_rx.borrow();
        let Some(active) = state.active.as_ref() else {
            return "No player".to_string();
        };

        if !state.title.is_empty() {
            return if state.artist.is_empty() {
                state.title.clone()
            } else {
                format!("{} - {}", state.title, state.artist)
            };
        }

        self.players_rx
            .borrow()
            .iter()
            .find(|entry| &entry.id == active)
            .map(|entry| entry.display_name.clone())
            .unwrap_or_else(|| display_name::from_bus_name(active.bus_name()))
    }

    /// Watch channel carrying every published state snapshot.
    pub fn watch_state(&self) -> watch::Receiver<MediaState> {
        self.state_rx.clone()
    }

    /// Watch channel carrying the player selection list.
    pub fn watch_players(&self) -> watch::Receiver<Vec<PlayerEntry>> {
        self.players_rx.clone()
    }

    /// Toggle play/pause on the active player.
    pub fn play_pause(&self) {
        let _ = self.intents.send(Intent::PlayPause);
    }

    /// Go to the previous track on the active player.
    pub fn previous(&self) {
        let _ = self.intents.send(Intent::Previous);
    }

    /// Skip to the next track on the active player.
    pub fn next(&self) {
        let _ = self.intents.send(Intent::Next);
    }

    /// Make `id` the active player. Unknown ids are ignored.
    pub fn select_player(&self, id: PlayerId) {
        let _ = self.intents.send(Intent::SelectPlayer(id));
    }

    /// Seek the active player to a percentage of the track duration.
    pub fn seek_percent(&self, percent: u8) {
        let _ = self.intents.send(Intent::SeekPercent(percent));
    }
}

impl Drop for MediaControls {
    fn drop(&mut self) {
        self.task.abort();
    }
}

struct ControlLoop {
    transport: Arc<dyn Transport>,
    registry: PlayerRegistry,
    controller: SessionController,
    state_tx: watch::Sender<MediaState>,
    players_tx: watch::Sender<Vec<PlayerEntry>>,
}

impl ControlLoop {
    /// Initial scan and best-player connect, before the loop starts.
    async fn initialize(&mut self) {
        self.rescan().await;
        if !self.registry.is_empty() {
            self.connect_to_best().await;
        }
        self.publish_state();
    }

    async fn run(
        mut self,
        poll_interval: Duration,
        mut events: BoxStream<'static, RegistrationEvent>,
        mut intents: mpsc::UnboundedReceiver<Intent>,
    ) {
        let mut ticker = tokio::time::interval(poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        // The first tick of a tokio interval fires immediately and would
        // double up on the initial poll from initialize().
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => self.on_tick().await,
                Some(event) = events.next() => self.on_registration(event).await,
                intent = intents.recv() => match intent {
                    Some(intent) => self.on_intent(intent).await,
                    None => break,
                },
            }
            self.publish_state();
        }
    }

    /// Periodic refresh: poll the active player, then consider a takeover
    /// if it is idle and peers exist. A takeover reconnects, superseding
    /// the poll that just completed.
    async fn on_tick(&mut self) {
        if !self.controller.is_connected() {
            return;
        }

        self.controller.poll().await;

        if self.registry.len() > 1 && self.controller.state().playback != PlaybackState::Playing {
            if let Some(active) = self.controller.active() {
                let better = selector::find_better_player(
                    self.transport.as_ref(),
                    self.registry.players(),
                    active,
                )
                .await;

                if let Some(better) = better {
                    info!(player = %better, "Switching to player that started playing");
                    self.controller.connect(better).await;
                    self.publish_players().await;
                }
            }
        }
    }

    async fn on_registration(&mut self, event: RegistrationEvent) {
        match event {
            RegistrationEvent::Registered(name) => {
                info!(bus_name = %name, "Player registered");
                self.rescan().await;
                if !self.controller.is_connected() && !self.registry.is_empty() {
                    self.connect_to_best().await;
                }
            }
            RegistrationEvent::Unregistered(name) => {
                info!(bus_name = %name, "Player unregistered");
                let was_active = self
                    .controller
                    .active()
                    .is_some_and(|active| active.bus_name() == name);

                if was_active {
                    self.controller.disconnect();
                    self.rescan().await;
                    if !self.registry.is_empty() {
                        self.connect_to_best().await;
                    }
                }
                self.rescan().await;
            }
        }
    }

    async fn on_intent(&mut self, intent: Intent) {
        match intent {
            Intent::PlayPause => self.controller.command(PlayerCommand::PlayPause).await,
            Intent::Previous => self.controller.command(PlayerCommand::Previous).await,
            Intent::Next => self.controller.command(PlayerCommand::Next).await,
            Intent::SelectPlayer(id) => {
                if self.registry.contains(&id) {
                    self.controller.connect(id).await;
                    self.publish_players().await;
                }
            }
            Intent::SeekPercent(percent) => {
                let state = self.controller.state();
                if state.has_position {
                    let target_ms = percent_to_ms(percent, state.duration_ms);
                    self.controller.command(PlayerCommand::Seek(target_ms)).await;
                }
            }
        }
    }

    async fn connect_to_best(&mut self) {
        let best = selector::select_best(self.transport.as_ref(), self.registry.players()).await;
        if let Some(best) = best {
            self.controller.connect(best).await;
        }
        self.publish_players().await;
    }

    async fn rescan(&mut self) {
        self.registry.rescan(self.transport.as_ref()).await;
        self.publish_players().await;
    }

    async fn publish_players(&mut self) {
        let active = self.controller.active().cloned();
        let mut entries = Vec::with_capacity(self.registry.len());

        for id in self.registry.players() {
            entries.push(PlayerEntry {
                id: id.clone(),
                display_name: display_name::resolve(self.transport.as_ref(), id).await,
                is_active: active.as_ref() == Some(id),
            });
        }

        let _ = self.players_tx.send(entries);
    }

    fn publish_state(&self) {
        let _ = self.state_tx.send(self.controller.state().clone());
    }
}
