//! In-memory transport used to drive the controller in tests.

#![allow(dead_code)]
#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::{
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use futures::stream::BoxStream;
use tokio::sync::{mpsc, watch};
use tokio_stream::wrappers::UnboundedReceiverStream;

use mediadock::{
    error::ControlError,
    transport::{PlayerConnection, RegistrationEvent, Transport},
    types::{PlaybackState, PlayerId, TrackMetadata},
};

/// State of one simulated player on the fake bus.
#[derive(Debug, Clone)]
pub struct FakePlayer {
    pub status: PlaybackState,
    pub metadata: TrackMetadata,
    pub position_us: i64,
    pub identity: Option<String>,
    pub desktop_entry: Option<String>,
    pub probe_fails: bool,
    pub bind_fails: bool,
    pub metadata_fails: bool,
    pub play_calls: usize,
    pub pause_calls: usize,
    pub previous_calls: usize,
    pub next_calls: usize,
    pub last_set_position: Option<(String, i64)>,
}

impl Default for FakePlayer {
    fn default() -> Self {
        Self {
            status: PlaybackState::Stopped,
            metadata: TrackMetadata::default(),
            position_us: 0,
            identity: None,
            desktop_entry: None,
            probe_fails: false,
            bind_fails: false,
            metadata_fails: false,
            play_calls: 0,
            pause_calls: 0,
            previous_calls: 0,
            next_calls: 0,
            last_set_position: None,
        }
    }
}

impl FakePlayer {
    pub fn with_status(status: PlaybackState) -> Self {
        Self {
            status,
            ..Self::default()
        }
    }

    pub fn with_track(status: PlaybackState, title: &str, artist: &str, duration_ms: i64) -> Self {
        Self {
            status,
            metadata: TrackMetadata {
                title: title.to_string(),
                artist: artist.to_string(),
                album: String::new(),
                duration_ms,
                track_id: Some("/org/mediadock/track/1".to_string()),
            },
            ..Self::default()
        }
    }
}

struct Inner {
    players: Vec<(String, FakePlayer)>,
}

/// Fake session bus: an ordered player table plus a registration event
/// queue, with a counter for connectionless status probes.
pub struct FakeTransport {
    inner: Arc<Mutex<Inner>>,
    probes: AtomicUsize,
    events_tx: mpsc::UnboundedSender<RegistrationEvent>,
    events_rx: Mutex<Option<mpsc::UnboundedReceiver<RegistrationEvent>>>,
}

impl FakeTransport {
    pub fn new() -> Arc<Self> {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Arc::new(Self {
            inner: Arc::new(Mutex::new(Inner {
                players: Vec::new(),
            })),
            probes: AtomicUsize::new(0),
            events_tx,
            events_rx: Mutex::new(Some(events_rx)),
        })
    }

    /// Add a player without emitting a registration event (pre-start
    /// population).
    pub fn add_player(&self, bus_name: &str, player: FakePlayer) -> PlayerId {
        let mut inner = self.inner.lock().unwrap();
        inner.players.push((bus_name.to_string(), player));
        PlayerId::from_bus_name(bus_name)
    }

    /// Add a player and emit a registration event.
    pub fn register(&self, bus_name: &str, player: FakePlayer) -> PlayerId {
        let id = self.add_player(bus_name, player);
        let _ = self
            .events_tx
            .send(RegistrationEvent::Registered(bus_name.to_string()));
        id
    }

    /// Remove a player and emit an unregistration event.
    pub fn unregister(&self, bus_name: &str) {
        {
            let mut inner = self.inner.lock().unwrap();
            inner.players.retain(|(name, _)| name != bus_name);
        }
        let _ = self
            .events_tx
            .send(RegistrationEvent::Unregistered(bus_name.to_string()));
    }

    /// Update a player's playback status in place.
    pub fn set_status(&self, bus_name: &str, status: PlaybackState) {
        self.update(bus_name, |player| player.status = status);
    }

    /// Mutate a player's state in place.
    pub fn update(&self, bus_name: &str, f: impl FnOnce(&mut FakePlayer)) {
        let mut inner = self.inner.lock().unwrap();
        if let Some((_, player)) = inner.players.iter_mut().find(|(name, _)| name == bus_name) {
            f(player);
        }
    }

    /// Read a snapshot of a player's state.
    pub fn player(&self, bus_name: &str) -> Option<FakePlayer> {
        let inner = self.inner.lock().unwrap();
        inner
            .players
            .iter()
            .find(|(name, _)| name == bus_name)
            .map(|(_, player)| player.clone())
    }

    /// Number of connectionless status probes issued so far.
    pub fn probe_count(&self) -> usize {
        self.probes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn list_names(&self) -> Vec<String> {
        let inner = self.inner.lock().unwrap();
        inner.players.iter().map(|(name, _)| name.clone()).collect()
    }

    async fn probe_status(&self, id: &PlayerId) -> Result<PlaybackState, ControlError> {
        self.probes.fetch_add(1, Ordering::SeqCst);
        let inner = self.inner.lock().unwrap();
        let player = inner
            .players
            .iter()
            .find(|(name, _)| name == id.bus_name())
            .map(|(_, player)| player)
            .ok_or_else(|| ControlError::PlayerNotFound(id.clone()))?;

        if player.probe_fails {
            return Err(ControlError::PlayerUnresponsive(id.clone()));
        }
        Ok(player.status)
    }

    async fn identity(&self, id: &PlayerId) -> Result<String, ControlError> {
        let inner = self.inner.lock().unwrap();
        inner
            .players
            .iter()
            .find(|(name, _)| name == id.bus_name())
            .and_then(|(_, player)| player.identity.clone())
            .ok_or_else(|| ControlError::PlayerNotFound(id.clone()))
    }

    async fn desktop_entry(&self, id: &PlayerId) -> Result<String, ControlError> {
        let inner = self.inner.lock().unwrap();
        inner
            .players
            .iter()
            .find(|(name, _)| name == id.bus_name())
            .and_then(|(_, player)| player.desktop_entry.clone())
            .ok_or_else(|| ControlError::PlayerNotFound(id.clone()))
    }

    async fn connect(&self, id: &PlayerId) -> Result<Box<dyn PlayerConnection>, ControlError> {
        let inner = self.inner.lock().unwrap();
        let player = inner
            .players
            .iter()
            .find(|(name, _)| name == id.bus_name())
            .map(|(_, player)| player)
            .ok_or_else(|| ControlError::PlayerNotFound(id.clone()))?;

        if player.bind_fails {
            return Err(ControlError::PlayerUnresponsive(id.clone()));
        }

        Ok(Box::new(FakeConnection {
            inner: Arc::clone(&self.inner),
            id: id.clone(),
        }))
    }

    async fn registration_events(
        &self,
    ) -> Result<BoxStream<'static, RegistrationEvent>, ControlError> {
        let receiver = self
            .events_rx
            .lock()
            .unwrap()
            .take()
            .ok_or_else(|| {
                ControlError::InitializationFailed("events already subscribed".to_string())
            })?;
        Ok(Box::pin(UnboundedReceiverStream::new(receiver)))
    }
}

struct FakeConnection {
    inner: Arc<Mutex<Inner>>,
    id: PlayerId,
}

impl FakeConnection {
    fn with_player<T>(
        &self,
        f: impl FnOnce(&mut FakePlayer) -> Result<T, ControlError>,
    ) -> Result<T, ControlError> {
        let mut inner = self.inner.lock().unwrap();
        let player = inner
            .players
            .iter_mut()
            .find(|(name, _)| name == self.id.bus_name())
            .map(|(_, player)| player)
            .ok_or_else(|| ControlError::PlayerUnresponsive(self.id.clone()))?;
        f(player)
    }
}

#[async_trait]
impl PlayerConnection for FakeConnection {
    async fn playback_status(&self) -> Result<PlaybackState, ControlError> {
        self.with_player(|player| Ok(player.status))
    }

    async fn metadata(&self) -> Result<TrackMetadata, ControlError> {
        let id = self.id.clone();
        self.with_player(|player| {
            if player.metadata_fails {
                Err(ControlError::PlayerUnresponsive(id))
            } else {
                Ok(player.metadata.clone())
            }
        })
    }

    async fn position_us(&self) -> Result<i64, ControlError> {
        self.with_player(|player| Ok(player.position_us))
    }

    async fn play(&self) -> Result<(), ControlError> {
        self.with_player(|player| {
            player.play_calls += 1;
            player.status = PlaybackState::Playing;
            Ok(())
        })
    }

    async fn pause(&self) -> Result<(), ControlError> {
        self.with_player(|player| {
            player.pause_calls += 1;
            player.status = PlaybackState::Paused;
            Ok(())
        })
    }

    async fn previous(&self) -> Result<(), ControlError> {
        self.with_player(|player| {
            player.previous_calls += 1;
            Ok(())
        })
    }

    async fn next(&self) -> Result<(), ControlError> {
        self.with_player(|player| {
            player.next_calls += 1;
            Ok(())
        })
    }

    async fn set_position(&self, track_id: &str, position_us: i64) -> Result<(), ControlError> {
        self.with_player(|player| {
            player.last_set_position = Some((track_id.to_string(), position_us));
            player.position_us = position_us;
            Ok(())
        })
    }
}

/// Wait until `predicate` holds for the watched value, or panic after a
/// few seconds.
pub async fn wait_for<T, F>(rx: &mut watch::Receiver<T>, predicate: F)
where
    F: Fn(&T) -> bool,
{
    let outcome = tokio::time::timeout(Duration::from_secs(3), async {
        loop {
            if predicate(&rx.borrow()) {
                return;
            }
            if rx.changed().await.is_err() {
                panic!("watch channel closed before condition held");
            }
        }
    })
    .await;

    outcome.expect("condition not reached within timeout");
}

/// Poll `predicate` until it holds, or panic after a few seconds. For
/// conditions on the fake transport rather than a watch channel.
pub async fn eventually(predicate: impl Fn() -> bool) {
    let outcome = tokio::time::timeout(Duration::from_secs(3), async {
        let mut ticker = tokio::time::interval(Duration::from_millis(10));
        loop {
            ticker.tick().await;
            if predicate() {
                return;
            }
        }
    })
    .await;

    outcome.expect("condition not reached within timeout");
}
