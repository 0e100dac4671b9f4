use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::{
    transport::{PlayerConnection, Transport},
    types::{MediaState, PlaybackState, PlayerCommand, PlayerId, micros_to_ms, ms_to_micros},
};

/// Owns the single live player connection and the cached state snapshot.
///
/// All [`MediaState`] mutation happens here, on connect, disconnect, and
/// each poll. Every query is best-effort: a failed sub-query leaves the
/// corresponding fields at their previous values and the next poll tick
/// re-attempts.
pub struct SessionController {
    transport: Arc<dyn Transport>,
    connection: Option<Box<dyn PlayerConnection>>,
    state: MediaState,
}

impl SessionController {
    /// Create a disconnected controller.
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            connection: None,
            state: MediaState::default(),
        }
    }

    /// Current cached state snapshot.
    pub fn state(&self) -> &MediaState {
        &self.state
    }

    /// Whether a player connection is currently held.
    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    /// The active player, if connected.
    pub fn active(&self) -> Option<&PlayerId> {
        self.state.active.as_ref()
    }

    /// Bind to `id`, replacing any current connection.
    ///
    /// On success the player becomes active and one immediate poll
    /// populates the state. On bind failure the controller stays
    /// disconnected with an empty state.
    #[instrument(skip(self), fields(bus_name = %id.bus_name()))]
    pub async fn connect(&mut self, id: PlayerId) {
        self.disconnect();

        match self.transport.connect(&id).await {
            Ok(connection) => {
                info!("Connected to player");
                self.connection = Some(connection);
                self.state.active = Some(id);
                self.poll().await;
            }
            Err(e) => {
                warn!("Player bind failed: {e}");
                self.disconnect();
            }
        }
    }

    /// Release the connection and reset the state to empty. Idempotent.
    pub fn disconnect(&mut self) {
        if self.connection.take().is_some() {
            debug!(player = ?self.state.active, "Disconnected from player");
        }
        self.state = MediaState::default();
    }

    /// Refresh status, metadata, and position from the active player.
    ///
    /// Each of the three queries is independent; a failure retains the
    /// previous cached values. Position is only queried when the track
    /// duration is known. No-op while disconnected.
    pub async fn poll(&mut self) {
        let Some(connection) = self.connection.as_ref() else {
            return;
        };

        if let Ok(status) = connection.playback_status().await {
            self.state.playback = status;
        }

        if let Ok(track) = connection.metadata().await {
            self.state.title = track.title;
            self.state.artist = track.artist;
            self.state.album = track.album;
            self.state.duration_ms = track.duration_ms;
            self.state.has_position = track.duration_ms > 0;
        }

        if self.state.has_position {
            if let Ok(position_us) = connection.position_us().await {
                self.state.position_ms = micros_to_ms(position_us);
            }
        }
    }

    /// Issue a playback command to the active player. Fire-and-forget: a
    /// rejected command is not retried, the next poll reflects reality.
    /// No-op while disconnected.
    pub async fn command(&mut self, command: PlayerCommand) {
        let Some(connection) = self.connection.as_ref() else {
            return;
        };

        let result = match command {
            // Decided from the cached state rather than a fresh probe,
            // consistent with the poll cadence.
            PlayerCommand::PlayPause => {
                if self.state.playback == PlaybackState::Playing {
                    connection.pause().await
                } else {
                    connection.play().await
                }
            }
            PlayerCommand::Previous => connection.previous().await,
            PlayerCommand::Next => connection.next().await,
            PlayerCommand::Seek(position_ms) => {
                // SetPosition needs the current track id; the seek is
                // dropped when metadata cannot be fetched.
                match connection.metadata().await {
                    Ok(track) => match track.track_id {
                        Some(track_id) => {
                            connection
                                .set_position(&track_id, ms_to_micros(position_ms))
                                .await
                        }
                        None => {
                            debug!("Seek dropped: no track id in metadata");
                            Ok(())
                        }
                    },
                    Err(e) => {
                        debug!("Seek dropped: metadata fetch failed: {e}");
                        Ok(())
                    }
                }
            }
        };

        if let Err(e) = result {
            debug!(?command, "Player command failed: {e}");
        }
    }
}
