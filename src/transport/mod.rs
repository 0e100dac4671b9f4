//! Session bus abstraction consumed by the controller core.
//!
//! The controller never talks to D-Bus directly; it goes through the
//! [`Transport`] capability trait so selection and polling logic can be
//! exercised against an in-memory implementation in tests.

/// zbus-backed session bus transport.
pub mod dbus;
/// D-Bus proxy trait definitions for the MPRIS interfaces.
pub mod proxy;

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::{
    error::ControlError,
    types::{PlaybackState, PlayerId, TrackMetadata},
};

/// A player service appearing on or leaving the bus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationEvent {
    /// A player bus name was registered
    Registered(String),

    /// A player bus name was unregistered
    Unregistered(String),
}

/// Capabilities the controller needs from the session bus.
///
/// Status, identity, and desktop-entry reads are short-lived probes with no
/// persistent connection; [`Transport::connect`] is the only way to obtain
/// one, and the session controller is its only caller.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Enumerate all bus names currently registered.
    ///
    /// An unreachable bus yields an empty list; that is the normal
    /// "no players" state, not an error.
    async fn list_names(&self) -> Vec<String>;

    /// Probe a player's current playback status without connecting.
    ///
    /// # Errors
    /// Returns an error if the player is unreachable or reports no status.
    async fn probe_status(&self, id: &PlayerId) -> Result<PlaybackState, ControlError>;

    /// Read a player's Identity property.
    ///
    /// # Errors
    /// Returns an error if the player is unreachable or lacks the property.
    async fn identity(&self, id: &PlayerId) -> Result<String, ControlError>;

    /// Read a player's DesktopEntry property.
    ///
    /// # Errors
    /// Returns an error if the player is unreachable or lacks the property.
    async fn desktop_entry(&self, id: &PlayerId) -> Result<String, ControlError>;

    /// Bind a persistent connection to a player.
    ///
    /// # Errors
    /// Returns an error if the bus name is invalid or the player fails the
    /// initial validity check.
    async fn connect(&self, id: &PlayerId) -> Result<Box<dyn PlayerConnection>, ControlError>;

    /// Subscribe to player registration/unregistration events, filtered to
    /// the MPRIS bus name prefix.
    ///
    /// # Errors
    /// Returns an error if the signal subscription fails.
    async fn registration_events(
        &self,
    ) -> Result<BoxStream<'static, RegistrationEvent>, ControlError>;
}

/// A live connection to one player, owned by the session controller.
#[async_trait]
pub trait PlayerConnection: Send + Sync {
    /// Query the current playback status.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    async fn playback_status(&self) -> Result<PlaybackState, ControlError>;

    /// Query the current track metadata.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    async fn metadata(&self) -> Result<TrackMetadata, ControlError>;

    /// Query the current playback position in microseconds.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    async fn position_us(&self) -> Result<i64, ControlError>;

    /// Start playback.
    ///
    /// # Errors
    /// Returns an error if the call is rejected.
    async fn play(&self) -> Result<(), ControlError>;

    /// Pause playback.
    ///
    /// # Errors
    /// Returns an error if the call is rejected.
    async fn pause(&self) -> Result<(), ControlError>;

    /// Go to the previous track.
    ///
    /// # Errors
    /// Returns an error if the call is rejected.
    async fn previous(&self) -> Result<(), ControlError>;

    /// Skip to the next track.
    ///
    /// # Errors
    /// Returns an error if the call is rejected.
    async fn next(&self) -> Result<(), ControlError>;

    /// Set the absolute playback position for a track.
    ///
    /// # Errors
    /// Returns an error if the track id is invalid or the call is rejected.
    async fn set_position(&self, track_id: &str, position_us: i64) -> Result<(), ControlError>;
}
