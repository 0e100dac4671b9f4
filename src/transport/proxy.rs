use std::collections::HashMap;

use zbus::{Result, proxy, zvariant::ObjectPath};

/// MPRIS MediaPlayer2 root interface proxy
///
/// Provides access to player identity properties used for display names
#[proxy(
    interface = "org.mpris.MediaPlayer2",
    default_service = "org.mpris.MediaPlayer2",
    default_path = "/org/mpris/MediaPlayer2"
)]
pub trait MediaPlayer2 {
    /// Human-readable name of the player
    #[zbus(property)]
    fn identity(&self) -> Result<String>;

    /// Desktop entry name for the player
    #[zbus(property)]
    fn desktop_entry(&self) -> Result<String>;
}

/// MPRIS MediaPlayer2.Player interface proxy
///
/// Provides access to the playback control interface for media players
#[proxy(
    interface = "org.mpris.MediaPlayer2.Player",
    default_service = "org.mpris.MediaPlayer2",
    default_path = "/org/mpris/MediaPlayer2"
)]
pub trait MediaPlayer2Player {
    /// Start playback
    fn play(&self) -> Result<()>;

    /// Pause playback
    fn pause(&self) -> Result<()>;

    /// Skip to next track
    fn next(&self) -> Result<()>;

    /// Skip to previous track
    fn previous(&self) -> Result<()>;

    /// Set absolute playback position in microseconds
    fn set_position(&self, track_id: &ObjectPath<'_>, position: i64) -> Result<()>;

    /// Current playback status (Playing, Paused, Stopped)
    #[zbus(property)]
    fn playback_status(&self) -> Result<String>;

    /// Current track metadata
    #[zbus(property)]
    fn metadata(&self) -> Result<HashMap<String, zbus::zvariant::OwnedValue>>;

    /// Current playback position in microseconds
    #[zbus(property)]
    fn position(&self) -> Result<i64>;
}
