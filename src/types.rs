use std::collections::HashMap;
use std::fmt;

use zbus::zvariant::{OwnedObjectPath, OwnedValue};

/// Bus name prefix shared by all discoverable MPRIS players.
pub const PLAYER_BUS_PREFIX: &str = "org.mpris.MediaPlayer2.";

/// Unique identifier for a media player session.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PlayerId(String);

impl PlayerId {
    /// Create a PlayerId from a D-Bus bus name.
    pub fn from_bus_name(bus_name: &str) -> Self {
        Self(bus_name.to_string())
    }

    /// Get the D-Bus bus name.
    pub fn bus_name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Current playback state of a media player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    /// Player is currently playing
    Playing,

    /// Player is paused
    Paused,

    /// Player is stopped
    #[default]
    Stopped,
}

impl From<&str> for PlaybackState {
    fn from(status: &str) -> Self {
        match status {
            "Playing" => Self::Playing,
            "Paused" => Self::Paused,
            _ => Self::Stopped,
        }
    }
}

/// Playback commands accepted by the session controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerCommand {
    /// Toggle between play and pause
    PlayPause,

    /// Go to previous track
    Previous,

    /// Skip to next track
    Next,

    /// Seek to an absolute position in milliseconds
    Seek(i64),
}

/// Metadata for the current track, decoded from the MPRIS metadata map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackMetadata {
    /// Track title (empty if unknown)
    pub title: String,

    /// Track artist(s), joined with ", " (empty if unknown)
    pub artist: String,

    /// Album name (empty if unknown)
    pub album: String,

    /// Track length in milliseconds (0 if unknown)
    pub duration_ms: i64,

    /// Track ID used for SetPosition calls
    pub track_id: Option<String>,
}

impl From<HashMap<String, OwnedValue>> for TrackMetadata {
    fn from(metadata: HashMap<String, OwnedValue>) -> Self {
        let mut track = Self::default();

        if let Some(title) = metadata.get("xesam:title") {
            if let Ok(title_str) = String::try_from(title.clone()) {
                track.title = title_str;
            }
        }

        if let Some(artist) = metadata.get("xesam:artist") {
            if let Ok(array) = <&zbus::zvariant::Array>::try_from(artist) {
                let artists: Vec<String> = array
                    .iter()
                    .filter_map(|artist| {
                        if let Ok(s) = artist.downcast_ref::<String>() {
                            Some(s.clone())
                        } else if let Ok(s) = artist.downcast_ref::<&str>() {
                            Some(s.to_string())
                        } else {
                            None
                        }
                    })
                    .collect();
                track.artist = artists.join(", ");
            } else if let Ok(artist_str) = String::try_from(artist.clone()) {
                track.artist = artist_str;
            }
        }

        if let Some(album) = metadata.get("xesam:album") {
            if let Ok(album_str) = String::try_from(album.clone()) {
                track.album = album_str;
            }
        }

        // Players report length as either signed or unsigned microseconds.
        if let Some(length) = metadata.get("mpris:length") {
            if let Ok(length_micros) = i64::try_from(length.clone()) {
                track.duration_ms = micros_to_ms(length_micros.max(0));
            } else if let Ok(length_micros) = u64::try_from(length.clone()) {
                track.duration_ms = micros_to_ms(length_micros.min(i64::MAX as u64) as i64);
            }
        }

        if let Some(track_id) = metadata.get("mpris:trackid") {
            if let Ok(path) = OwnedObjectPath::try_from(track_id.clone()) {
                track.track_id = Some(path.to_string());
            } else if let Ok(id_str) = String::try_from(track_id.clone()) {
                track.track_id = Some(id_str);
            }
        }

        track
    }
}

/// Normalized snapshot of the active player, consumed by presentation layers.
///
/// Written exclusively by the session controller; when `active` is `None`
/// every other field holds its default value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MediaState {
    /// Currently active player session, if any
    pub active: Option<PlayerId>,

    /// Track title (empty if unknown)
    pub title: String,

    /// Track artist(s) (empty if unknown)
    pub artist: String,

    /// Album name (empty if unknown)
    pub album: String,

    /// Track length in milliseconds (0 if unknown)
    pub duration_ms: i64,

    /// Playback position in milliseconds
    pub position_ms: i64,

    /// Whether position/seeking is meaningful (duration is known)
    pub has_position: bool,

    /// Current playback state
    pub playback: PlaybackState,
}

/// Convert MPRIS wire microseconds to milliseconds (truncating).
pub fn micros_to_ms(micros: i64) -> i64 {
    micros / 1000
}

/// Convert milliseconds to MPRIS wire microseconds.
pub fn ms_to_micros(ms: i64) -> i64 {
    ms * 1000
}

/// Map a 0..=100 seek percentage onto a track position in milliseconds.
pub fn percent_to_ms(percent: u8, duration_ms: i64) -> i64 {
    (i64::from(percent.min(100)) * duration_ms) / 100
}
