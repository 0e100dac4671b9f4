//! Mediadock - MPRIS media controls for dock and panel widgets.
//!
//! Mediadock discovers MPRIS-compatible media players on the D-Bus session
//! bus, picks the best one to control when several are running, and keeps a
//! normalized state snapshot in sync through periodic polling. The main
//! features include:
//!
//! - Automatic player discovery from bus registration events and rescans
//! - Best-player selection (Playing > Paused > Stopped) with automatic
//!   takeover when an idle session's peer starts playing
//! - A presentation-agnostic state snapshot plus playback intents, so any
//!   widget or menu layer can render it
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use mediadock::{config::Config, service::MediaControls};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let controls = MediaControls::start(Config::default()).await?;
//!
//! println!("{}", controls.label());
//! controls.play_pause();
//! # Ok(())
//! # }
//! ```

/// Configuration loading and defaults.
pub mod config;

/// Session controller owning the active player connection.
pub mod controller;

/// Display name resolution for player sessions.
pub mod display_name;

/// Error types.
pub mod error;

/// Known player sessions in discovery order.
pub mod registry;

/// Best-player selection policy.
pub mod selector;

/// The control loop and its public handle.
pub mod service;

/// Tracing initialization.
pub mod tracing_config;

/// Session bus abstraction and the zbus implementation.
pub mod transport;

/// Core value types: player ids, playback state, state snapshots.
pub mod types;

pub use error::ControlError;
pub use service::{MediaControls, PlayerEntry};
pub use types::{MediaState, PlaybackState, PlayerCommand, PlayerId, TrackMetadata};
