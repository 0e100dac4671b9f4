use crate::types::PlayerId;

/// Errors that can occur while controlling media players.
#[derive(thiserror::Error, Debug)]
pub enum ControlError {
    /// Player with the given ID was not found
    #[error("Player {0} not found")]
    PlayerNotFound(PlayerId),

    /// Player is not responding to a status probe or command
    #[error("Player {0} not responding")]
    PlayerUnresponsive(PlayerId),

    /// D-Bus communication error
    #[error("D-Bus operation failed: {0}")]
    Dbus(#[from] zbus::Error),

    /// Failed to initialize the controller
    #[error("Failed to initialize media controller: {0}")]
    InitializationFailed(String),
}
