use tracing::debug;

use crate::{
    transport::Transport,
    types::{PLAYER_BUS_PREFIX, PlayerId},
};

/// The current set of known player sessions, in discovery order.
///
/// Holds identifiers only, never connections. Contents are replaced
/// atomically by [`PlayerRegistry::rescan`]; names that remain present keep
/// their position so enumeration stays stable across rescans.
pub struct PlayerRegistry {
    players: Vec<PlayerId>,
    ignored_patterns: Vec<String>,
}

impl PlayerRegistry {
    /// Create an empty registry.
    ///
    /// Bus names containing any of `ignored_patterns` as a substring are
    /// skipped during rescans.
    pub fn new(ignored_patterns: Vec<String>) -> Self {
        Self {
            players: Vec::new(),
            ignored_patterns,
        }
    }

    /// Re-enumerate player services from the transport, replacing the
    /// registry contents. An unreachable bus results in an empty registry.
    pub async fn rescan(&mut self, transport: &dyn Transport) {
        let names = transport.list_names().await;

        let mut next: Vec<PlayerId> = self
            .players
            .iter()
            .filter(|id| names.iter().any(|name| name == id.bus_name()))
            .cloned()
            .collect();

        for name in names {
            if !name.starts_with(PLAYER_BUS_PREFIX) {
                continue;
            }
            if self.is_ignored(&name) {
                continue;
            }
            if next.iter().any(|id| id.bus_name() == name) {
                continue;
            }
            next.push(PlayerId::from_bus_name(&name));
        }

        if next != self.players {
            debug!(count = next.len(), "Player registry updated");
        }
        self.players = next;
    }

    /// Known players in discovery order.
    pub fn players(&self) -> &[PlayerId] {
        &self.players
    }

    /// Number of known players.
    pub fn len(&self) -> usize {
        self.players.len()
    }

    /// Whether no players are known.
    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Whether the given player is currently known.
    pub fn contains(&self, id: &PlayerId) -> bool {
        self.players.contains(id)
    }

    fn is_ignored(&self, bus_name: &str) -> bool {
        self.ignored_patterns
            .iter()
            .any(|pattern| bus_name.contains(pattern))
    }
}
