//! Best-player selection policy.
//!
//! A greedy single-pass priority scan over candidates in discovery order:
//! Playing beats Paused beats Stopped, unreachable players are excluded,
//! and ties go to the earliest candidate. The order dependence of the
//! equal-priority tie-break is intentional and kept stable for tests.

use tracing::debug;

use crate::{
    transport::Transport,
    types::{PlaybackState, PlayerId},
};

/// Pick the best player to control from `candidates`.
///
/// A lone candidate is returned without probing. Otherwise each candidate
/// is probed in order: the first one found Playing wins immediately;
/// failing that, the first Paused candidate beats any Stopped one, and the
/// first reachable candidate is kept as a fallback. Returns `None` when
/// there are no candidates or every probe fails.
pub async fn select_best(
    transport: &dyn Transport,
    candidates: &[PlayerId],
) -> Option<PlayerId> {
    if candidates.is_empty() {
        return None;
    }

    if let [only] = candidates {
        return Some(only.clone());
    }

    let mut best: Option<(PlayerId, PlaybackState)> = None;

    for id in candidates {
        let status = match transport.probe_status(id).await {
            Ok(status) => status,
            Err(e) => {
                debug!(bus_name = %id.bus_name(), "Status probe failed: {e}");
                continue;
            }
        };

        if status == PlaybackState::Playing {
            return Some(id.clone());
        }

        match best {
            None => best = Some((id.clone(), status)),
            Some((_, PlaybackState::Stopped)) if status == PlaybackState::Paused => {
                best = Some((id.clone(), status));
            }
            _ => {}
        }
    }

    best.map(|(id, _)| id)
}

/// Look for a player that started playing while the active one is not.
///
/// Scans `candidates` in order, skipping `active`, and returns the first
/// one probed as Playing. Nothing else triggers a switch; a Paused peer
/// never preempts the active session, which keeps the selection from
/// oscillating between idle players.
pub async fn find_better_player(
    transport: &dyn Transport,
    candidates: &[PlayerId],
    active: &PlayerId,
) -> Option<PlayerId> {
    for id in candidates {
        if id == active {
            continue;
        }

        match transport.probe_status(id).await {
            Ok(PlaybackState::Playing) => return Some(id.clone()),
            Ok(_) => {}
            Err(e) => {
                debug!(bus_name = %id.bus_name(), "Status probe failed: {e}");
            }
        }
    }

    None
}
