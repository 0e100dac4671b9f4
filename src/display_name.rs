//! Human-readable player names.
//!
//! Resolution order: the player's Identity property, then its DesktopEntry
//! (title-cased), then a table of well-known bus name suffixes, then a
//! generic rule on the bus name itself. Always yields a non-empty string
//! even when every property query fails.

use crate::{
    transport::Transport,
    types::{PLAYER_BUS_PREFIX, PlayerId},
};

/// Well-known instance-suffixed bus names mapped to canonical names.
const WELL_KNOWN: &[(&str, &str)] = &[
    ("firefox.instance", "Firefox"),
    ("chromium.instance", "Chromium"),
    ("chrome.instance", "Chrome"),
    ("spotify.instance", "Spotify"),
    ("vlc.instance", "VLC"),
];

/// Resolve a display name for a player, querying its identity properties
/// and falling back to [`from_bus_name`].
pub async fn resolve(transport: &dyn Transport, id: &PlayerId) -> String {
    if let Ok(identity) = transport.identity(id).await {
        if !identity.is_empty() {
            return identity;
        }
    }

    if let Ok(desktop_entry) = transport.desktop_entry(id).await {
        if !desktop_entry.is_empty() {
            return title_case(&desktop_entry);
        }
    }

    from_bus_name(id.bus_name())
}

/// Derive a display name from a bus name alone.
pub fn from_bus_name(bus_name: &str) -> String {
    let name = bus_name.strip_prefix(PLAYER_BUS_PREFIX).unwrap_or(bus_name);
    if name.is_empty() {
        return "Player".to_string();
    }

    for (pattern, display_name) in WELL_KNOWN {
        if name.starts_with(pattern) {
            return (*display_name).to_string();
        }
    }

    if let Some((base, _)) = name.split_once(".instance") {
        return title_case(base);
    }

    title_case(name)
}

fn title_case(name: &str) -> String {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => name.to_string(),
    }
}
