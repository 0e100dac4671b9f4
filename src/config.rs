use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Media controls configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Polling interval for the active player, in milliseconds
    pub poll_interval_ms: u64,

    /// List of player bus name patterns to ignore during discovery
    pub ignored_players: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            poll_interval_ms: 1000,
            ignored_players: Vec::new(),
        }
    }
}

/// Errors that can occur while loading configuration.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// Config file exists but could not be read
    #[error("Failed to read config {path}: {source}")]
    Read {
        /// Path that failed to read
        path: PathBuf,
        /// Underlying IO error
        source: std::io::Error,
    },

    /// Config file contains invalid TOML
    #[error("Invalid config {path}: {source}")]
    Parse {
        /// Path that failed to parse
        path: PathBuf,
        /// Underlying TOML error
        source: toml::de::Error,
    },
}

impl Config {
    /// Load configuration from the default location
    /// (`$XDG_CONFIG_HOME/mediadock/config.toml`, falling back to
    /// `~/.config`). A missing file yields the defaults.
    ///
    /// # Errors
    /// Returns `ConfigError` if an existing file cannot be read or parsed.
    pub fn load() -> Result<Self, ConfigError> {
        match Self::default_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load configuration from an explicit path. A missing file yields the
    /// defaults.
    ///
    /// # Errors
    /// Returns `ConfigError` if an existing file cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    fn default_path() -> Option<PathBuf> {
        let config_dir = std::env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")))?;

        Some(config_dir.join("mediadock").join("config.toml"))
    }
}
