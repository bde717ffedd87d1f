//! Configuration file parser for ~/.config/volumeread/config.toml.
//!
//! The config file is optional. A missing file yields `Config::default()`.
//! Unknown keys are accepted by serde but logged as warnings, since they are
//! usually typos.
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

use crate::filter::SortOrder;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Config file too large: {0}")]
    TooLarge(String),

    #[error("Invalid config value: {0}")]
    Invalid(String),
}

// ============================================================================
// Configuration Struct
// ============================================================================

pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:5000";

/// Longest accepted auto-refresh interval (one week).
pub const MAX_REFRESH_INTERVAL_MINUTES: u64 = 7 * 24 * 60;

/// Top-level application configuration.
///
/// All fields use `#[serde(default)]` so any subset of keys can be specified.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the VolumeRead server.
    pub server_url: String,

    /// Auto-refresh interval in minutes. 0 disables auto-refresh.
    pub refresh_interval_minutes: u64,

    /// Per-request timeout for every API call.
    pub request_timeout_secs: u64,

    /// Initial sort order of the article list.
    pub default_sort: SortOrder,

    /// Initial value of the smart-cap toggle, until the user flips it.
    pub smart_cap: bool,

    /// External player for completion-detectable embeds, e.g. `mpv`.
    /// The media URL is appended as the last argument.
    pub player_command: Option<String>,

    /// Custom keybinding overrides. Keys are action names, values are key strings.
    pub keybindings: HashMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            refresh_interval_minutes: 15,
            request_timeout_secs: 30,
            default_sort: SortOrder::Newest,
            smart_cap: false,
            player_command: None,
            keybindings: HashMap::new(),
        }
    }
}

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    const KNOWN_KEYS: [&'static str; 7] = [
        "server_url",
        "refresh_interval_minutes",
        "request_timeout_secs",
        "default_sort",
        "smart_cap",
        "player_command",
        "keybindings",
    ];

    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Ok(Config::default())`
    /// - Empty file → `Ok(Config::default())`
    /// - Invalid TOML → `Err(ConfigError::Parse)` with line number info
    /// - Unknown keys → accepted, logged as warning
    /// - Refresh interval over a week → `Err(ConfigError::Invalid)`
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::metadata(path) {
            Ok(meta) if meta.len() > Self::MAX_FILE_SIZE => {
                return Err(ConfigError::TooLarge(format!(
                    "Config file is {} bytes (max {} bytes)",
                    meta.len(),
                    Self::MAX_FILE_SIZE
                )));
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No config file found, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
            Ok(_) => {}
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "Config file disappeared, using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(ConfigError::Io(e)),
        };

        if content.trim().is_empty() {
            tracing::debug!(path = %path.display(), "Config file is empty, using defaults");
            return Ok(Self::default());
        }

        if let Ok(raw) = content.parse::<toml::Table>() {
            for key in raw.keys() {
                if !Self::KNOWN_KEYS.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let config: Config = toml::from_str(&content)?;
        if config.refresh_interval_minutes > MAX_REFRESH_INTERVAL_MINUTES {
            return Err(ConfigError::Invalid(format!(
                "refresh_interval_minutes is {} (max {})",
                config.refresh_interval_minutes, MAX_REFRESH_INTERVAL_MINUTES
            )));
        }
        tracing::info!(
            path = %path.display(),
            server = %config.server_url,
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Command line for the external player, split on whitespace.
    /// `None` when unset or blank.
    pub fn player_argv(&self) -> Option<Vec<String>> {
        let argv: Vec<String> = self
            .player_command
            .as_deref()?
            .split_whitespace()
            .map(str::to_string)
            .collect();
        (!argv.is_empty()).then_some(argv)
    }
}

// ============================================================================
// Tests
// ============================================================================
