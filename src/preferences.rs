//! Preference manager that merges config.toml defaults with stored overrides.
//!
//! Config values serve as defaults; rows in the local `user_preferences`
//! table override them. Writes always go to the database, never to the
//! config file.
use std::collections::HashMap;

use anyhow::Result;

use crate::config::Config;
use crate::filter::SortOrder;
use crate::storage::Database;
use crate::view::{LayoutStyle, ViewKind};

const SMART_CAP: &str = "smart_cap";
const KEYBIND_PREFIX: &str = "keybind.";

// ============================================================================
// PreferenceManager
// ============================================================================

/// Merged preference map: config defaults + stored overrides.
///
/// Reads are in-memory. Writes update the map first; persisting is the
/// caller's job via [`PreferenceManager::set`] or a background task.
#[derive(Debug, Clone, Default)]
pub struct PreferenceManager {
    prefs: HashMap<String, String>,
}

impl PreferenceManager {
    /// Load preferences by merging config defaults with stored overrides.
    pub async fn load(config: &Config, db: &Database) -> Result<Self> {
        let mut prefs = Self::flatten_config(config);

        for (key, value) in db.get_preferences_by_prefix("").await? {
            prefs.insert(key, value);
        }

        Ok(Self { prefs })
    }

    /// Create from config only. Fallback for when the store cannot be opened.
    pub fn from_config(config: &Config) -> Self {
        Self {
            prefs: Self::flatten_config(config),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.prefs.get(key).map(String::as_str)
    }

    /// Update the in-memory value only.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.prefs.insert(key.into(), value.into());
    }

    /// Write to the store, then update the in-memory map.
    pub async fn set(&mut self, db: &Database, key: &str, value: &str) -> Result<()> {
        db.set_preference(key, value).await?;
        self.prefs.insert(key.to_string(), value.to_string());
        Ok(())
    }

    // ========================================================================
    // Type-safe Accessors
    // ========================================================================

    /// Key holding the local layout style of a top-level view.
    pub fn style_key(kind: ViewKind) -> String {
        format!("style.{}", kind.as_str())
    }

    /// Locally stored layout for a top-level view. Unknown values read as
    /// no preference.
    pub fn view_style(&self, kind: ViewKind) -> Option<LayoutStyle> {
        self.get(&Self::style_key(kind))
            .and_then(LayoutStyle::from_str_name)
    }

    /// Record a top-level view's layout and return the `(key, value)` pair
    /// to persist.
    pub fn set_view_style(&mut self, kind: ViewKind, style: LayoutStyle) -> (String, String) {
        let key = Self::style_key(kind);
        let value = style.as_str().to_string();
        self.prefs.insert(key.clone(), value.clone());
        (key, value)
    }

    pub fn smart_cap(&self) -> bool {
        self.get(SMART_CAP)
            .and_then(|v| v.parse().ok())
            .unwrap_or(false)
    }

    /// Record the smart-cap toggle and return the `(key, value)` pair to persist.
    pub fn set_smart_cap(&mut self, enabled: bool) -> (String, String) {
        let value = enabled.to_string();
        self.prefs.insert(SMART_CAP.to_string(), value.clone());
        (SMART_CAP.to_string(), value)
    }

    /// Auto-refresh interval in minutes. 0 = manual only.
    pub fn refresh_interval(&self) -> u64 {
        self.get("refresh_interval_minutes")
            .and_then(|v| v.parse().ok())
            .unwrap_or(15)
    }

    pub fn default_sort(&self) -> SortOrder {
        match self.get("default_sort") {
            Some("oldest") => SortOrder::Oldest,
            _ => SortOrder::Newest,
        }
    }

    /// Keybinding overrides (`keybind.<action>` entries) keyed by action name.
    pub fn keybinding_overrides(&self) -> HashMap<String, String> {
        self.prefs
            .iter()
            .filter_map(|(k, v)| {
                k.strip_prefix(KEYBIND_PREFIX)
                    .map(|action| (action.to_string(), v.clone()))
            })
            .collect()
    }

    // ========================================================================
    // Internal Helpers
    // ========================================================================

    /// Flatten `Config` into dotted key-value pairs.
    fn flatten_config(config: &Config) -> HashMap<String, String> {
        let mut map = HashMap::new();

        map.insert(
            "refresh_interval_minutes".to_string(),
            config.refresh_interval_minutes.to_string(),
        );
        map.insert(
            "default_sort".to_string(),
            config.default_sort.as_str().to_string(),
        );
        map.insert(SMART_CAP.to_string(), config.smart_cap.to_string());

        for (action, key_str) in &config.keybindings {
            map.insert(format!("{}{}", KEYBIND_PREFIX, action), key_str.clone());
        }

        map
    }
}

// ============================================================================
// Tests
// ============================================================================
