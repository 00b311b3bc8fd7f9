//! Tabdeck configuration.
//!
//! TOML-based settings for the tab layout, container defaults, new windows,
//! and the bridge to the renderer UI. Every section uses serde defaults so
//! a partial file (or none at all) works.

pub mod schema;
pub mod toml_loader;
pub mod validation;

pub use schema::{TabdeckConfig, CONFIG_SCHEMA_VERSION};

use std::path::Path;

use tabdeck_common::ConfigError;

/// Load config from the platform default path, creating it if missing.
/// Invalid settings have already been swapped for defaults by the loader.
pub fn load_config() -> Result<TabdeckConfig, ConfigError> {
    toml_loader::load_default()
}

/// Load config from an explicit path (the `--config` override).
pub fn load_config_from(path: &Path) -> Result<TabdeckConfig, ConfigError> {
    toml_loader::load_from_path(path)
}

/// Serialize a config to a pretty-printed JSON string.
pub fn config_to_json(config: &TabdeckConfig) -> String {
    serde_json::to_string_pretty(config)
        .unwrap_or_else(|e| format!("{{\"error\": \"failed to serialize config: {e}\"}}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_to_json_contains_all_sections() {
        let json = config_to_json(&TabdeckConfig::default());
        assert!(json.contains("\"tabs\""));
        assert!(json.contains("\"container\""));
        assert!(json.contains("\"window\""));
        assert!(json.contains("\"bridge\""));
        assert!(json.contains("\"logging\""));
    }

    #[test]
    fn default_config_round_trips_through_json() {
        let json = config_to_json(&TabdeckConfig::default());
        let parsed: TabdeckConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.tabs.header_height, 40);
        assert_eq!(parsed.bridge.event_key, "YDS_NATIVE_BRIDGE_EVENT_KEY");
    }

    #[test]
    fn load_config_from_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tabdeck.toml");
        std::fs::write(&path, "[tabs]\nheader_height = 32\n").unwrap();
        let config = load_config_from(&path).unwrap();
        assert_eq!(config.tabs.header_height, 32);
    }

    #[test]
    fn load_config_from_invalid_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tabdeck.toml");
        std::fs::write(&path, "[window]\nwidth = 5\n").unwrap();
        let config = load_config_from(&path).unwrap();
        assert_eq!(config.window.width, 800);
    }
}
