//! TOML config file loading and creation.

use std::path::{Path, PathBuf};

use tabdeck_common::ConfigError;
use tracing::{info, warn};

use crate::schema::TabdeckConfig;
use crate::validation;

/// Parse TOML text. Missing fields take serde defaults; settings that
/// fail validation are dropped in favour of the defaults, with a warning.
pub fn parse_config(content: &str) -> Result<TabdeckConfig, ConfigError> {
    let config: TabdeckConfig = toml::from_str(content)
        .map_err(|e| ConfigError::ParseError(format!("failed to parse TOML: {e}")))?;

    match validation::validate(&config) {
        Ok(()) => Ok(config),
        Err(e) => {
            warn!("ignoring invalid config ({e}), using defaults");
            Ok(TabdeckConfig::default())
        }
    }
}

/// Load config from a specific TOML file path.
pub fn load_from_path(path: &Path) -> Result<TabdeckConfig, ConfigError> {
    if !path.is_file() {
        return Err(ConfigError::FileNotFound(path.to_path_buf()));
    }
    let content = std::fs::read_to_string(path).map_err(|e| {
        ConfigError::ParseError(format!("failed to read {}: {e}", path.display()))
    })?;
    let config = parse_config(&content)?;
    info!(path = %path.display(), "config loaded");
    Ok(config)
}

/// Load config from the platform default path, writing a commented default
/// file first if none exists.
pub fn load_default() -> Result<TabdeckConfig, ConfigError> {
    let path = default_config_path()?;

    if !path.exists() {
        info!("no config found at {}, creating default", path.display());
        create_default_config(&path)?;
        return Ok(TabdeckConfig::default());
    }

    load_from_path(&path)
}

/// `<config dir>/tabdeck/config.toml`
pub fn default_config_path() -> Result<PathBuf, ConfigError> {
    let config_dir = dirs::config_dir()
        .ok_or_else(|| ConfigError::ParseError("could not determine config directory".into()))?;
    Ok(config_dir.join("tabdeck").join("config.toml"))
}

pub fn create_default_config(path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            ConfigError::ParseError(format!(
                "failed to create config directory {}: {e}",
                parent.display()
            ))
        })?;
    }

    std::fs::write(path, DEFAULT_CONFIG_TOML).map_err(|e| {
        ConfigError::ParseError(format!(
            "failed to write default config to {}: {e}",
            path.display()
        ))
    })?;

    info!("created default config at {}", path.display());
    Ok(())
}

const DEFAULT_CONFIG_TOML: &str = r##"# Tabdeck Configuration
# Schema version 1
# Only override what you want to change -- missing fields use defaults.

[tabs]
# header_height = 40      # 0-200, band reserved for the tab strip
# fallback_width = 1024   # used when the host reports an empty window
# fallback_height = 768

[container]
# use_error_view = true
# use_html_title_and_icon = true
# disable_close = false
# transparent = true
# devtools = false
# user_agent = "Tabdeck/0.1"

[window]
# use_tabs = true
# width = 800
# height = 600
# title = "Tabdeck"
# show = true

[bridge]
# event_key = "YDS_NATIVE_BRIDGE_EVENT_KEY"
# error_page_url = "tabdeck://localhost/error/index.html"
# tabs_page_url = "tabdeck://localhost/tabs/index.html"

[logging]
# level = "tabdeck=info"
"##;
