//! Configuration schema types.
//!
//! All structs use `serde(default)` so partial configs work correctly.

mod bridge;
mod container;
mod logging;
mod tabs;
mod window;

pub use bridge::*;
pub use container::*;
pub use logging::*;
pub use tabs::*;
pub use window::*;

use serde::{Deserialize, Serialize};

/// Current config schema version.
pub const CONFIG_SCHEMA_VERSION: u32 = 1;

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TabdeckConfig {
    pub tabs: TabsConfig,
    pub container: ContainerConfig,
    pub window: WindowConfig,
    pub bridge: BridgeConfig,
    pub logging: LoggingConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_gives_defaults() {
        let config: TabdeckConfig = toml::from_str("").unwrap();
        assert_eq!(config.tabs.header_height, 40);
        assert!(config.window.use_tabs);
        assert!(config.container.use_error_view.is_none());
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let config: TabdeckConfig = toml::from_str(
            r#"
[window]
title = "Docs"
"#,
        )
        .unwrap();
        assert_eq!(config.window.title, "Docs");
        assert_eq!(config.window.width, 800);
        assert_eq!(config.tabs.fallback_width, 1024);
    }
}
