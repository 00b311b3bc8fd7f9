use serde::{Deserialize, Serialize};

/// Defaults applied to every window the registry creates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
    /// Attach a tab orchestrator and tear its tabs down on close.
    pub use_tabs: bool,
    pub width: u32,
    pub height: u32,
    pub title: String,
    pub show: bool,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            use_tabs: true,
            width: 800,
            height: 600,
            title: "Tabdeck".into(),
            show: true,
        }
    }
}
