use serde::{Deserialize, Serialize};

/// Settings for the event bridge into web surfaces.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// DOM event name that carries every envelope into a page.
    pub event_key: String,
    /// Page shown in place of content that failed to load.
    pub error_page_url: String,
    /// The renderer UI (tab strip) loaded into each window.
    pub tabs_page_url: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            event_key: "YDS_NATIVE_BRIDGE_EVENT_KEY".into(),
            error_page_url: "tabdeck://localhost/error/index.html".into(),
            tabs_page_url: "tabdeck://localhost/tabs/index.html".into(),
        }
    }
}
