use serde::{Deserialize, Serialize};

/// Tab strip geometry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TabsConfig {
    /// Height of the header band reserved for the tab strip (valid range: 0-200).
    pub header_height: u32,
    /// Width used when the host reports an empty window size.
    pub fallback_width: u32,
    /// Height used when the host reports an empty window size.
    pub fallback_height: u32,
}

impl Default for TabsConfig {
    fn default() -> Self {
        Self {
            header_height: 40,
            fallback_width: 1024,
            fallback_height: 768,
        }
    }
}
