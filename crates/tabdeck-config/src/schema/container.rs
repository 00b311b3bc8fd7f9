use serde::{Deserialize, Serialize};

/// Registry-wide container defaults.
///
/// The option flags are tri-state: unset leaves the decision to the
/// built-in default, while a caller's explicit options still win.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerConfig {
    pub use_error_view: Option<bool>,
    pub use_html_title_and_icon: Option<bool>,
    pub disable_close: Option<bool>,
    /// Transparent surface background.
    pub transparent: bool,
    /// Allow dev tools on container surfaces.
    pub devtools: bool,
    pub user_agent: Option<String>,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            use_error_view: None,
            use_html_title_and_icon: None,
            disable_close: None,
            transparent: true,
            devtools: cfg!(debug_assertions),
            user_agent: Some(concat!("Tabdeck/", env!("CARGO_PKG_VERSION")).to_string()),
        }
    }
}
