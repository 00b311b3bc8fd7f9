//! Commands the renderer UI can issue, as a closed set.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tabdeck_common::{ContainerId, TabError, WindowId};

pub const CREATE_TAB_ON_WINDOW: &str = "createTabOnWindow";
pub const CLOSE_TAB_ON_TAB_PAGE: &str = "closeTabOnTabPage";
pub const SWITCH_TAB_ON_WINDOW: &str = "switchTabOnWindow";
pub const CLOSE_ALL_TABS_ON_WINDOW: &str = "closeAllTabsOnWindow";
pub const FRAME_DID_READY_ON_TAB_PAGE: &str = "frameDidReadyOnTabPage";
pub const RELOAD_WEB_CONTAINER: &str = "reloadWebContainer";

/// Every command type the dispatcher accepts. Anything else is rejected
/// before its payload is looked at.
pub const KNOWN_COMMANDS: &[&str] = &[
    CREATE_TAB_ON_WINDOW,
    CLOSE_TAB_ON_TAB_PAGE,
    SWITCH_TAB_ON_WINDOW,
    CLOSE_ALL_TABS_ON_WINDOW,
    FRAME_DID_READY_ON_TAB_PAGE,
    RELOAD_WEB_CONTAINER,
];

pub fn is_known_command(kind: &str) -> bool {
    KNOWN_COMMANDS.contains(&kind)
}

/// A parsed request. `window_id: None` means "the sender's window".
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    CreateTabOnWindow {
        window_id: Option<WindowId>,
        url: String,
    },
    CloseTabOnTabPage {
        window_id: Option<WindowId>,
        id: ContainerId,
    },
    SwitchTabOnWindow {
        window_id: Option<WindowId>,
        id: ContainerId,
    },
    CloseAllTabsOnWindow {
        window_id: Option<WindowId>,
    },
    FrameDidReadyOnTabPage {
        window_id: Option<WindowId>,
    },
    /// Reload the container that sent the request.
    ReloadWebContainer,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UrlPayload {
    window_id: Option<WindowId>,
    url: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct IdPayload {
    window_id: Option<WindowId>,
    id: ContainerId,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WindowPayload {
    window_id: Option<WindowId>,
}

impl Command {
    /// Parse `{type, data}`. A missing or null `data` counts as `{}`.
    pub fn parse(kind: &str, data: &Value) -> Result<Self, TabError> {
        if !is_known_command(kind) {
            return Err(TabError::UnknownCommand(kind.to_string()));
        }
        let command = match kind {
            CREATE_TAB_ON_WINDOW => {
                let p: UrlPayload = payload(kind, data)?;
                if p.url.is_empty() {
                    return Err(TabError::InvalidPayload {
                        command: kind.to_string(),
                        reason: "url is empty".into(),
                    });
                }
                Command::CreateTabOnWindow {
                    window_id: p.window_id,
                    url: p.url,
                }
            }
            CLOSE_TAB_ON_TAB_PAGE => {
                let p: IdPayload = payload(kind, data)?;
                Command::CloseTabOnTabPage {
                    window_id: p.window_id,
                    id: p.id,
                }
            }
            SWITCH_TAB_ON_WINDOW => {
                let p: IdPayload = payload(kind, data)?;
                Command::SwitchTabOnWindow {
                    window_id: p.window_id,
                    id: p.id,
                }
            }
            CLOSE_ALL_TABS_ON_WINDOW => {
                let p: WindowPayload = payload(kind, data)?;
                Command::CloseAllTabsOnWindow {
                    window_id: p.window_id,
                }
            }
            FRAME_DID_READY_ON_TAB_PAGE => {
                let p: WindowPayload = payload(kind, data)?;
                Command::FrameDidReadyOnTabPage {
                    window_id: p.window_id,
                }
            }
            RELOAD_WEB_CONTAINER => Command::ReloadWebContainer,
            // Shouldn't happen, the allowlist is checked above
            other => return Err(TabError::UnknownCommand(other.to_string())),
        };
        Ok(command)
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Command::CreateTabOnWindow { .. } => CREATE_TAB_ON_WINDOW,
            Command::CloseTabOnTabPage { .. } => CLOSE_TAB_ON_TAB_PAGE,
            Command::SwitchTabOnWindow { .. } => SWITCH_TAB_ON_WINDOW,
            Command::CloseAllTabsOnWindow { .. } => CLOSE_ALL_TABS_ON_WINDOW,
            Command::FrameDidReadyOnTabPage { .. } => FRAME_DID_READY_ON_TAB_PAGE,
            Command::ReloadWebContainer => RELOAD_WEB_CONTAINER,
        }
    }

    /// Explicit target window, if the payload named one.
    pub fn window_id(&self) -> Option<WindowId> {
        match self {
            Command::CreateTabOnWindow { window_id, .. }
            | Command::CloseTabOnTabPage { window_id, .. }
            | Command::SwitchTabOnWindow { window_id, .. }
            | Command::CloseAllTabsOnWindow { window_id }
            | Command::FrameDidReadyOnTabPage { window_id } => *window_id,
            Command::ReloadWebContainer => None,
        }
    }
}

fn payload<T: DeserializeOwned>(kind: &str, data: &Value) -> Result<T, TabError> {
    let data = match data {
        Value::Null => Value::Object(Default::default()),
        other => other.clone(),
    };
    serde_json::from_value(data).map_err(|e| TabError::InvalidPayload {
        command: kind.to_string(),
        reason: e.to_string(),
    })
}
