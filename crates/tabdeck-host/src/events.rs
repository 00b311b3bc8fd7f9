//! Callbacks raised by the host, queued until the core drains them.

use serde::{Deserialize, Serialize};
use tabdeck_common::{ContainerId, WindowId};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostEvent {
    /// A navigation began in a container.
    LoadStarted { id: ContainerId, url: String },
    /// The page (and its resources) finished loading.
    LoadFinished { id: ContainerId, url: String },
    /// The main frame failed to load.
    LoadFailed {
        id: ContainerId,
        code: i32,
        description: String,
    },
    /// DOM is ready; the host read the document title and the first
    /// `<link rel="icon">` it found.
    DomReady {
        id: ContainerId,
        title: Option<String>,
        icon: Option<String>,
    },
    /// The document title changed after load.
    TitleUpdated { id: ContainerId, title: String },
    /// The content process died.
    RenderProcessGone { id: ContainerId, reason: String },
    /// Window content area changed size.
    WindowResized {
        id: WindowId,
        width: f64,
        height: f64,
    },
    /// The user (or the OS) closed a window.
    WindowClosed { id: WindowId },
    /// A page asked to open a new window.
    OpenWindowRequested { id: ContainerId, url: String },
}

impl HostEvent {
    /// The container this event concerns, if any.
    pub fn container(&self) -> Option<ContainerId> {
        match self {
            HostEvent::LoadStarted { id, .. }
            | HostEvent::LoadFinished { id, .. }
            | HostEvent::LoadFailed { id, .. }
            | HostEvent::DomReady { id, .. }
            | HostEvent::TitleUpdated { id, .. }
            | HostEvent::RenderProcessGone { id, .. }
            | HostEvent::OpenWindowRequested { id, .. } => Some(*id),
            HostEvent::WindowResized { .. } | HostEvent::WindowClosed { .. } => None,
        }
    }
}
