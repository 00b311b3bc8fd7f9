use tabdeck_common::{ContainerId, HostError, Rect, Size, Surface, WindowId};

use crate::events::HostEvent;

/// Settings for allocating a content surface.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceConfig {
    /// Whether the surface background should be transparent.
    pub transparent: bool,
    /// Whether to enable dev tools.
    pub devtools: bool,
    /// Custom user agent string.
    pub user_agent: Option<String>,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            transparent: true,
            devtools: cfg!(debug_assertions),
            user_agent: None,
        }
    }
}

/// Settings for creating a native window.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowSpec {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub show: bool,
}

impl Default for WindowSpec {
    fn default() -> Self {
        Self {
            title: String::new(),
            width: 800,
            height: 600,
            show: true,
        }
    }
}

/// Native window system and content engine, as seen by the tab core.
///
/// Calls that act on an unknown window or surface are no-ops; the host
/// reports trouble through `HostError` only where the caller must react.
/// Each window has a render surface holding attached containers in z-order,
/// bottom first; the last one is topmost.
pub trait HostRuntime {
    // -- Windows --

    fn create_window(&mut self, spec: &WindowSpec) -> Result<WindowId, HostError>;

    fn window_exists(&self, window: WindowId) -> bool;

    /// Current content size, `None` for an unknown window.
    fn window_size(&self, window: WindowId) -> Option<Size>;

    fn show_window(&mut self, window: WindowId);

    fn focus_window(&mut self, window: WindowId);

    /// Load the renderer UI (tab strip) into a window.
    fn load_window_ui(&mut self, window: WindowId, url: &str);

    /// Run a script in a window's own renderer UI.
    fn execute_in_window(&mut self, window: WindowId, script: &str) -> Result<(), HostError>;

    /// Close and destroy a window, dropping all of its listeners.
    fn close_window(&mut self, window: WindowId);

    /// Resolve the window a web surface lives in. For a container this is
    /// the window whose render surface it is attached to.
    fn window_of_surface(&self, surface: Surface) -> Option<WindowId>;

    // -- Content surfaces --

    fn create_surface(&mut self, config: &SurfaceConfig) -> Result<ContainerId, HostError>;

    fn load_url(&mut self, id: ContainerId, url: &str) -> Result<(), HostError>;

    fn reload(&mut self, id: ContainerId);

    /// Stop any in-flight navigation.
    fn stop(&mut self, id: ContainerId);

    fn remove_listeners(&mut self, id: ContainerId);

    /// Forcibly kill the content process.
    fn terminate(&mut self, id: ContainerId);

    /// Politely close the surface's contents.
    fn close_surface(&mut self, id: ContainerId);

    fn execute_script(&mut self, id: ContainerId, script: &str) -> Result<(), HostError>;

    fn focus_surface(&mut self, id: ContainerId);

    // -- Render surface --

    /// Add a container on top of the window's render surface.
    fn attach(&mut self, window: WindowId, id: ContainerId);

    fn detach(&mut self, window: WindowId, id: ContainerId);

    /// Attached containers, bottom to top.
    fn attached(&self, window: WindowId) -> Vec<ContainerId>;

    /// Raise an attached container to the top of the z-order.
    fn set_top(&mut self, window: WindowId, id: ContainerId);

    fn set_bounds(&mut self, id: ContainerId, bounds: Rect);

    // -- Callbacks --

    /// Take every callback queued since the last drain.
    fn drain_events(&mut self) -> Vec<HostEvent>;

    fn window_of_container(&self, id: ContainerId) -> Option<WindowId> {
        self.window_of_surface(Surface::Container(id))
    }

    fn is_attached(&self, window: WindowId, id: ContainerId) -> bool {
        self.attached(window).contains(&id)
    }
}
