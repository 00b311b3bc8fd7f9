//! In-memory host runtime.
//!
//! Keeps just enough state to answer the core's queries (z-order, sizes,
//! focus) and records everything the core asked for, so callers can
//! inspect it afterwards. Loads complete synchronously: `load_url` queues
//! the started/finished (or failed) callbacks for the next drain.

use std::collections::{BTreeMap, HashMap};

use tabdeck_common::{ContainerId, HostError, Rect, Size, Surface, WindowId};
use tracing::debug;

use crate::events::HostEvent;
use crate::runtime::{HostRuntime, SurfaceConfig, WindowSpec};

#[derive(Debug, Clone, Default)]
pub struct WindowRecord {
    pub title: String,
    pub size: Size,
    pub visible: bool,
    pub focused: bool,
    pub ui_url: Option<String>,
    /// Scripts run in the window's renderer UI, oldest first.
    pub ui_scripts: Vec<String>,
    /// Render surface, bottom to top.
    pub attached: Vec<ContainerId>,
}

#[derive(Debug, Clone, Default)]
pub struct SurfaceRecord {
    pub config: Option<SurfaceConfig>,
    pub url: Option<String>,
    pub load_history: Vec<String>,
    pub scripts: Vec<String>,
    pub bounds: Option<Rect>,
    pub focused: bool,
    pub reloads: u32,
    pub stopped: bool,
    pub listeners_removed: bool,
    pub terminated: bool,
    pub closed: bool,
}

impl SurfaceRecord {
    pub fn is_dead(&self) -> bool {
        self.terminated || self.closed
    }
}

/// What a URL does when loaded.
#[derive(Debug, Clone, Default)]
pub struct PageFixture {
    pub title: Option<String>,
    pub icon: Option<String>,
    pub failure: Option<(i32, String)>,
}

impl PageFixture {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Default::default()
        }
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn failing(code: i32, description: impl Into<String>) -> Self {
        Self {
            failure: Some((code, description.into())),
            ..Default::default()
        }
    }
}

pub struct HeadlessHost {
    next_id: u32,
    windows: BTreeMap<WindowId, WindowRecord>,
    surfaces: BTreeMap<ContainerId, SurfaceRecord>,
    pages: HashMap<String, PageFixture>,
    events: Vec<HostEvent>,
    auto_load: bool,
    refuse_surfaces: bool,
}

impl HeadlessHost {
    pub fn new() -> Self {
        Self {
            next_id: 1,
            windows: BTreeMap::new(),
            surfaces: BTreeMap::new(),
            pages: HashMap::new(),
            events: Vec::new(),
            auto_load: true,
            refuse_surfaces: false,
        }
    }

    // -- Fixtures --

    /// Describe what loading `url` produces.
    pub fn set_page(&mut self, url: impl Into<String>, page: PageFixture) {
        self.pages.insert(url.into(), page);
    }

    /// When off, `load_url` records the navigation but queues no callbacks.
    pub fn set_auto_load(&mut self, enabled: bool) {
        self.auto_load = enabled;
    }

    /// Make every following `create_surface` fail.
    pub fn refuse_surfaces(&mut self, refuse: bool) {
        self.refuse_surfaces = refuse;
    }

    /// Queue an arbitrary callback.
    pub fn push_event(&mut self, event: HostEvent) {
        self.events.push(event);
    }

    /// Resize a window the way a user drag would.
    pub fn resize_window(&mut self, window: WindowId, width: f64, height: f64) {
        if let Some(w) = self.windows.get_mut(&window) {
            w.size = Size::new(width, height);
            self.events.push(HostEvent::WindowResized {
                id: window,
                width,
                height,
            });
        }
    }

    /// Simulate the user clicking a window's close button.
    pub fn request_close(&mut self, window: WindowId) {
        if self.windows.contains_key(&window) {
            self.events.push(HostEvent::WindowClosed { id: window });
        }
    }

    // -- Inspection --

    pub fn window(&self, window: WindowId) -> Option<&WindowRecord> {
        self.windows.get(&window)
    }

    pub fn surface(&self, id: ContainerId) -> Option<&SurfaceRecord> {
        self.surfaces.get(&id)
    }

    pub fn topmost(&self, window: WindowId) -> Option<ContainerId> {
        self.windows.get(&window).and_then(|w| w.attached.last().copied())
    }

    pub fn focused_surface(&self) -> Option<ContainerId> {
        self.surfaces
            .iter()
            .find(|(_, s)| s.focused)
            .map(|(id, _)| *id)
    }

    pub fn pending_events(&self) -> usize {
        self.events.len()
    }

    fn allocate_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn queue_load(&mut self, id: ContainerId, url: &str) {
        if !self.auto_load {
            return;
        }
        self.events.push(HostEvent::LoadStarted {
            id,
            url: url.to_string(),
        });
        let page = self.pages.get(url).cloned().unwrap_or_default();
        match page.failure {
            Some((code, description)) => {
                self.events.push(HostEvent::LoadFailed {
                    id,
                    code,
                    description,
                });
            }
            None => {
                self.events.push(HostEvent::DomReady {
                    id,
                    title: page.title,
                    icon: page.icon,
                });
                self.events.push(HostEvent::LoadFinished {
                    id,
                    url: url.to_string(),
                });
            }
        }
    }

    fn live_surface(&mut self, id: ContainerId) -> Result<&mut SurfaceRecord, HostError> {
        match self.surfaces.get_mut(&id) {
            Some(s) if s.is_dead() => Err(HostError::Script(format!("{id} is destroyed"))),
            Some(s) => Ok(s),
            None => Err(HostError::UnknownSurface(id.to_string())),
        }
    }
}

impl Default for HeadlessHost {
    fn default() -> Self {
        Self::new()
    }
}

impl HostRuntime for HeadlessHost {
    fn create_window(&mut self, spec: &WindowSpec) -> Result<WindowId, HostError> {
        if spec.width == 0 || spec.height == 0 {
            return Err(HostError::WindowCreation(format!(
                "invalid size {}x{}",
                spec.width, spec.height
            )));
        }
        let id = WindowId(self.allocate_id());
        self.windows.insert(
            id,
            WindowRecord {
                title: spec.title.clone(),
                size: Size::new(f64::from(spec.width), f64::from(spec.height)),
                visible: spec.show,
                ..Default::default()
            },
        );
        debug!(window_id = %id, "headless window created");
        Ok(id)
    }

    fn window_exists(&self, window: WindowId) -> bool {
        self.windows.contains_key(&window)
    }

    fn window_size(&self, window: WindowId) -> Option<Size> {
        self.windows.get(&window).map(|w| w.size)
    }

    fn show_window(&mut self, window: WindowId) {
        if let Some(w) = self.windows.get_mut(&window) {
            w.visible = true;
        }
    }

    fn focus_window(&mut self, window: WindowId) {
        if !self.windows.contains_key(&window) {
            return;
        }
        for (id, w) in self.windows.iter_mut() {
            w.focused = *id == window;
        }
    }

    fn load_window_ui(&mut self, window: WindowId, url: &str) {
        if let Some(w) = self.windows.get_mut(&window) {
            w.ui_url = Some(url.to_string());
        }
    }

    fn execute_in_window(&mut self, window: WindowId, script: &str) -> Result<(), HostError> {
        let w = self
            .windows
            .get_mut(&window)
            .ok_or_else(|| HostError::UnknownSurface(window.to_string()))?;
        w.ui_scripts.push(script.to_string());
        Ok(())
    }

    fn close_window(&mut self, window: WindowId) {
        if self.windows.remove(&window).is_some() {
            debug!(window_id = %window, "headless window closed");
        }
    }

    fn window_of_surface(&self, surface: Surface) -> Option<WindowId> {
        match surface {
            Surface::Window(id) => self.windows.contains_key(&id).then_some(id),
            Surface::Container(id) => self
                .windows
                .iter()
                .find(|(_, w)| w.attached.contains(&id))
                .map(|(wid, _)| *wid),
        }
    }

    fn create_surface(&mut self, config: &SurfaceConfig) -> Result<ContainerId, HostError> {
        if self.refuse_surfaces {
            return Err(HostError::SurfaceAllocation("host refused surface".into()));
        }
        let id = ContainerId(self.allocate_id());
        self.surfaces.insert(
            id,
            SurfaceRecord {
                config: Some(config.clone()),
                ..Default::default()
            },
        );
        Ok(id)
    }

    fn load_url(&mut self, id: ContainerId, url: &str) -> Result<(), HostError> {
        let surface = self.live_surface(id)?;
        surface.url = Some(url.to_string());
        surface.load_history.push(url.to_string());
        surface.stopped = false;
        self.queue_load(id, url);
        Ok(())
    }

    fn reload(&mut self, id: ContainerId) {
        let url = match self.live_surface(id) {
            Ok(surface) => {
                surface.reloads += 1;
                surface.url.clone()
            }
            Err(_) => return,
        };
        if let Some(url) = url {
            self.queue_load(id, &url);
        }
    }

    fn stop(&mut self, id: ContainerId) {
        if let Some(s) = self.surfaces.get_mut(&id) {
            s.stopped = true;
        }
    }

    fn remove_listeners(&mut self, id: ContainerId) {
        if let Some(s) = self.surfaces.get_mut(&id) {
            s.listeners_removed = true;
        }
        // A surface without listeners raises no further callbacks.
        self.events.retain(|e| e.container() != Some(id));
    }

    fn terminate(&mut self, id: ContainerId) {
        if let Some(s) = self.surfaces.get_mut(&id) {
            s.terminated = true;
            s.focused = false;
        }
    }

    fn close_surface(&mut self, id: ContainerId) {
        if let Some(s) = self.surfaces.get_mut(&id) {
            s.closed = true;
            s.focused = false;
        }
    }

    fn execute_script(&mut self, id: ContainerId, script: &str) -> Result<(), HostError> {
        self.live_surface(id)?.scripts.push(script.to_string());
        Ok(())
    }

    fn focus_surface(&mut self, id: ContainerId) {
        if !self.surfaces.contains_key(&id) {
            return;
        }
        for (sid, s) in self.surfaces.iter_mut() {
            s.focused = *sid == id;
        }
    }

    fn attach(&mut self, window: WindowId, id: ContainerId) {
        if let Some(w) = self.windows.get_mut(&window) {
            if !w.attached.contains(&id) {
                w.attached.push(id);
            }
        }
    }

    fn detach(&mut self, window: WindowId, id: ContainerId) {
        if let Some(w) = self.windows.get_mut(&window) {
            w.attached.retain(|a| *a != id);
        }
    }

    fn attached(&self, window: WindowId) -> Vec<ContainerId> {
        self.windows
            .get(&window)
            .map(|w| w.attached.clone())
            .unwrap_or_default()
    }

    fn set_top(&mut self, window: WindowId, id: ContainerId) {
        if let Some(w) = self.windows.get_mut(&window) {
            if let Some(pos) = w.attached.iter().position(|a| *a == id) {
                let top = w.attached.remove(pos);
                w.attached.push(top);
            }
        }
    }

    fn set_bounds(&mut self, id: ContainerId, bounds: Rect) {
        if let Some(s) = self.surfaces.get_mut(&id) {
            s.bounds = Some(bounds);
        }
    }

    fn drain_events(&mut self) -> Vec<HostEvent> {
        std::mem::take(&mut self.events)
    }
}
