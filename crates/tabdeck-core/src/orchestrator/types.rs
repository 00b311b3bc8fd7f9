use std::collections::HashMap;

use tabdeck_common::{ContainerId, EventBus, WindowId};
use tabdeck_host::HostRuntime;

use super::barrier::FrameBarrier;
use super::layout::TabLayout;
use crate::registry::ContainerRegistry;

/// Shared collaborators an orchestrator operation works against.
pub struct TabContext<'a> {
    pub containers: &'a mut ContainerRegistry,
    pub bus: &'a EventBus,
    pub host: &'a mut dyn HostRuntime,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CloseTabOptions {
    /// Publish `desktop.onCloseTab` for the renderer UI.
    pub need_notify_view: bool,
    /// Ignore the container's `disable_close` option.
    pub force: bool,
}

impl CloseTabOptions {
    /// A close the user asked for from the UI.
    pub fn user() -> Self {
        Self {
            need_notify_view: true,
            force: false,
        }
    }

    /// Teardown close: silent and unconditional.
    pub fn teardown() -> Self {
        Self {
            need_notify_view: false,
            force: true,
        }
    }
}

/// Tab set and z-order policy for one window.
///
/// `tabs` and `urls` always hold the same URLs; `urls` keeps insertion
/// order for enumeration and cleanup.
pub struct TabOrchestrator {
    pub(super) window_id: WindowId,
    pub(super) tabs: HashMap<String, ContainerId>,
    pub(super) urls: Vec<String>,
    pub(super) active: Option<ContainerId>,
    pub(super) layout: TabLayout,
    pub(super) barrier: FrameBarrier,
}

impl TabOrchestrator {
    pub fn new(window_id: WindowId, layout: TabLayout) -> Self {
        Self {
            window_id,
            tabs: HashMap::new(),
            urls: Vec::new(),
            active: None,
            layout,
            barrier: FrameBarrier::default(),
        }
    }

    pub fn window_id(&self) -> WindowId {
        self.window_id
    }

    pub fn layout(&self) -> TabLayout {
        self.layout
    }

    /// Tab URLs in the order they were opened.
    pub fn urls(&self) -> &[String] {
        &self.urls
    }

    pub fn container_for(&self, url: &str) -> Option<ContainerId> {
        self.tabs.get(url).copied()
    }

    pub fn url_of(&self, id: ContainerId) -> Option<&str> {
        self.tabs
            .iter()
            .find(|(_, cid)| **cid == id)
            .map(|(url, _)| url.as_str())
    }

    pub fn owns(&self, id: ContainerId) -> bool {
        self.tabs.values().any(|cid| *cid == id)
    }

    /// Container ids in tab order.
    pub fn container_ids(&self) -> Vec<ContainerId> {
        self.urls
            .iter()
            .filter_map(|url| self.tabs.get(url).copied())
            .collect()
    }

    pub fn active(&self) -> Option<ContainerId> {
        self.active
    }

    /// The tab currently on screen: the topmost container of this
    /// orchestrator on the window's render surface. Unlike `active`, this
    /// survives closing the active tab, after which the tab underneath shows.
    pub fn current_tab(&self, host: &dyn HostRuntime) -> Option<ContainerId> {
        host.attached(self.window_id)
            .into_iter()
            .rev()
            .find(|id| self.owns(*id))
    }

    pub fn tab_count(&self) -> usize {
        self.urls.len()
    }

    pub fn is_frame_ready(&self) -> bool {
        self.barrier.is_ready()
    }

    /// Operations waiting on the frame-ready signal.
    pub fn queued(&self) -> usize {
        self.barrier.queued()
    }

    pub(super) fn record(&mut self, url: &str, id: ContainerId) {
        if self.tabs.insert(url.to_string(), id).is_none() {
            self.urls.push(url.to_string());
        }
    }

    pub(super) fn forget(&mut self, id: ContainerId) -> Option<String> {
        let url = self.url_of(id)?.to_string();
        self.tabs.remove(&url);
        self.urls.retain(|u| *u != url);
        if self.active == Some(id) {
            self.active = None;
        }
        Some(url)
    }
}
