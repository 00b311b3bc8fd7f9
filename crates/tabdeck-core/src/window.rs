//! Native windows and the tab orchestrator each one owns.

use std::collections::BTreeMap;
use std::sync::mpsc::Sender;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tabdeck_common::{
    ContainerId, DesktopEvent, EventBus, HostError, SubscriptionId, Surface, WindowId,
};
use tabdeck_config::schema::WindowConfig;
use tabdeck_config::TabdeckConfig;
use tabdeck_host::{HostRuntime, WindowSpec};
use tracing::{debug, info, warn};

use crate::orchestrator::{TabContext, TabLayout, TabOrchestrator};

/// Per-window overrides; unset fields come from `[window]` config.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct WindowOptions {
    pub title: Option<String>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub show: Option<bool>,
    pub use_tabs: Option<bool>,
    /// Renderer UI to load instead of the configured tab strip page.
    pub ui_url: Option<String>,
}

impl WindowOptions {
    fn spec(&self, defaults: &WindowConfig) -> WindowSpec {
        WindowSpec {
            title: self.title.clone().unwrap_or_else(|| defaults.title.clone()),
            width: self.width.unwrap_or(defaults.width),
            height: self.height.unwrap_or(defaults.height),
            show: self.show.unwrap_or(defaults.show),
        }
    }
}

pub struct Window {
    id: WindowId,
    use_tabs: bool,
    title: String,
    tabs: TabOrchestrator,
    /// Mirrors bus traffic into this window's renderer UI.
    ui_subscription: SubscriptionId,
}

impl Window {
    pub fn id(&self) -> WindowId {
        self.id
    }

    pub fn use_tabs(&self) -> bool {
        self.use_tabs
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn tabs(&self) -> &TabOrchestrator {
        &self.tabs
    }

    pub fn tabs_mut(&mut self) -> &mut TabOrchestrator {
        &mut self.tabs
    }

    pub fn ui_subscription(&self) -> SubscriptionId {
        self.ui_subscription
    }
}

pub struct WindowRegistry {
    windows: BTreeMap<WindowId, Window>,
    bus: Arc<EventBus>,
    ui_outbox: Sender<(WindowId, DesktopEvent)>,
    defaults: WindowConfig,
    layout: TabLayout,
    tabs_page_url: String,
}

impl WindowRegistry {
    /// Events targeted at a window are sent to `ui_outbox` for delivery into
    /// its renderer UI.
    pub fn new(
        bus: Arc<EventBus>,
        ui_outbox: Sender<(WindowId, DesktopEvent)>,
        config: &TabdeckConfig,
    ) -> Self {
        Self {
            windows: BTreeMap::new(),
            bus,
            ui_outbox,
            defaults: config.window.clone(),
            layout: TabLayout::from_config(&config.tabs),
            tabs_page_url: config.bridge.tabs_page_url.clone(),
        }
    }

    /// Create a host window with a fresh orchestrator and UI mirror. An
    /// existing entry under the same id is replaced.
    pub fn create_window(
        &mut self,
        options: WindowOptions,
        host: &mut dyn HostRuntime,
    ) -> Result<&mut Window, HostError> {
        let spec = options.spec(&self.defaults);
        let id = host.create_window(&spec)?;
        let ui_url = options
            .ui_url
            .clone()
            .unwrap_or_else(|| self.tabs_page_url.clone());
        host.load_window_ui(id, &ui_url);

        let tx = self.ui_outbox.clone();
        let ui_subscription = self.bus.subscribe(move |event| {
            if event.targets_window(id) {
                let _ = tx.send((id, event.clone()));
            }
        });

        if let Some(stale) = self.windows.remove(&id) {
            warn!(window_id = %id, "replacing stale window entry");
            self.bus.unsubscribe(stale.ui_subscription);
        }

        let window = Window {
            id,
            use_tabs: options.use_tabs.unwrap_or(self.defaults.use_tabs),
            title: spec.title,
            tabs: TabOrchestrator::new(id, self.layout),
            ui_subscription,
        };
        info!(window_id = %id, use_tabs = window.use_tabs, ui_url = %ui_url, "window created");
        Ok(self.windows.entry(id).or_insert(window))
    }

    pub fn get_window(&self, id: WindowId) -> Option<&Window> {
        self.windows.get(&id)
    }

    pub fn get_window_mut(&mut self, id: WindowId) -> Option<&mut Window> {
        self.windows.get_mut(&id)
    }

    pub fn contains(&self, id: WindowId) -> bool {
        self.windows.contains_key(&id)
    }

    /// Window of whatever surface sent a request, if it maps to one.
    pub fn window_from_sender(
        &self,
        sender: Option<Surface>,
        host: &dyn HostRuntime,
    ) -> Option<WindowId> {
        self.window_from_web_contents(sender?, host)
    }

    pub fn window_from_web_contents(
        &self,
        surface: Surface,
        host: &dyn HostRuntime,
    ) -> Option<WindowId> {
        match surface {
            Surface::Window(id) => self.contains(id).then_some(id),
            Surface::Container(id) => self.window_from_container(id, host),
        }
    }

    /// The window a container is shown in, falling back to the window whose
    /// tab set owns it while it is detached.
    pub fn window_from_container(
        &self,
        id: ContainerId,
        host: &dyn HostRuntime,
    ) -> Option<WindowId> {
        host.window_of_container(id)
            .filter(|w| self.contains(*w))
            .or_else(|| self.owner_of(id))
    }

    /// Window whose tab set holds `id`.
    pub fn owner_of(&self, id: ContainerId) -> Option<WindowId> {
        self.windows
            .values()
            .find(|w| w.tabs.owns(id))
            .map(|w| w.id)
    }

    /// Forget a window, closing its tabs first when it uses them. The host
    /// window itself is left to the caller.
    pub fn remove_window(&mut self, id: WindowId, ctx: &mut TabContext<'_>) -> Option<Window> {
        let mut window = self.windows.remove(&id)?;
        if window.use_tabs {
            let closed = window.tabs.close(ctx);
            debug!(window_id = %id, closed, "window tabs closed");
        }
        self.bus.unsubscribe(window.ui_subscription);
        info!(window_id = %id, "window removed");
        Some(window)
    }

    /// Tear down every window, host side included. Returns how many there were.
    pub fn remove_all_windows(&mut self, ctx: &mut TabContext<'_>) -> usize {
        let ids = self.ids();
        for id in &ids {
            self.remove_window(*id, ctx);
            ctx.host.close_window(*id);
        }
        ctx.containers.remove_all();
        ids.len()
    }

    pub fn ids(&self) -> Vec<WindowId> {
        self.windows.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Window> {
        self.windows.values()
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }
}
