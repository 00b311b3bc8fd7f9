//! Application context: one bus, one container registry, one window
//! registry, and the host they all drive.

use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;

use tabdeck_common::{ContainerId, DesktopEvent, EventBus, TabError, WindowId};
use tabdeck_config::TabdeckConfig;
use tabdeck_host::{dispatch_event_script, HostEvent, HostRuntime};
use tracing::{debug, info, warn};

use crate::container::ContainerOptions;
use crate::orchestrator::{TabContext, TabOrchestrator};
use crate::registry::ContainerRegistry;
use crate::window::{WindowOptions, WindowRegistry};

/// Upper bound on drain rounds per `pump`, so a page that keeps failing
/// into a failing error page cannot spin forever.
pub const MAX_PUMP_ROUNDS: usize = 32;

pub struct Desktop<H: HostRuntime> {
    pub(crate) config: TabdeckConfig,
    pub(crate) host: H,
    pub(crate) bus: Arc<EventBus>,
    pub(crate) containers: ContainerRegistry,
    pub(crate) windows: WindowRegistry,
    /// Events waiting to be mirrored into window renderer UIs.
    ui_outbox: Receiver<(WindowId, DesktopEvent)>,
}

impl<H: HostRuntime> Desktop<H> {
    pub fn new(config: TabdeckConfig, host: H) -> Self {
        let bus = Arc::new(EventBus::new());
        let (ui_tx, ui_outbox) = mpsc::channel();
        let containers = ContainerRegistry::new(&bus, &config.container, &config.bridge);
        let windows = WindowRegistry::new(Arc::clone(&bus), ui_tx, &config);
        Self {
            config,
            host,
            bus,
            containers,
            windows,
            ui_outbox,
        }
    }

    pub fn config(&self) -> &TabdeckConfig {
        &self.config
    }

    pub fn bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    pub fn containers(&self) -> &ContainerRegistry {
        &self.containers
    }

    pub fn windows(&self) -> &WindowRegistry {
        &self.windows
    }

    pub fn create_window(&mut self, options: WindowOptions) -> Result<WindowId, TabError> {
        let id = self
            .windows
            .create_window(options, &mut self.host)?
            .id();
        Ok(id)
    }

    /// Remove a window and close it on the host. Returns false for an
    /// unknown window.
    pub fn close_window(&mut self, id: WindowId) -> bool {
        let mut ctx = TabContext {
            containers: &mut self.containers,
            bus: &self.bus,
            host: &mut self.host,
        };
        let removed = self.windows.remove_window(id, &mut ctx).is_some();
        if removed {
            self.host.close_window(id);
        }
        self.deliver();
        removed
    }

    /// Tear down every window and container.
    pub fn shutdown(&mut self) -> usize {
        let mut ctx = TabContext {
            containers: &mut self.containers,
            bus: &self.bus,
            host: &mut self.host,
        };
        let count = self.windows.remove_all_windows(&mut ctx);
        self.deliver();
        info!(windows = count, "desktop shut down");
        count
    }

    /// Run `f` against a window's orchestrator, then mirror whatever it
    /// published. Host callbacks still need `pump`.
    pub fn with_tabs<R>(
        &mut self,
        window: WindowId,
        f: impl FnOnce(&mut TabOrchestrator, &mut TabContext<'_>) -> R,
    ) -> Result<R, TabError> {
        let target = self
            .windows
            .get_window_mut(window)
            .ok_or(TabError::WindowNotFound(window))?;
        let mut ctx = TabContext {
            containers: &mut self.containers,
            bus: &self.bus,
            host: &mut self.host,
        };
        let result = f(target.tabs_mut(), &mut ctx);
        self.deliver();
        Ok(result)
    }

    /// Re-parent a tab into another window.
    pub fn move_tab(&mut self, id: ContainerId, target: WindowId) -> Result<ContainerId, TabError> {
        if !self.windows.contains(target) {
            return Err(TabError::WindowNotFound(target));
        }
        let source = self
            .windows
            .owner_of(id)
            .ok_or(TabError::ContainerNotFound(id))?;
        if source == target {
            return self.with_tabs(target, |tabs, ctx| tabs.switch_tab_with_id(ctx, id, true))?;
        }

        let url = self
            .with_tabs(source, |tabs, ctx| tabs.release(ctx, id))?
            .ok_or(TabError::ContainerNotFound(id))?;
        let moved = self.with_tabs(target, |tabs, ctx| tabs.adopt(ctx, &url, id))??;
        info!(container_id = %id, from = %source, to = %target, "tab moved");
        Ok(moved)
    }

    /// React to one host callback. Failures are logged, never returned.
    pub fn handle_host_event(&mut self, event: HostEvent) {
        match event {
            HostEvent::WindowResized { id, width, height } => {
                debug!(window_id = %id, width, height, "window resized");
                if let Some(window) = self.windows.get_window(id) {
                    window.tabs().on_resize(&mut self.host);
                }
            }
            HostEvent::WindowClosed { id } => {
                if !self.close_window(id) {
                    debug!(window_id = %id, "close for unknown window");
                }
            }
            HostEvent::OpenWindowRequested { id, url } => {
                let Some(window) = self.windows.window_from_container(id, &self.host)
                else {
                    warn!(container_id = %id, url = %url, "window open from detached container dropped");
                    return;
                };
                let opened = self.with_tabs(window, |tabs, ctx| {
                    tabs.create_tab(ctx, &url, None, ContainerOptions::default())
                        .try_take()
                });
                match opened {
                    Ok(Some(Err(e))) => warn!(window_id = %window, url = %url, error = %e, "window open failed"),
                    Ok(None) => debug!(window_id = %window, url = %url, "window open queued"),
                    _ => {}
                }
            }
            other => {
                self.containers
                    .handle_host_event(&other, &mut self.host, &self.bus);
            }
        }
    }

    /// Deliver queued bus events to containers and renderer UIs, then handle
    /// host callbacks, until both sides are quiet. Returns how many host
    /// callbacks were handled.
    pub fn pump(&mut self) -> usize {
        let mut handled = 0;
        for _ in 0..MAX_PUMP_ROUNDS {
            self.deliver();
            let events = self.host.drain_events();
            if events.is_empty() {
                return handled;
            }
            handled += events.len();
            for event in events {
                self.handle_host_event(event);
            }
        }
        self.deliver();
        warn!(rounds = MAX_PUMP_ROUNDS, "host callbacks still pending after pump");
        handled
    }

    /// Mirror queued bus events. Returns the number of scripts run.
    pub fn deliver(&mut self) -> usize {
        let mut delivered = self.containers.deliver_pending(&mut self.host);
        let key = &self.config.bridge.event_key;
        for (window, event) in self.ui_outbox.try_iter() {
            let script = dispatch_event_script(key, &event.envelope());
            match self.host.execute_in_window(window, &script) {
                Ok(()) => delivered += 1,
                Err(e) => {
                    debug!(window_id = %window, event = event.name(), error = %e, "ui delivery skipped");
                }
            }
        }
        delivered
    }
}
