//! Tab lifecycle operations: open, switch, close, reload, and the
//! frame-ready gate in front of them.

use tabdeck_common::{ContainerId, DesktopEvent, TabError, WindowId};
use tabdeck_host::HostRuntime;
use tracing::{debug, info, warn};

use super::barrier::{Deferred, TabHandle, TabRequest, TabResult};
use super::types::{CloseTabOptions, TabContext, TabOrchestrator};
use crate::container::ContainerOptions;

impl TabOrchestrator {
    /// Open `url` as a tab, or switch to it if it is already open.
    pub fn create_tab(
        &mut self,
        ctx: &mut TabContext<'_>,
        url: &str,
        window_id: Option<WindowId>,
        options: ContainerOptions,
    ) -> TabHandle {
        self.check_target(window_id);
        self.submit(
            ctx,
            TabRequest::Create {
                url: url.to_string(),
                options,
            },
        )
    }

    /// Bring the tab for `url` to front, opening it first if needed.
    pub fn switch_tab(
        &mut self,
        ctx: &mut TabContext<'_>,
        url: &str,
        window_id: Option<WindowId>,
        options: ContainerOptions,
    ) -> TabHandle {
        self.check_target(window_id);
        self.submit(
            ctx,
            TabRequest::Switch {
                url: url.to_string(),
                options,
            },
        )
    }

    /// Make `id` the single visible container of this window.
    ///
    /// Other tabs are detached from the render surface but stay alive.
    pub fn switch_tab_with_id(
        &mut self,
        ctx: &mut TabContext<'_>,
        id: ContainerId,
        notify: bool,
    ) -> TabResult {
        if !self.owns(id) || !ctx.containers.contains(id) {
            return Err(TabError::ContainerNotFound(id));
        }
        let window = self.window_id;
        if notify {
            ctx.bus.publish(DesktopEvent::TabSwitched {
                id,
                window_id: window,
            });
        }

        if !ctx.host.is_attached(window, id) {
            ctx.host.attach(window, id);
        }
        self.apply_bounds(ctx.host, id);
        ctx.host.set_top(window, id);
        for other in ctx.host.attached(window) {
            if other != id && self.owns(other) {
                ctx.host.detach(window, other);
            }
        }
        self.active = Some(id);

        ctx.host.show_window(window);
        ctx.host.focus_window(window);
        ctx.host.focus_surface(id);
        debug!(window_id = %window, container_id = %id, "tab activated");
        Ok(id)
    }

    /// Close a tab. Unknown ids are a no-op and return `Ok(false)`.
    pub fn close_tab(
        &mut self,
        ctx: &mut TabContext<'_>,
        id: ContainerId,
        options: CloseTabOptions,
    ) -> Result<bool, TabError> {
        let window = self.window_id;
        if !self.owns(id) && !ctx.host.is_attached(window, id) {
            debug!(window_id = %window, container_id = %id, "close ignored: not a tab here");
            return Ok(false);
        }
        if let Some(container) = ctx.containers.get(id) {
            if container.options().disable_close && !options.force {
                warn!(window_id = %window, container_id = %id, "close refused: close disabled");
                return Err(TabError::CloseDisabled(id));
            }
        }

        ctx.host.detach(window, id);
        ctx.host.close_surface(id);
        if options.need_notify_view {
            ctx.bus.publish(DesktopEvent::TabClosed {
                id,
                window_id: window,
            });
        }
        ctx.containers.remove(id, ctx.host);
        let url = self.forget(id);
        info!(
            window_id = %window,
            container_id = %id,
            url = url.as_deref().unwrap_or_default(),
            "tab closed"
        );
        Ok(true)
    }

    pub fn close_tab_by_url(
        &mut self,
        ctx: &mut TabContext<'_>,
        url: &str,
    ) -> Result<bool, TabError> {
        match self.container_for(url) {
            Some(id) => self.close_tab(ctx, id, CloseTabOptions::user()),
            None => Ok(false),
        }
    }

    pub fn close_current_tab(&mut self, ctx: &mut TabContext<'_>) -> Result<bool, TabError> {
        match self.current_tab(ctx.host) {
            Some(id) => self.close_tab(ctx, id, CloseTabOptions::user()),
            None => Ok(false),
        }
    }

    /// Close every tab, then sweep containers left on the render surface
    /// that the tab map no longer knows about. Returns how many went away.
    pub fn close_all_tabs(&mut self, ctx: &mut TabContext<'_>) -> usize {
        let window = self.window_id;
        let mut closed = 0;
        for id in self.container_ids() {
            if matches!(self.close_tab(ctx, id, CloseTabOptions::teardown()), Ok(true)) {
                closed += 1;
            }
        }
        self.tabs.clear();
        self.urls.clear();
        self.active = None;

        for stray in ctx.host.attached(window) {
            warn!(window_id = %window, container_id = %stray, "removing untracked container");
            ctx.host.detach(window, stray);
            ctx.containers.remove(stray, ctx.host);
            closed += 1;
        }
        info!(window_id = %window, closed, "all tabs closed");
        closed
    }

    /// Reload the topmost tab. Returns false when there is none.
    pub fn reload_current_tab(&mut self, ctx: &mut TabContext<'_>) -> bool {
        let Some(id) = self.current_tab(ctx.host) else {
            return false;
        };
        ctx.containers.reload(id, ctx.host).is_ok()
    }

    /// Signal that the renderer UI can show tabs. Runs every held-back
    /// operation in arrival order and returns how many there were. Only
    /// the first call has any effect.
    pub fn set_frame_ready(&mut self, ctx: &mut TabContext<'_>) -> usize {
        let Some(released) = self.barrier.open() else {
            debug!(window_id = %self.window_id, "frame ready already signalled");
            return 0;
        };
        let count = released.len();
        info!(window_id = %self.window_id, released = count, "frame ready");
        for Deferred { request, reply } in released {
            let result = self.run(ctx, request);
            if let Err(e) = &result {
                warn!(window_id = %self.window_id, error = %e, "deferred tab operation failed");
            }
            if reply.send(result).is_err() {
                debug!(window_id = %self.window_id, "deferred tab result dropped");
            }
        }
        count
    }

    /// Re-apply layout to the topmost tab after the window changed size.
    pub fn on_resize(&self, host: &mut dyn HostRuntime) {
        if let Some(id) = self.current_tab(host) {
            self.apply_bounds(host, id);
        }
    }

    /// Give up ownership of `id` without destroying it. Returns its URL.
    pub fn release(&mut self, ctx: &mut TabContext<'_>, id: ContainerId) -> Option<String> {
        let url = self.forget(id)?;
        ctx.host.detach(self.window_id, id);
        ctx.bus.publish(DesktopEvent::TabClosed {
            id,
            window_id: self.window_id,
        });
        debug!(window_id = %self.window_id, container_id = %id, "tab released");
        Some(url)
    }

    /// Take ownership of a released container and bring it to front. If
    /// `url` is already open here, the incoming container is closed and the
    /// existing tab wins.
    pub fn adopt(&mut self, ctx: &mut TabContext<'_>, url: &str, id: ContainerId) -> TabResult {
        if let Some(existing) = self.container_for(url) {
            if existing != id {
                debug!(window_id = %self.window_id, container_id = %id, url, "adopted duplicate closed");
                ctx.host.close_surface(id);
                ctx.containers.remove(id, ctx.host);
            }
            return self.switch_tab_with_id(ctx, existing, true);
        }
        if !ctx.containers.contains(id) {
            return Err(TabError::ContainerNotFound(id));
        }
        self.record(url, id);
        ctx.bus.publish(DesktopEvent::TabCreated {
            id,
            window_id: self.window_id,
        });
        self.switch_tab_with_id(ctx, id, true)
    }

    /// Tear down for window removal: abandon waiters and close everything.
    pub fn close(&mut self, ctx: &mut TabContext<'_>) -> usize {
        let abandoned = self.barrier.abandon();
        if abandoned > 0 {
            debug!(window_id = %self.window_id, abandoned, "pending tab operations abandoned");
        }
        self.close_all_tabs(ctx)
    }

    fn submit(&mut self, ctx: &mut TabContext<'_>, request: TabRequest) -> TabHandle {
        if !self.barrier.is_ready() {
            debug!(window_id = %self.window_id, url = request.url(), "waiting for frame ready");
            return self.barrier.defer(request);
        }
        TabHandle::done(self.run(ctx, request))
    }

    fn run(&mut self, ctx: &mut TabContext<'_>, request: TabRequest) -> TabResult {
        match request {
            TabRequest::Create { url, options } => self.open_tab(ctx, &url, options),
            TabRequest::Switch { url, options } => {
                let id = match self.container_for(&url) {
                    Some(id) => id,
                    None => self.open_tab(ctx, &url, options)?,
                };
                self.switch_tab_with_id(ctx, id, true)
            }
        }
    }

    fn open_tab(
        &mut self,
        ctx: &mut TabContext<'_>,
        url: &str,
        options: ContainerOptions,
    ) -> TabResult {
        if let Some(id) = self.container_for(url) {
            debug!(window_id = %self.window_id, container_id = %id, url, "already open");
            return self.switch_tab_with_id(ctx, id, true);
        }

        let options = ContainerOptions::tab_defaults().overlay(options);
        let id = ctx.containers.create(url, options, ctx.host)?;
        let window = self.window_id;
        ctx.host.attach(window, id);
        self.apply_bounds(ctx.host, id);
        ctx.host.set_top(window, id);
        self.record(url, id);
        self.active = Some(id);

        ctx.bus.publish(DesktopEvent::TabCreated {
            id,
            window_id: window,
        });
        info!(window_id = %window, container_id = %id, url, "tab opened");
        Ok(id)
    }

    fn apply_bounds(&self, host: &mut dyn HostRuntime, id: ContainerId) {
        let bounds = self.layout.content_bounds(host.window_size(self.window_id));
        host.set_bounds(id, bounds);
    }

    // Tabs always open in this orchestrator's own window.
    fn check_target(&self, window_id: Option<WindowId>) {
        if let Some(w) = window_id.filter(|w| *w != self.window_id) {
            warn!(window_id = %self.window_id, requested = %w, "ignoring foreign window id");
        }
    }
}
