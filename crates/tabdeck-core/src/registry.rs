//! Owner of every content container across all windows.

use std::collections::BTreeMap;
use std::sync::mpsc::{self, Receiver};

use tabdeck_common::{ContainerId, DesktopEvent, EventBus, SubscriptionId, TabError};
use tabdeck_config::schema::{BridgeConfig, ContainerConfig};
use tabdeck_host::{dispatch_event_script, HostEvent, HostRuntime, SurfaceConfig};
use tracing::{debug, error, info, warn};

use crate::container::{Container, ContainerOptions, ContainerState};

pub struct ContainerRegistry {
    containers: BTreeMap<ContainerId, Container>,
    /// Registry-level defaults, below caller options.
    defaults: ContainerOptions,
    surface: SurfaceConfig,
    event_key: String,
    error_page_url: String,
    /// Bus events waiting to be mirrored into containers.
    inbox: Receiver<DesktopEvent>,
    subscription: SubscriptionId,
}

impl ContainerRegistry {
    /// Create a registry and subscribe it to `bus`, so every published
    /// event is queued for delivery into matching containers.
    pub fn new(bus: &EventBus, container: &ContainerConfig, bridge: &BridgeConfig) -> Self {
        let (tx, inbox) = mpsc::channel();
        let subscription = bus.subscribe(move |event| {
            let _ = tx.send(event.clone());
        });
        Self {
            containers: BTreeMap::new(),
            defaults: ContainerOptions {
                use_error_view: container.use_error_view,
                use_html_title_and_icon: container.use_html_title_and_icon,
                disable_close: container.disable_close,
            },
            surface: SurfaceConfig {
                transparent: container.transparent,
                devtools: container.devtools,
                user_agent: container.user_agent.clone(),
            },
            event_key: bridge.event_key.clone(),
            error_page_url: bridge.error_page_url.clone(),
            inbox,
            subscription,
        }
    }

    pub fn subscription(&self) -> SubscriptionId {
        self.subscription
    }

    /// Allocate a surface, register it under its host id, and start loading.
    pub fn create(
        &mut self,
        url: &str,
        options: ContainerOptions,
        host: &mut dyn HostRuntime,
    ) -> Result<ContainerId, TabError> {
        let resolved = self.defaults.overlay(options).resolve();
        let id = host.create_surface(&self.surface)?;
        let mut container = Container::new(id, url, resolved);
        if let Err(e) = container.load_url(url, host) {
            host.terminate(id);
            return Err(e.into());
        }
        self.containers.insert(id, container);
        info!(container_id = %id, url, "container created");
        Ok(id)
    }

    pub fn get(&self, id: ContainerId) -> Option<&Container> {
        self.containers.get(&id)
    }

    pub fn get_mut(&mut self, id: ContainerId) -> Option<&mut Container> {
        self.containers.get_mut(&id)
    }

    pub fn contains(&self, id: ContainerId) -> bool {
        self.containers.contains_key(&id)
    }

    pub fn ids(&self) -> Vec<ContainerId> {
        self.containers.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.containers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.containers.is_empty()
    }

    /// Stop, unhook, and kill a container, then forget it. Returns the
    /// container in its `Destroyed` state, or `None` for an unknown id.
    pub fn remove(&mut self, id: ContainerId, host: &mut dyn HostRuntime) -> Option<Container> {
        let mut container = self.containers.remove(&id)?;
        host.stop(id);
        host.remove_listeners(id);
        host.terminate(id);
        container.set_state(ContainerState::Destroyed);
        debug!(container_id = %id, "container removed");
        Some(container)
    }

    /// Forget every container without tearing them down. Only for use when
    /// the owning windows are being destroyed with their surfaces.
    pub fn remove_all(&mut self) {
        let count = self.containers.len();
        self.containers.clear();
        debug!(count, "container registry cleared");
    }

    /// Reload a container's own URL.
    pub fn reload(&mut self, id: ContainerId, host: &mut dyn HostRuntime) -> Result<(), TabError> {
        let container = self
            .containers
            .get_mut(&id)
            .ok_or(TabError::ContainerNotFound(id))?;
        container.reload(host);
        debug!(container_id = %id, "container reloaded");
        Ok(())
    }

    /// Run the dispatch script for `event` in every matching live container.
    /// Returns how many containers received it.
    pub fn broadcast(&self, event: &DesktopEvent, host: &mut dyn HostRuntime) -> usize {
        let script = dispatch_event_script(&self.event_key, &event.envelope());
        let mut delivered = 0;
        for (id, container) in &self.containers {
            if !container.is_live() {
                continue;
            }
            let attached_to = host.window_of_container(*id);
            if !event.targets_container(*id, attached_to) {
                continue;
            }
            match host.execute_script(*id, &script) {
                Ok(()) => delivered += 1,
                Err(e) => {
                    warn!(container_id = %id, event = event.name(), error = %e, "event delivery failed");
                }
            }
        }
        delivered
    }

    /// Mirror every bus event queued since the last call.
    pub fn deliver_pending(&mut self, host: &mut dyn HostRuntime) -> usize {
        let pending: Vec<DesktopEvent> = self.inbox.try_iter().collect();
        pending
            .iter()
            .map(|event| self.broadcast(event, host))
            .sum()
    }

    /// Apply a host load/title callback. Callbacks for containers that are
    /// gone are dropped. Returns whether the event was consumed.
    pub fn handle_host_event(
        &mut self,
        event: &HostEvent,
        host: &mut dyn HostRuntime,
        bus: &EventBus,
    ) -> bool {
        let Some(id) = event.container() else {
            return false;
        };
        let Some(container) = self.containers.get_mut(&id) else {
            debug!(container_id = %id, ?event, "dropping callback for removed container");
            return true;
        };

        match event {
            HostEvent::LoadStarted { url, .. } => {
                // Navigations into the error page keep the errored state.
                if container.state() != ContainerState::Errored {
                    container.set_state(ContainerState::Loading);
                }
                debug!(container_id = %id, url = %url, "load started");
            }
            HostEvent::LoadFinished { url, .. } => {
                if container.state() == ContainerState::Loading {
                    container.set_state(ContainerState::Ready);
                }
                debug!(container_id = %id, url = %url, state = ?container.state(), "load finished");
            }
            HostEvent::LoadFailed {
                code, description, ..
            } => {
                let failure = TabError::LoadFailure {
                    id,
                    code: *code,
                    description: description.clone(),
                };
                error!(container_id = %id, url = container.url(), "{failure}");
                container.set_state(ContainerState::Errored);
                if container.options().use_error_view {
                    if let Err(e) = host.load_url(id, &self.error_page_url) {
                        warn!(container_id = %id, error = %e, "could not show error page");
                    }
                }
            }
            HostEvent::DomReady { title, icon, .. } => {
                if !container.captures_page_info() {
                    return true;
                }
                if let Some(title) = title.as_deref().filter(|t| !t.is_empty()) {
                    if container.title().is_empty() {
                        container.set_title(title, bus);
                    }
                }
                if let Some(icon) = icon {
                    container.set_icon(icon.as_str(), bus);
                }
            }
            HostEvent::TitleUpdated { title, .. } => {
                if container.captures_page_info() && !title.is_empty() {
                    container.set_title(title.as_str(), bus);
                }
            }
            HostEvent::RenderProcessGone { reason, .. } => {
                error!(container_id = %id, reason = %reason, "content process gone");
            }
            HostEvent::OpenWindowRequested { .. }
            | HostEvent::WindowResized { .. }
            | HostEvent::WindowClosed { .. } => return false,
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tabdeck_common::WindowId;
    use tabdeck_host::headless::PageFixture;
    use tabdeck_host::{HeadlessHost, WindowSpec};

    fn registry(bus: &EventBus) -> ContainerRegistry {
        ContainerRegistry::new(bus, &ContainerConfig::default(), &BridgeConfig::default())
    }

    fn pump(reg: &mut ContainerRegistry, host: &mut HeadlessHost, bus: &EventBus) {
        for event in host.drain_events() {
            reg.handle_host_event(&event, host, bus);
        }
    }

    #[test]
    fn create_registers_and_loads() {
        let bus = EventBus::new();
        let mut host = HeadlessHost::new();
        let mut reg = registry(&bus);

        let id = reg
            .create("https://a", ContainerOptions::default(), &mut host)
            .unwrap();
        let c = reg.get(id).unwrap();
        assert_eq!(c.url(), "https://a");
        assert_eq!(c.state(), ContainerState::Loading);
        assert_eq!(host.surface(id).unwrap().url.as_deref(), Some("https://a"));

        pump(&mut reg, &mut host, &bus);
        assert_eq!(reg.get(id).unwrap().state(), ContainerState::Ready);
    }

    #[test]
    fn registry_defaults_sit_between_caller_and_built_in() {
        let bus = EventBus::new();
        let mut host = HeadlessHost::new();
        let config = ContainerConfig {
            use_error_view: Some(true),
            disable_close: Some(true),
            ..Default::default()
        };
        let mut reg = ContainerRegistry::new(&bus, &config, &BridgeConfig::default());

        let caller = ContainerOptions {
            disable_close: Some(false),
            ..Default::default()
        };
        let id = reg.create("https://a", caller, &mut host).unwrap();
        let opts = reg.get(id).unwrap().options();
        assert!(opts.use_error_view);
        assert!(!opts.disable_close);
        assert!(!opts.use_html_title_and_icon);
    }

    #[test]
    fn surface_allocation_failure_propagates() {
        let bus = EventBus::new();
        let mut host = HeadlessHost::new();
        host.refuse_surfaces(true);
        let mut reg = registry(&bus);
        let err = reg
            .create("https://a", ContainerOptions::default(), &mut host)
            .unwrap_err();
        assert!(matches!(err, TabError::Host(_)));
        assert!(reg.is_empty());
    }

    #[test]
    fn remove_tears_down_and_is_idempotent() {
        let bus = EventBus::new();
        let mut host = HeadlessHost::new();
        let mut reg = registry(&bus);
        let id = reg
            .create("https://a", ContainerOptions::default(), &mut host)
            .unwrap();

        let removed = reg.remove(id, &mut host).unwrap();
        assert_eq!(removed.state(), ContainerState::Destroyed);
        let surface = host.surface(id).unwrap();
        assert!(surface.stopped && surface.listeners_removed && surface.terminated);
        assert!(reg.get(id).is_none());

        assert!(reg.remove(id, &mut host).is_none());
        assert!(reg.remove(ContainerId(404), &mut host).is_none());
    }

    #[test]
    fn remove_all_skips_teardown() {
        let bus = EventBus::new();
        let mut host = HeadlessHost::new();
        let mut reg = registry(&bus);
        let id = reg
            .create("https://a", ContainerOptions::default(), &mut host)
            .unwrap();
        reg.remove_all();
        assert!(reg.is_empty());
        assert!(!host.surface(id).unwrap().terminated);
    }

    #[test]
    fn late_callback_for_removed_container_is_dropped() {
        let bus = EventBus::new();
        let mut host = HeadlessHost::new();
        let mut reg = registry(&bus);
        let id = reg
            .create("https://a", ContainerOptions::default(), &mut host)
            .unwrap();
        reg.remove(id, &mut host);

        let consumed = reg.handle_host_event(
            &HostEvent::LoadFinished {
                id,
                url: "https://a".into(),
            },
            &mut host,
            &bus,
        );
        assert!(consumed);
        assert!(reg.get(id).is_none());
    }

    #[test]
    fn load_failure_redirects_to_error_view_and_blocks_capture() {
        let bus = EventBus::new();
        let mut host = HeadlessHost::new();
        host.set_page("https://down", PageFixture::failing(-105, "ERR_NAME_NOT_RESOLVED"));
        let mut reg = registry(&bus);
        let opts = ContainerOptions {
            use_error_view: Some(true),
            use_html_title_and_icon: Some(true),
            ..Default::default()
        };
        let id = reg.create("https://down", opts, &mut host).unwrap();
        pump(&mut reg, &mut host, &bus);

        let c = reg.get(id).unwrap();
        assert_eq!(c.state(), ContainerState::Errored);
        assert_eq!(c.url(), "https://down");
        let history = &host.surface(id).unwrap().load_history;
        assert_eq!(
            history.last().map(String::as_str),
            Some(BridgeConfig::default().error_page_url.as_str())
        );

        // Error page finishing does not clear the errored state, and page
        // titles are not captured from it.
        pump(&mut reg, &mut host, &bus);
        reg.handle_host_event(
            &HostEvent::TitleUpdated {
                id,
                title: "Error".into(),
            },
            &mut host,
            &bus,
        );
        let c = reg.get(id).unwrap();
        assert_eq!(c.state(), ContainerState::Errored);
        assert_eq!(c.title(), "");
    }

    #[test]
    fn load_failure_without_error_view_stays_put() {
        let bus = EventBus::new();
        let mut host = HeadlessHost::new();
        host.set_page("https://down", PageFixture::failing(-2, "FAILED"));
        let mut reg = registry(&bus);
        let id = reg
            .create("https://down", ContainerOptions::default(), &mut host)
            .unwrap();
        pump(&mut reg, &mut host, &bus);
        assert_eq!(reg.get(id).unwrap().state(), ContainerState::Errored);
        assert_eq!(host.surface(id).unwrap().load_history.len(), 1);
    }

    #[test]
    fn reload_recovers_from_error() {
        let bus = EventBus::new();
        let mut host = HeadlessHost::new();
        host.set_page("https://flaky", PageFixture::failing(-7, "TIMED_OUT"));
        let mut reg = registry(&bus);
        let id = reg
            .create("https://flaky", ContainerOptions::tab_defaults(), &mut host)
            .unwrap();
        pump(&mut reg, &mut host, &bus);
        pump(&mut reg, &mut host, &bus);
        assert_eq!(reg.get(id).unwrap().state(), ContainerState::Errored);

        host.set_page("https://flaky", PageFixture::titled("Flaky"));
        reg.reload(id, &mut host).unwrap();
        pump(&mut reg, &mut host, &bus);
        let c = reg.get(id).unwrap();
        assert_eq!(c.state(), ContainerState::Ready);
        assert_eq!(c.title(), "Flaky");
    }

    #[test]
    fn reload_unknown_container_fails() {
        let bus = EventBus::new();
        let mut host = HeadlessHost::new();
        let mut reg = registry(&bus);
        assert!(matches!(
            reg.reload(ContainerId(9), &mut host),
            Err(TabError::ContainerNotFound(_))
        ));
    }

    #[test]
    fn dom_ready_keeps_existing_title_but_updates_follow() {
        let bus = EventBus::new();
        let mut host = HeadlessHost::new();
        host.set_page(
            "https://a",
            PageFixture::titled("First").with_icon("https://a/favicon.ico"),
        );
        let mut reg = registry(&bus);
        let id = reg
            .create("https://a", ContainerOptions::tab_defaults(), &mut host)
            .unwrap();
        pump(&mut reg, &mut host, &bus);
        assert_eq!(reg.get(id).unwrap().title(), "First");
        assert_eq!(reg.get(id).unwrap().icon(), "https://a/favicon.ico");

        reg.handle_host_event(
            &HostEvent::DomReady {
                id,
                title: Some("Second".into()),
                icon: None,
            },
            &mut host,
            &bus,
        );
        assert_eq!(reg.get(id).unwrap().title(), "First");

        reg.handle_host_event(
            &HostEvent::TitleUpdated {
                id,
                title: "Third".into(),
            },
            &mut host,
            &bus,
        );
        assert_eq!(reg.get(id).unwrap().title(), "Third");
    }

    #[test]
    fn broadcast_respects_container_and_window_filters() {
        let bus = EventBus::new();
        let mut host = HeadlessHost::new();
        let w1 = host.create_window(&WindowSpec::default()).unwrap();
        let w2 = host.create_window(&WindowSpec::default()).unwrap();
        let mut reg = registry(&bus);
        let a = reg.create("https://a", ContainerOptions::default(), &mut host).unwrap();
        let b = reg.create("https://b", ContainerOptions::default(), &mut host).unwrap();
        let hidden = reg.create("https://c", ContainerOptions::default(), &mut host).unwrap();
        host.attach(w1, a);
        host.attach(w2, b);

        let targeted = DesktopEvent::Custom {
            event_name: "app.ping".into(),
            data: serde_json::Value::Null,
            window_id: Some(w1),
            container_ids: None,
        };
        assert_eq!(reg.broadcast(&targeted, &mut host), 1);
        assert_eq!(host.surface(a).unwrap().scripts.len(), 1);
        assert!(host.surface(b).unwrap().scripts.is_empty());

        let by_id = DesktopEvent::Custom {
            event_name: "app.ping".into(),
            data: serde_json::Value::Null,
            window_id: None,
            container_ids: Some(vec![b, hidden]),
        };
        assert_eq!(reg.broadcast(&by_id, &mut host), 2);

        let everyone = DesktopEvent::TabTitle {
            id: a,
            title: "A".into(),
        };
        assert_eq!(reg.broadcast(&everyone, &mut host), 3);
        assert!(host.surface(a).unwrap().scripts[1].contains("desktop.onTabTitle"));
    }

    #[test]
    fn deliver_pending_mirrors_bus_traffic() {
        let bus = EventBus::new();
        let mut host = HeadlessHost::new();
        let mut reg = registry(&bus);
        let a = reg.create("https://a", ContainerOptions::default(), &mut host).unwrap();

        bus.publish(DesktopEvent::TabClosed {
            id: ContainerId(77),
            window_id: WindowId(99),
        });
        bus.publish(DesktopEvent::TabTitle {
            id: a,
            title: "A".into(),
        });
        // The first event targets a window `a` is not attached to.
        assert_eq!(reg.deliver_pending(&mut host), 1);
        assert_eq!(reg.deliver_pending(&mut host), 0);
    }
}
