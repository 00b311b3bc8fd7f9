//! A single loaded content surface and its options.

use serde::{Deserialize, Serialize};
use tabdeck_common::{ContainerId, DesktopEvent, EventBus, HostError};
use tabdeck_host::HostRuntime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContainerState {
    Created,
    Loading,
    Ready,
    /// Showing the fallback surface. The tab stays open.
    Errored,
    Destroyed,
}

/// Partial option set. Unset fields defer to the next layer down:
/// caller, then registry defaults, then built-in defaults (all off).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ContainerOptions {
    pub use_error_view: Option<bool>,
    #[serde(rename = "useHTMLTitleAndIcon")]
    pub use_html_title_and_icon: Option<bool>,
    pub disable_close: Option<bool>,
}

impl ContainerOptions {
    /// Defaults every tab starts from before the caller's own options.
    pub fn tab_defaults() -> Self {
        Self {
            use_error_view: Some(true),
            use_html_title_and_icon: Some(true),
            disable_close: None,
        }
    }

    /// Layer `top` over `self`; fields set in `top` win.
    pub fn overlay(self, top: ContainerOptions) -> Self {
        Self {
            use_error_view: top.use_error_view.or(self.use_error_view),
            use_html_title_and_icon: top.use_html_title_and_icon.or(self.use_html_title_and_icon),
            disable_close: top.disable_close.or(self.disable_close),
        }
    }

    pub fn resolve(self) -> ResolvedOptions {
        ResolvedOptions {
            use_error_view: self.use_error_view.unwrap_or(false),
            use_html_title_and_icon: self.use_html_title_and_icon.unwrap_or(false),
            disable_close: self.disable_close.unwrap_or(false),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResolvedOptions {
    /// Redirect to the error page when a load fails.
    pub use_error_view: bool,
    /// Publish page title and icon changes to the UI.
    pub use_html_title_and_icon: bool,
    /// Refuse user-initiated closes.
    pub disable_close: bool,
}

#[derive(Debug, Clone)]
pub struct Container {
    id: ContainerId,
    url: String,
    title: String,
    icon: String,
    options: ResolvedOptions,
    state: ContainerState,
}

impl Container {
    pub(crate) fn new(id: ContainerId, url: impl Into<String>, options: ResolvedOptions) -> Self {
        Self {
            id,
            url: url.into(),
            title: String::new(),
            icon: String::new(),
            options,
            state: ContainerState::Created,
        }
    }

    pub fn id(&self) -> ContainerId {
        self.id
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn icon(&self) -> &str {
        &self.icon
    }

    pub fn options(&self) -> ResolvedOptions {
        self.options
    }

    pub fn state(&self) -> ContainerState {
        self.state
    }

    pub fn is_live(&self) -> bool {
        self.state != ContainerState::Destroyed
    }

    /// Title/icon capture from page callbacks is suspended while errored.
    pub fn captures_page_info(&self) -> bool {
        matches!(
            self.state,
            ContainerState::Created | ContainerState::Loading | ContainerState::Ready
        )
    }

    pub fn set_title(&mut self, title: impl Into<String>, bus: &EventBus) {
        self.title = title.into();
        if self.options.use_html_title_and_icon {
            bus.publish(DesktopEvent::TabTitle {
                id: self.id,
                title: self.title.clone(),
            });
        }
    }

    pub fn set_icon(&mut self, icon: impl Into<String>, bus: &EventBus) {
        self.icon = icon.into();
        if self.options.use_html_title_and_icon {
            bus.publish(DesktopEvent::TabIcon {
                id: self.id,
                icon_url: self.icon.clone(),
            });
        }
    }

    pub fn load_url(
        &mut self,
        url: impl Into<String>,
        host: &mut dyn HostRuntime,
    ) -> Result<(), HostError> {
        self.url = url.into();
        self.state = ContainerState::Loading;
        host.load_url(self.id, &self.url)
    }

    /// Reload the container's own URL, leaving any error page behind.
    pub fn reload(&mut self, host: &mut dyn HostRuntime) {
        // An errored surface is showing the error page, so a plain reload
        // would only reload that.
        if self.state == ContainerState::Errored {
            if let Err(e) = host.load_url(self.id, &self.url) {
                tracing::warn!(container_id = %self.id, error = %e, "reload failed");
            }
        } else {
            host.reload(self.id);
        }
        self.state = ContainerState::Loading;
    }

    pub(crate) fn set_state(&mut self, state: ContainerState) {
        self.state = state;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use tabdeck_host::{HeadlessHost, SurfaceConfig};

    fn options(title_and_icon: bool) -> ResolvedOptions {
        ResolvedOptions {
            use_html_title_and_icon: title_and_icon,
            ..Default::default()
        }
    }

    #[test]
    fn overlay_prefers_top_layer() {
        let registry = ContainerOptions {
            use_error_view: Some(false),
            use_html_title_and_icon: None,
            disable_close: Some(true),
        };
        let caller = ContainerOptions {
            use_error_view: Some(true),
            ..Default::default()
        };
        let merged = registry.overlay(caller).resolve();
        assert!(merged.use_error_view);
        assert!(!merged.use_html_title_and_icon);
        assert!(merged.disable_close);
    }

    #[test]
    fn built_in_defaults_are_off() {
        let resolved = ContainerOptions::default().resolve();
        assert_eq!(resolved, ResolvedOptions::default());
        assert!(!resolved.use_error_view);
    }

    #[test]
    fn tab_defaults_enable_error_view_and_title() {
        let resolved = ContainerOptions::tab_defaults().resolve();
        assert!(resolved.use_error_view);
        assert!(resolved.use_html_title_and_icon);
        assert!(!resolved.disable_close);
    }

    #[test]
    fn options_deserialize_from_camel_case() {
        let opts: ContainerOptions =
            serde_json::from_str(r#"{"useHTMLTitleAndIcon": false, "disableClose": true}"#)
                .unwrap();
        assert_eq!(opts.use_html_title_and_icon, Some(false));
        assert_eq!(opts.disable_close, Some(true));
        assert_eq!(opts.use_error_view, None);
    }

    #[test]
    fn title_publishes_only_when_opted_in() {
        let bus = EventBus::new();
        let (tx, rx) = mpsc::channel();
        bus.subscribe(move |e| tx.send(e.clone()).unwrap());

        let mut quiet = Container::new(ContainerId(1), "https://a", options(false));
        quiet.set_title("A", &bus);
        quiet.set_icon("https://a/i.png", &bus);
        assert_eq!(quiet.title(), "A");
        assert!(rx.try_recv().is_err());

        let mut loud = Container::new(ContainerId(2), "https://b", options(true));
        loud.set_title("B", &bus);
        loud.set_icon("https://b/i.png", &bus);
        let events: Vec<_> = rx.try_iter().collect();
        assert_eq!(
            events,
            vec![
                DesktopEvent::TabTitle {
                    id: ContainerId(2),
                    title: "B".into()
                },
                DesktopEvent::TabIcon {
                    id: ContainerId(2),
                    icon_url: "https://b/i.png".into()
                },
            ]
        );
    }

    #[test]
    fn reload_returns_to_loading_and_reloads_own_url() {
        let mut host = HeadlessHost::new();
        let id = host.create_surface(&SurfaceConfig::default()).unwrap();
        let mut c = Container::new(id, "https://a", options(true));
        c.load_url("https://a", &mut host).unwrap();
        c.set_state(ContainerState::Errored);
        assert!(!c.captures_page_info());

        c.reload(&mut host);
        assert_eq!(c.state(), ContainerState::Loading);
        assert!(c.captures_page_info());
        assert_eq!(
            host.surface(id).unwrap().load_history,
            vec!["https://a".to_string(), "https://a".to_string()]
        );
        assert_eq!(host.surface(id).unwrap().reloads, 0);
    }

    #[test]
    fn reload_of_healthy_page_asks_host_to_reload() {
        let mut host = HeadlessHost::new();
        let id = host.create_surface(&SurfaceConfig::default()).unwrap();
        let mut c = Container::new(id, "https://a", options(true));
        c.load_url("https://a", &mut host).unwrap();
        c.set_state(ContainerState::Ready);

        c.reload(&mut host);
        assert_eq!(c.state(), ContainerState::Loading);
        let surface = host.surface(id).unwrap();
        assert_eq!(surface.reloads, 1);
        assert_eq!(surface.load_history, vec!["https://a".to_string()]);
    }
}
