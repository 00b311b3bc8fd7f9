//! Command dispatch from the renderer UI into the orchestrators.

use serde_json::{json, Value};
use tabdeck_common::{Surface, TabError, WindowId};
use tabdeck_host::HostRuntime;
use tracing::{debug, warn};

use super::command::Command;
use crate::container::ContainerOptions;
use crate::desktop::Desktop;
use crate::orchestrator::{CloseTabOptions, TabHandle};

/// Outcome of a dispatched command.
#[derive(Debug)]
pub enum Reply {
    /// Answered right away.
    Done(Value),
    /// Held back by the frame-ready barrier; resolves once it opens.
    Pending(TabHandle),
}

impl Reply {
    pub fn is_pending(&self) -> bool {
        matches!(self, Reply::Pending(_))
    }
}

impl<H: HostRuntime> Desktop<H> {
    /// Parse and dispatch a raw `{type, data}` request.
    pub fn dispatch_raw(
        &mut self,
        kind: &str,
        data: &Value,
        sender: Option<Surface>,
    ) -> Result<Reply, TabError> {
        let command = Command::parse(kind, data).inspect_err(|e| {
            warn!(kind, error = %e, "command rejected");
        })?;
        self.dispatch(command, sender)
    }

    /// Run one command, then settle whatever it set in motion.
    pub fn dispatch(&mut self, command: Command, sender: Option<Surface>) -> Result<Reply, TabError> {
        let kind = command.kind();
        debug!(kind, ?sender, "command dispatched");
        let reply = self.run_command(command, sender);
        if let Err(e) = &reply {
            warn!(kind, error = %e, "command failed");
        }
        self.pump();
        reply
    }

    fn run_command(&mut self, command: Command, sender: Option<Surface>) -> Result<Reply, TabError> {
        let window = match &command {
            Command::ReloadWebContainer => None,
            other => Some(self.target_window(other, sender)?),
        };

        match (command, window) {
            (Command::CreateTabOnWindow { url, .. }, Some(w)) => {
                let mut handle = self.with_tabs(w, |tabs, ctx| {
                    tabs.create_tab(ctx, &url, Some(w), ContainerOptions::default())
                })?;
                if handle.is_queued() {
                    return Ok(Reply::Pending(handle));
                }
                let id = handle.try_take().unwrap_or(Err(TabError::Abandoned))?;
                Ok(Reply::Done(json!({ "id": id })))
            }
            (Command::CloseTabOnTabPage { id, .. }, Some(w)) => {
                let closed =
                    self.with_tabs(w, |tabs, ctx| tabs.close_tab(ctx, id, CloseTabOptions::default()))??;
                Ok(Reply::Done(json!({ "closed": closed })))
            }
            (Command::SwitchTabOnWindow { id, .. }, Some(w)) => {
                let id = self.with_tabs(w, |tabs, ctx| tabs.switch_tab_with_id(ctx, id, false))??;
                Ok(Reply::Done(json!({ "id": id })))
            }
            (Command::CloseAllTabsOnWindow { .. }, Some(w)) => {
                let closed = self.with_tabs(w, |tabs, ctx| tabs.close_all_tabs(ctx))?;
                Ok(Reply::Done(json!({ "closed": closed })))
            }
            (Command::FrameDidReadyOnTabPage { .. }, Some(w)) => {
                let released = self.with_tabs(w, |tabs, ctx| tabs.set_frame_ready(ctx))?;
                Ok(Reply::Done(json!({ "released": released })))
            }
            (Command::ReloadWebContainer, _) => {
                let Some(Surface::Container(id)) = sender else {
                    return Err(TabError::InvalidPayload {
                        command: command_name(&Command::ReloadWebContainer),
                        reason: "sender is not a container".into(),
                    });
                };
                self.containers.reload(id, &mut self.host)?;
                Ok(Reply::Done(Value::Null))
            }
            (command, None) => Err(TabError::InvalidPayload {
                command: command_name(&command),
                reason: "no target window".into(),
            }),
        }
    }

    /// Explicit `windowId` must name a live window; otherwise the sender's
    /// window is used.
    fn target_window(&self, command: &Command, sender: Option<Surface>) -> Result<WindowId, TabError> {
        match command.window_id() {
            Some(w) if self.windows.contains(w) => Ok(w),
            Some(w) => Err(TabError::WindowNotFound(w)),
            None => self
                .windows
                .window_from_sender(sender, &self.host)
                .ok_or_else(|| TabError::InvalidPayload {
                    command: command_name(command),
                    reason: "no windowId and the sender has no window".into(),
                }),
        }
    }
}

fn command_name(command: &Command) -> String {
    command.kind().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::window::WindowOptions;
    use tabdeck_common::ContainerId;
    use tabdeck_config::TabdeckConfig;
    use tabdeck_host::HeadlessHost;

    fn desktop_with_window() -> (Desktop<HeadlessHost>, WindowId) {
        let mut d = Desktop::new(TabdeckConfig::default(), HeadlessHost::new());
        let w = d.create_window(WindowOptions::default()).unwrap();
        (d, w)
    }

    fn done(reply: Reply) -> Value {
        match reply {
            Reply::Done(v) => v,
            Reply::Pending(_) => panic!("expected an immediate reply"),
        }
    }

    fn ready(d: &mut Desktop<HeadlessHost>, w: WindowId) {
        d.dispatch_raw("frameDidReadyOnTabPage", &json!({ "windowId": w }), None)
            .unwrap();
    }

    #[test]
    fn unknown_command_fails() {
        let (mut d, _) = desktop_with_window();
        let err = d.dispatch_raw("doSomething", &json!({}), None).unwrap_err();
        assert!(matches!(err, TabError::UnknownCommand(_)));
    }

    #[test]
    fn create_on_unknown_window_fails() {
        let (mut d, _) = desktop_with_window();
        let err = d
            .dispatch_raw(
                "createTabOnWindow",
                &json!({"windowId": 4040, "url": "https://a"}),
                None,
            )
            .unwrap_err();
        assert!(matches!(err, TabError::WindowNotFound(WindowId(4040))));
    }

    #[test]
    fn create_before_frame_ready_is_pending() {
        let (mut d, w) = desktop_with_window();
        let reply = d
            .dispatch_raw(
                "createTabOnWindow",
                &json!({"windowId": w, "url": "https://a"}),
                None,
            )
            .unwrap();
        let Reply::Pending(mut handle) = reply else {
            panic!("expected a pending reply");
        };
        assert!(handle.try_take().is_none());

        let released = done(
            d.dispatch_raw("frameDidReadyOnTabPage", &json!({"windowId": w}), None)
                .unwrap(),
        );
        assert_eq!(released, json!({"released": 1}));
        let id = handle.try_take().unwrap().unwrap();
        assert!(d.containers().get(id).is_some());
    }

    #[test]
    fn window_resolved_from_sender() {
        let (mut d, w) = desktop_with_window();
        ready(&mut d, w);
        let created = done(
            d.dispatch_raw(
                "createTabOnWindow",
                &json!({"url": "https://a"}),
                Some(Surface::Window(w)),
            )
            .unwrap(),
        );
        let id: ContainerId = serde_json::from_value(created["id"].clone()).unwrap();

        // A container sender resolves to the window it is shown in.
        let again = done(
            d.dispatch_raw(
                "createTabOnWindow",
                &json!({"url": "https://a"}),
                Some(Surface::Container(id)),
            )
            .unwrap(),
        );
        assert_eq!(again["id"], created["id"]);

        let err = d
            .dispatch_raw("closeAllTabsOnWindow", &json!({}), None)
            .unwrap_err();
        assert!(matches!(err, TabError::InvalidPayload { .. }));
    }

    #[test]
    fn switch_on_window_does_not_echo() {
        let (mut d, w) = desktop_with_window();
        ready(&mut d, w);
        let a = done(
            d.dispatch_raw("createTabOnWindow", &json!({"windowId": w, "url": "https://a"}), None)
                .unwrap(),
        );
        d.dispatch_raw("createTabOnWindow", &json!({"windowId": w, "url": "https://b"}), None)
            .unwrap();

        let (tx, rx) = std::sync::mpsc::channel();
        d.bus().subscribe(move |e| {
            let _ = tx.send(e.name().to_string());
        });
        let switched = done(
            d.dispatch_raw("switchTabOnWindow", &json!({"windowId": w, "id": a["id"]}), None)
                .unwrap(),
        );
        assert_eq!(switched["id"], a["id"]);
        assert!(rx.try_iter().next().is_none());
    }

    #[test]
    fn close_on_tab_page_is_idempotent() {
        let (mut d, w) = desktop_with_window();
        ready(&mut d, w);
        let a = done(
            d.dispatch_raw("createTabOnWindow", &json!({"windowId": w, "url": "https://a"}), None)
                .unwrap(),
        );
        let first = done(
            d.dispatch_raw("closeTabOnTabPage", &json!({"windowId": w, "id": a["id"]}), None)
                .unwrap(),
        );
        assert_eq!(first, json!({"closed": true}));
        let second = done(
            d.dispatch_raw("closeTabOnTabPage", &json!({"windowId": w, "id": a["id"]}), None)
                .unwrap(),
        );
        assert_eq!(second, json!({"closed": false}));
    }

    #[test]
    fn close_all_on_window() {
        let (mut d, w) = desktop_with_window();
        ready(&mut d, w);
        for url in ["https://a", "https://b"] {
            d.dispatch_raw("createTabOnWindow", &json!({"windowId": w, "url": url}), None)
                .unwrap();
        }
        let reply = done(
            d.dispatch_raw("closeAllTabsOnWindow", &json!({"windowId": w}), None)
                .unwrap(),
        );
        assert_eq!(reply, json!({"closed": 2}));
        assert!(d.containers().is_empty());
    }

    #[test]
    fn reload_needs_container_sender() {
        let (mut d, w) = desktop_with_window();
        ready(&mut d, w);
        let a = done(
            d.dispatch_raw("createTabOnWindow", &json!({"windowId": w, "url": "https://a"}), None)
                .unwrap(),
        );
        let id: ContainerId = serde_json::from_value(a["id"].clone()).unwrap();

        assert!(matches!(
            d.dispatch_raw("reloadWebContainer", &Value::Null, Some(Surface::Window(w))),
            Err(TabError::InvalidPayload { .. })
        ));
        assert!(d
            .dispatch_raw("reloadWebContainer", &Value::Null, Some(Surface::Container(id)))
            .is_ok());
        assert!(matches!(
            d.dispatch_raw(
                "reloadWebContainer",
                &Value::Null,
                Some(Surface::Container(ContainerId(999)))
            ),
            Err(TabError::ContainerNotFound(_))
        ));
    }
}
