//! Stdio session: feeds request lines into a `Desktop` and reports replies
//! and mirrored events back as lines.

use std::sync::mpsc::{self, Receiver};

use serde::Serialize;
use tabdeck_common::{EventEnvelope, TabError, WindowId};
use tabdeck_core::{ContainerOptions, Desktop, Reply, TabHandle, WindowOptions};
use tabdeck_host::HostRuntime;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

use crate::protocol::{parse_request, EventLine, Response};

struct Waiting {
    /// `None` for tabs the session opened itself.
    seq: Option<u64>,
    handle: TabHandle,
}

pub struct Session<H: HostRuntime> {
    desktop: Desktop<H>,
    events: Receiver<EventEnvelope>,
    waiting: Vec<Waiting>,
}

impl<H: HostRuntime> Session<H> {
    pub fn new(desktop: Desktop<H>) -> Self {
        let (tx, events) = mpsc::channel();
        desktop.bus().subscribe(move |event| {
            let _ = tx.send(event.envelope());
        });
        Self {
            desktop,
            events,
            waiting: Vec::new(),
        }
    }

    pub fn desktop(&self) -> &Desktop<H> {
        &self.desktop
    }

    /// Open the first window, optionally queueing `url` as its first tab.
    pub fn open_initial_window(&mut self, url: Option<&str>) -> Result<WindowId, TabError> {
        let window = self.desktop.create_window(WindowOptions::default())?;
        if let Some(url) = url {
            let handle = self.desktop.with_tabs(window, |tabs, ctx| {
                tabs.create_tab(ctx, url, None, ContainerOptions::default())
            })?;
            self.waiting.push(Waiting { seq: None, handle });
        }
        self.desktop.pump();
        Ok(window)
    }

    /// Handle one request line. Returns the output lines it produced:
    /// mirrored events first, then the reply, then any earlier requests
    /// that this one released.
    pub fn handle_line(&mut self, line: &str) -> Vec<String> {
        let response = match parse_request(line) {
            Ok(req) => {
                debug!(seq = req.seq, kind = %req.kind, "request");
                match self.desktop.dispatch_raw(&req.kind, &req.data, req.sender) {
                    Ok(Reply::Done(value)) => Some(Response::ok(req.seq, value)),
                    Ok(Reply::Pending(handle)) => {
                        self.waiting.push(Waiting {
                            seq: Some(req.seq),
                            handle,
                        });
                        None
                    }
                    Err(e) => Some(Response::error(Some(req.seq), e.to_string())),
                }
            }
            Err((seq, reason)) => {
                warn!(?seq, %reason, "malformed request");
                Some(Response::error(seq, reason))
            }
        };

        let mut out = self.drain_events();
        out.extend(response.iter().filter_map(encode));
        out.extend(self.resolve_waiting());
        out
    }

    /// Tear everything down.
    pub fn shutdown(&mut self) -> Vec<String> {
        self.desktop.shutdown();
        let mut out = self.drain_events();
        out.extend(self.resolve_waiting());
        out
    }

    /// Read requests until EOF, writing every output line to `output`.
    pub async fn run<R, W>(&mut self, input: R, mut output: W) -> std::io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = input.lines();
        write_lines(&mut output, self.drain_events()).await?;
        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            let out = self.handle_line(&line);
            write_lines(&mut output, out).await?;
        }
        info!("input closed, shutting down");
        let out = self.shutdown();
        write_lines(&mut output, out).await
    }

    fn drain_events(&mut self) -> Vec<String> {
        self.events
            .try_iter()
            .filter_map(|event| encode(&EventLine { event }))
            .collect()
    }

    fn resolve_waiting(&mut self) -> Vec<String> {
        let mut out = Vec::new();
        let mut still_waiting = Vec::new();
        for mut waiting in self.waiting.drain(..) {
            let Some(result) = waiting.handle.try_take() else {
                still_waiting.push(waiting);
                continue;
            };
            match (waiting.seq, result) {
                (Some(seq), Ok(id)) => {
                    out.extend(encode(&Response::ok(seq, serde_json::json!({ "id": id }))))
                }
                (Some(seq), Err(e)) => out.extend(encode(&Response::error(Some(seq), e.to_string()))),
                (None, Ok(id)) => info!(container_id = %id, "initial tab opened"),
                (None, Err(e)) => warn!(error = %e, "initial tab failed"),
            }
        }
        self.waiting = still_waiting;
        out
    }
}

fn encode<T: Serialize>(value: &T) -> Option<String> {
    match serde_json::to_string(value) {
        Ok(line) => Some(line),
        Err(e) => {
            warn!(error = %e, "failed to encode output line");
            None
        }
    }
}

async fn write_lines<W: AsyncWrite + Unpin>(output: &mut W, lines: Vec<String>) -> std::io::Result<()> {
    for line in lines {
        output.write_all(line.as_bytes()).await?;
        output.write_all(b"\n").await?;
    }
    output.flush().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use tabdeck_config::TabdeckConfig;
    use tabdeck_host::HeadlessHost;

    fn session() -> Session<HeadlessHost> {
        Session::new(Desktop::new(TabdeckConfig::default(), HeadlessHost::new()))
    }

    fn parse(lines: &[String]) -> Vec<Value> {
        lines
            .iter()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    fn replies(lines: &[String]) -> Vec<Value> {
        parse(lines)
            .into_iter()
            .filter(|v| v.get("seq").is_some())
            .collect()
    }

    #[test]
    fn initial_tab_opens_after_frame_ready() {
        let mut s = session();
        let w = s.open_initial_window(Some("https://home")).unwrap();
        assert_eq!(s.desktop().windows().len(), 1);
        assert!(s.desktop().containers().is_empty());

        let out = s.handle_line(&format!(
            r#"{{"seq": 1, "type": "frameDidReadyOnTabPage", "data": {{"windowId": {}}}}}"#,
            w.0
        ));
        assert_eq!(replies(&out), vec![json!({"seq": 1, "ok": {"released": 1}})]);
        assert_eq!(s.desktop().containers().len(), 1);
        let events = parse(&out);
        assert!(events
            .iter()
            .any(|v| v["event"]["eventName"] == "desktop.onCreateTab"));
    }

    #[test]
    fn pending_request_answered_when_released() {
        let mut s = session();
        let w = s.open_initial_window(None).unwrap();

        let out = s.handle_line(&format!(
            r#"{{"seq": 1, "type": "createTabOnWindow", "data": {{"windowId": {}, "url": "https://a"}}}}"#,
            w.0
        ));
        assert!(replies(&out).is_empty());

        let out = s.handle_line(&format!(
            r#"{{"seq": 2, "sender": {{"window": {}}}, "type": "frameDidReadyOnTabPage"}}"#,
            w.0
        ));
        let replies = replies(&out);
        assert_eq!(replies.len(), 2);
        assert_eq!(replies[0]["seq"], 2);
        assert_eq!(replies[1]["seq"], 1);
        assert!(replies[1]["ok"]["id"].is_u64());
    }

    #[test]
    fn errors_are_reported_per_request() {
        let mut s = session();
        s.open_initial_window(None).unwrap();

        let out = s.handle_line(r#"{"seq": 5, "type": "nope"}"#);
        let reply = &replies(&out)[0];
        assert_eq!(reply["seq"], 5);
        assert!(reply["error"].as_str().unwrap().contains("nope"));

        let out = s.handle_line(r#"{"seq": 6, "type": "createTabOnWindow", "data": {"windowId": 999, "url": "https://a"}}"#);
        assert!(replies(&out)[0]["error"].as_str().unwrap().contains("999"));

        let out = s.handle_line("{");
        assert_eq!(replies(&out)[0]["seq"], Value::Null);
    }

    #[test]
    fn shutdown_abandons_waiting_requests() {
        let mut s = session();
        let w = s.open_initial_window(None).unwrap();
        s.handle_line(&format!(
            r#"{{"seq": 1, "type": "createTabOnWindow", "data": {{"windowId": {}, "url": "https://a"}}}}"#,
            w.0
        ));
        let out = s.shutdown();
        let replies = replies(&out);
        assert_eq!(replies.len(), 1);
        assert!(replies[0]["error"].as_str().is_some());
    }

    #[tokio::test]
    async fn run_processes_until_eof() {
        let mut s = session();
        let w = s.open_initial_window(None).unwrap();
        let input = format!(
            "{{\"seq\": 1, \"type\": \"frameDidReadyOnTabPage\", \"data\": {{\"windowId\": {w}}}}}\n\n{{\"seq\": 2, \"type\": \"createTabOnWindow\", \"data\": {{\"windowId\": {w}, \"url\": \"https://a\"}}}}\n",
            w = w.0
        );
        let mut output = Vec::new();
        s.run(input.as_bytes(), &mut output).await.unwrap();

        let text = String::from_utf8(output).unwrap();
        let lines: Vec<String> = text.lines().map(str::to_string).collect();
        let replies = replies(&lines);
        assert_eq!(replies.len(), 2);
        assert_eq!(replies[1]["seq"], 2);
        // Shutdown closed the tab and the window.
        assert!(s.desktop().windows().is_empty());
    }
}
