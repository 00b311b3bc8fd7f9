//! Rust -> page event delivery.
//!
//! Every web surface listens for a single DOM `CustomEvent` whose `detail`
//! is the event envelope; the page-side event manager routes it by
//! `eventName`.

use tabdeck_common::EventEnvelope;

/// Build the script that dispatches `envelope` inside a page.
pub fn dispatch_event_script(event_key: &str, envelope: &EventEnvelope) -> String {
    let detail = serde_json::to_string(envelope).unwrap_or_else(|_| "null".to_string());
    let key = serde_json::to_string(event_key).unwrap_or_else(|_| "\"\"".to_string());
    format!("window.dispatchEvent(new CustomEvent({key}, {{ detail: {detail} }}));")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn envelope() -> EventEnvelope {
        EventEnvelope {
            event_name: "desktop.onSwitchTab".into(),
            data: json!({ "id": 4, "windowId": 1 }),
        }
    }

    #[test]
    fn script_dispatches_custom_event() {
        let script = dispatch_event_script("YDS_NATIVE_BRIDGE_EVENT_KEY", &envelope());
        assert_eq!(
            script,
            r#"window.dispatchEvent(new CustomEvent("YDS_NATIVE_BRIDGE_EVENT_KEY", { detail: {"eventName":"desktop.onSwitchTab","data":{"id":4,"windowId":1}} }));"#
        );
    }

    #[test]
    fn event_key_is_quoted_safely() {
        let script = dispatch_event_script("a\"b", &envelope());
        assert!(script.contains(r#"CustomEvent("a\"b""#));
    }

    #[test]
    fn string_payloads_are_json_escaped() {
        let env = EventEnvelope {
            event_name: "desktop.onTabTitle".into(),
            data: json!({ "id": 1, "title": "</script><script>alert(1)" }),
        };
        let script = dispatch_event_script("k", &env);
        assert!(script.contains(r#""title":"</script><script>alert(1)""#));
        assert!(script.ends_with("}));"));
    }
}
