//! Line protocol spoken on stdin/stdout. One JSON object per line.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tabdeck_common::{EventEnvelope, Surface};

/// A command from the renderer side.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Request {
    pub seq: u64,
    /// Surface the request came from, e.g. `{"container": 4}`.
    #[serde(default)]
    pub sender: Option<Surface>,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub data: Value,
}

/// Answer to a request: exactly one of `ok` or `error` is set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response {
    pub seq: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ok: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Response {
    pub fn ok(seq: u64, value: Value) -> Self {
        Self {
            seq: Some(seq),
            ok: Some(value),
            error: None,
        }
    }

    pub fn error(seq: Option<u64>, message: impl Into<String>) -> Self {
        Self {
            seq,
            ok: None,
            error: Some(message.into()),
        }
    }
}

/// A bus event mirrored to stdout.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EventLine {
    pub event: EventEnvelope,
}

/// Parse a request line. On failure returns the `seq` if one could be
/// recovered, along with the reason.
pub fn parse_request(line: &str) -> Result<Request, (Option<u64>, String)> {
    let value: Value = serde_json::from_str(line).map_err(|e| (None, e.to_string()))?;
    let seq = value.get("seq").and_then(Value::as_u64);
    serde_json::from_value(value).map_err(|e| (seq, e.to_string()))
}
