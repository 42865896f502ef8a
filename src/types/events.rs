//! Server-sent events of a streaming prediction.

use serde::{Deserialize, Serialize};

/// A decoded SSE frame before interpretation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SseEvent {
    /// Value of the `event:` field; `"message"` when the frame had none.
    pub event: String,
    /// Joined `data:` lines; `None` when the frame carried no data field.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
}

impl SseEvent {
    pub fn new(event: impl Into<String>, data: Option<&str>) -> Self {
        Self {
            event: event.into(),
            data: data.map(str::to_string),
            id: None,
        }
    }
}

/// Typed event of a prediction stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event_type")]
pub enum StreamEvent {
    /// Incremental output chunk.
    #[serde(rename = "output")]
    Output { data: Option<String> },

    /// The prediction failed mid-stream.
    #[serde(rename = "error")]
    Error { message: Option<String> },

    /// The prediction finished; no more output follows.
    #[serde(rename = "done")]
    Done,

    /// Anything else the service sends (keep-alives, log lines, future additions).
    #[serde(rename = "other")]
    Other { event: String },
}

impl From<SseEvent> for StreamEvent {
    fn from(frame: SseEvent) -> Self {
        match frame.event.as_str() {
            "output" => StreamEvent::Output { data: frame.data },
            "error" => StreamEvent::Error {
                message: frame.data,
            },
            "done" => StreamEvent::Done,
            _ => StreamEvent::Other { event: frame.event },
        }
    }
}
