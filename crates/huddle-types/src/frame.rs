//! Live-stream frames.
//!
//! Inbound frames are JSON objects tagged by an `event` field. Only
//! `message` carries a payload the client acts on; every other tag is
//! surfaced as [`InboundFrame::Other`] so callers can ignore it.
//!
//! Outbound frames are `{"event": "message", "content": "..."}`. The server
//! assigns id and timestamp on receipt.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::FrameError;
use crate::message::WireMessage;

/// The only inbound event tag that updates the timeline.
pub const MESSAGE_EVENT: &str = "message";

/// A parsed inbound frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundFrame {
    Message(WireMessage),
    /// Any event tag other than `message`, kept for logging.
    Other(String),
}

/// Parse one inbound text frame.
///
/// # Errors
///
/// Returns [`FrameError`] when the frame is not JSON, has no string
/// `event` tag, or is a `message` event whose payload is missing or
/// malformed. Unknown tags are not errors.
pub fn parse_inbound(text: &str) -> Result<InboundFrame, FrameError> {
    let mut value: Value =
        serde_json::from_str(text).map_err(|e| FrameError::Malformed(e.to_string()))?;

    let event = value
        .get("event")
        .and_then(Value::as_str)
        .ok_or(FrameError::MissingEvent)?
        .to_string();

    if event != MESSAGE_EVENT {
        return Ok(InboundFrame::Other(event));
    }

    let payload = value
        .get_mut("message")
        .map(Value::take)
        .ok_or(FrameError::MissingPayload)?;
    let message: WireMessage =
        serde_json::from_value(payload).map_err(|e| FrameError::Malformed(e.to_string()))?;
    Ok(InboundFrame::Message(message))
}

/// A frame the client sends over the live connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum OutboundFrame {
    Message { content: String },
}

impl OutboundFrame {
    pub fn message(content: impl Into<String>) -> Self {
        OutboundFrame::Message {
            content: content.into(),
        }
    }

    /// Serialize to the JSON text sent over the wire.
    pub fn encode(&self) -> Result<String, FrameError> {
        serde_json::to_string(self).map_err(|e| FrameError::Malformed(e.to_string()))
    }
}
