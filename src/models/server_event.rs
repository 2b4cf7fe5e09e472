use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use super::event_kind::EventKind;

/// Generic inbound event envelope pushed by the server.
///
/// Every realtime message after the auth handshake uses this shape:
///
/// ```json
/// {"event": "job_progress", "payload": {"job_id": "j1", "progress": 40}}
/// ```
///
/// The connection layer forwards the envelope to the registry without
/// interpreting the payload, which is how new server event types are
/// supported without transport changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerEvent {
    /// Logical event name.
    pub event: String,
    /// Event payload; `null` when the server sends none.
    #[serde(default)]
    pub payload: JsonValue,
}

impl ServerEvent {
    /// Create an envelope.
    pub fn new(event: impl Into<String>, payload: JsonValue) -> Self {
        Self {
            event: event.into(),
            payload,
        }
    }

    /// Parse the event name into the closed kind set.
    pub fn kind(&self) -> EventKind {
        EventKind::parse(&self.event)
    }
}
