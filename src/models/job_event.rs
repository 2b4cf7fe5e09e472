use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Payload of a `job_progress` event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobProgressEvent {
    /// Server-assigned job correlation id.
    pub job_id: String,
    /// Percent complete (0-100) as reported by the server.
    pub progress: f64,
}

/// Payload of a `job_completed` event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobCompletedEvent {
    /// Server-assigned job correlation id.
    pub job_id: String,
    /// Final document id, when the server includes it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document_id: Option<String>,
}

/// Payload of a `job_failed` event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobFailedEvent {
    /// Server-assigned job correlation id.
    pub job_id: String,
    /// Human-readable failure reason.
    pub error_message: String,
}

impl JobProgressEvent {
    /// Parse from a raw event payload; `None` when the shape doesn't match.
    pub fn from_payload(payload: &JsonValue) -> Option<Self> {
        serde_json::from_value(payload.clone()).ok()
    }
}

impl JobCompletedEvent {
    /// Parse from a raw event payload; `None` when the shape doesn't match.
    pub fn from_payload(payload: &JsonValue) -> Option<Self> {
        serde_json::from_value(payload.clone()).ok()
    }
}

impl JobFailedEvent {
    /// Parse from a raw event payload; `None` when the shape doesn't match.
    pub fn from_payload(payload: &JsonValue) -> Option<Self> {
        serde_json::from_value(payload.clone()).ok()
    }
}
