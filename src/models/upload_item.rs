use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle state of one queued upload.
///
/// Transitions are strictly forward:
/// `Pending → Uploading → Processing → {Completed | Error}`.
/// `Completed` and `Error` are terminal; updates against a terminal item
/// are silently ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadStatus {
    /// Queued, no network activity yet.
    Pending,
    /// HTTP upload in flight.
    Uploading,
    /// Upload accepted; server-side job running.
    Processing,
    /// Job finished successfully.
    Completed,
    /// HTTP upload or server-side job failed.
    Error,
}

impl UploadStatus {
    /// Whether this state admits no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Error)
    }
}

impl fmt::Display for UploadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Uploading => write!(f, "uploading"),
            Self::Processing => write!(f, "processing"),
            Self::Completed => write!(f, "completed"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// One entry in the upload queue.
///
/// Created synchronously at enqueue time, before any network call, so a
/// consumer can render the queued file immediately.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadItem {
    /// Client-generated id, unique within the queue.
    pub id: String,
    /// Filename as given at enqueue time.
    pub file_name: String,
    /// File size in bytes.
    pub file_size: u64,
    /// MIME type of the file.
    pub file_type: String,
    /// Current lifecycle state.
    pub status: UploadStatus,
    /// Percent complete (0-100). Forced to 100 on completion regardless of
    /// the last reported value.
    pub progress: f64,
    /// Server-assigned job id, recorded once the upload response arrives.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,
    /// Server-assigned document id, set on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_id: Option<String>,
    /// Failure reason, set when the item reaches `Error`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Millis since Unix epoch when the item was enqueued.
    pub started_at_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(!UploadStatus::Pending.is_terminal());
        assert!(!UploadStatus::Uploading.is_terminal());
        assert!(!UploadStatus::Processing.is_terminal());
        assert!(UploadStatus::Completed.is_terminal());
        assert!(UploadStatus::Error.is_terminal());
    }

    #[test]
    fn test_status_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&UploadStatus::Uploading).expect("serializable"),
            "\"uploading\""
        );
    }
}
