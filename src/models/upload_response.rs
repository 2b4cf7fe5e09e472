use serde::{Deserialize, Serialize};

/// Response to a successful document upload.
///
/// The returned `job_id` correlates the upload with its asynchronous
/// processing events (`job_progress` / `job_completed` / `job_failed`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadResponse {
    /// Id of the stored document.
    pub document_id: String,
    /// Id of the server-side processing job for this document.
    pub job_id: String,
}
