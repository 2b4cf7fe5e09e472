//! Document HTTP collaborators.
//!
//! The three request/response operations the coordination layer consumes:
//! upload a document (multipart), fetch a document's content by id, and
//! update a document's content by id. Idempotent reads are retried on
//! transient transport errors; writes are single-attempt.

use log::{debug, warn};
use serde::Deserialize;
use std::time::Instant;

use crate::auth::AuthProvider;
use crate::error::{PaperLinkError, Result};
use crate::models::{ErrorDetail, UploadRequest, UploadResponse};

/// Shape of a structured error body from the Paper HTTP API.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: Option<ErrorDetail>,
}

/// Handles document operations via HTTP.
#[derive(Clone)]
pub struct DocumentApi {
    base_url: String,
    http_client: reqwest::Client,
    auth: AuthProvider,
}

impl DocumentApi {
    pub(crate) fn new(base_url: String, http_client: reqwest::Client, auth: AuthProvider) -> Self {
        Self {
            base_url,
            http_client,
            auth,
        }
    }

    /// Upload a document.
    ///
    /// Single attempt: uploads are not idempotent, so transient failures
    /// surface to the caller instead of risking a duplicate document.
    pub async fn upload_document(&self, request: &UploadRequest) -> Result<UploadResponse> {
        let url = format!("{}/v1/api/documents", self.base_url);
        debug!(
            "[LINK_HTTP] POST {} file=\"{}\" ({} bytes)",
            url,
            request.file_name,
            request.file_size()
        );

        let part = reqwest::multipart::Part::bytes(request.data.to_vec())
            .file_name(request.file_name.clone())
            .mime_str(&request.file_type)
            .map_err(|e| {
                PaperLinkError::ConfigurationError(format!(
                    "Invalid file type '{}': {}",
                    request.file_type, e
                ))
            })?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let mut req_builder = self.http_client.post(&url).multipart(form);
        req_builder = self.auth.apply_to_request(req_builder)?;

        let start = Instant::now();
        let response = req_builder.send().await?;
        let status = response.status();
        debug!(
            "[LINK_HTTP] Upload response: status={} duration_ms={}",
            status,
            start.elapsed().as_millis()
        );

        if status.is_success() {
            Ok(response.json::<UploadResponse>().await?)
        } else {
            Err(self.server_error(response).await)
        }
    }

    /// Fetch a document's content by id.
    ///
    /// Retried up to 3 times on timeout/connect errors with linear backoff;
    /// the read is idempotent.
    pub async fn fetch_content(&self, document_id: &str) -> Result<String> {
        let url = format!("{}/v1/api/documents/{}/content", self.base_url, document_id);
        let max_retries = 3;
        let mut retries = 0;

        loop {
            let mut req_builder = self.http_client.get(&url);
            req_builder = self.auth.apply_to_request(req_builder)?;

            let attempt_start = Instant::now();
            debug!(
                "[LINK_HTTP] GET {} (attempt {}/{})",
                url,
                retries + 1,
                max_retries + 1
            );

            match req_builder.send().await {
                Ok(response) => {
                    let status = response.status();
                    debug!(
                        "[LINK_HTTP] Content response: status={} duration_ms={}",
                        status,
                        attempt_start.elapsed().as_millis()
                    );

                    if status.is_success() {
                        return Ok(response.text().await?);
                    }
                    return Err(self.server_error(response).await);
                },
                Err(e) if retries < max_retries && Self::is_retriable(&e) => {
                    warn!(
                        "[LINK_HTTP] Retriable error (attempt {}/{}): {}",
                        retries + 1,
                        max_retries + 1,
                        e
                    );
                    retries += 1;
                    tokio::time::sleep(tokio::time::Duration::from_millis(100 * retries as u64))
                        .await;
                    continue;
                },
                Err(e) => {
                    warn!("[LINK_HTTP] Fatal error fetching content: {}", e);
                    return Err(e.into());
                },
            }
        }
    }

    /// Update a document's content by id. Single attempt.
    pub async fn update_content(&self, document_id: &str, content: &str) -> Result<()> {
        let url = format!("{}/v1/api/documents/{}/content", self.base_url, document_id);
        debug!("[LINK_HTTP] PUT {} ({} bytes)", url, content.len());

        let mut req_builder = self
            .http_client
            .put(&url)
            .json(&serde_json::json!({ "content": content }));
        req_builder = self.auth.apply_to_request(req_builder)?;

        let response = req_builder.send().await?;
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(self.server_error(response).await)
        }
    }

    /// Map a non-success response to a [`PaperLinkError::ServerError`],
    /// extracting the server-provided message when the body parses.
    async fn server_error(&self, response: reqwest::Response) -> PaperLinkError {
        let status = response.status();
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());

        let message = match serde_json::from_str::<ErrorBody>(&error_text) {
            Ok(ErrorBody { error: Some(detail) }) => detail.message,
            _ => error_text,
        };

        warn!(
            "[LINK_HTTP] Server error: status={} message=\"{}\"",
            status, message
        );
        PaperLinkError::ServerError {
            status_code: status.as_u16(),
            message,
        }
    }

    fn is_retriable(err: &reqwest::Error) -> bool {
        err.is_timeout() || err.is_connect()
    }
}
