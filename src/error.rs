//! Error types for the paper-link client library.

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, PaperLinkError>;

/// Errors surfaced by paper-link operations.
///
/// Connection-level failures are generally *not* returned from public APIs;
/// they are logged and surfaced as lifecycle events while the background
/// task retries. The variants here cover the request/response paths (HTTP
/// collaborators, cache reads, configuration).
#[derive(Error, Debug)]
pub enum PaperLinkError {
    /// Invalid client configuration (bad base URL, malformed options).
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// Authentication was rejected or is missing where required.
    #[error("Authentication error: {0}")]
    AuthenticationError(String),

    /// WebSocket-level failure (handshake, send, frame decode).
    #[error("WebSocket error: {0}")]
    WebSocketError(String),

    /// Failure on the polling fallback transport.
    #[error("Transport error: {0}")]
    TransportError(String),

    /// An operation did not complete within its configured timeout.
    #[error("Timeout: {0}")]
    TimeoutError(String),

    /// The server answered with a non-success HTTP status.
    #[error("Server error ({status_code}): {message}")]
    ServerError { status_code: u16, message: String },

    /// An upload request failed. Recorded on the affected queue item.
    #[error("Upload failed: {0}")]
    UploadError(String),

    /// A document content fetch failed. The failed entry is never cached;
    /// every caller coalesced onto the same fetch observes this error.
    #[error("Content fetch failed: {0}")]
    CacheFetchError(String),

    /// Transport-level HTTP error from reqwest.
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// JSON (de)serialization failure.
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// Invariant violation inside the library.
    #[error("Internal error: {0}")]
    InternalError(String),
}
