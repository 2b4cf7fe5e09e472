//! Data models for the paper-link client library.
//!
//! Defines the realtime wire envelopes, connection configuration, and the
//! upload/cache data types shared across modules.

pub mod client_message;
pub mod connection_options;
pub mod connection_state;
pub mod error_detail;
pub mod event_kind;
pub mod handshake_reply;
pub mod job_event;
pub mod poll_response;
pub mod realtime_credentials;
pub mod server_event;
pub mod transport_kind;
pub mod upload_item;
pub mod upload_request;
pub mod upload_response;

#[cfg(test)]
mod tests;

pub use client_message::ClientMessage;
pub use connection_options::ConnectionOptions;
pub use connection_state::ConnectionState;
pub use error_detail::ErrorDetail;
pub use event_kind::EventKind;
pub use handshake_reply::HandshakeReply;
pub use job_event::{JobCompletedEvent, JobFailedEvent, JobProgressEvent};
pub use poll_response::PollResponse;
pub use realtime_credentials::RealtimeCredentials;
pub use server_event::ServerEvent;
pub use transport_kind::TransportKind;
pub use upload_item::{UploadItem, UploadStatus};
pub use upload_request::UploadRequest;
pub use upload_response::UploadResponse;
