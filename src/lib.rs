//! # paper-link
//!
//! Client coordination library for the Paper document service.
//!
//! One persistent realtime connection is multiplexed across many
//! independent subscribers; an upload queue tracks each file through a
//! per-item state machine driven by job events from that connection; and a
//! content cache serves document bodies with TTL expiry and request
//! coalescing.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use paper_link::{EventKind, PaperLinkClient, UploadRequest};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = PaperLinkClient::builder()
//!     .base_url("http://localhost:3000")
//!     .jwt_token("eyJhbGc...")
//!     .build()?;
//!
//! // One realtime connection for the whole application.
//! client.connect(None).await?;
//!
//! // Subscribe to any server-pushed event by name.
//! let _sub = client.registry().on(EventKind::JobCompleted, |payload| {
//!     println!("job done: {payload}");
//! });
//!
//! // Enqueue uploads; items appear immediately as pending.
//! let ids = client.uploads().enqueue(vec![UploadRequest::new(
//!     "report.pdf",
//!     "application/pdf",
//!     std::fs::read("report.pdf")?,
//! )]);
//! println!("queued {ids:?}");
//!
//! // Cached, coalesced content reads.
//! let content = client.cache().get_content("doc-1").await?;
//! println!("{content}");
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod cache;
pub mod client;
pub mod connection;
pub mod documents;
pub mod error;
pub mod event_handlers;
pub mod models;
pub mod registry;
pub mod timeouts;
pub mod upload;

mod transport;

pub use auth::AuthProvider;
pub use cache::{ContentCache, DEFAULT_CONTENT_TTL};
pub use client::{PaperLinkClient, PaperLinkClientBuilder};
pub use connection::RealtimeConnection;
pub use documents::DocumentApi;
pub use error::{PaperLinkError, Result};
pub use event_handlers::{ConnectionFault, DisconnectReason, EventHandlers};
pub use models::{
    ClientMessage, ConnectionOptions, ConnectionState, EventKind, JobCompletedEvent,
    JobFailedEvent, JobProgressEvent, RealtimeCredentials, ServerEvent, TransportKind, UploadItem,
    UploadRequest, UploadResponse, UploadStatus,
};
pub use registry::{EventCallback, EventRegistry, Subscription};
pub use timeouts::{PaperLinkTimeouts, PaperLinkTimeoutsBuilder};
pub use upload::{UploadQueue, DEFAULT_UPLOAD_STAGGER};
