//! Main Paper client with builder pattern.
//!
//! The composition point for the coordination layer: one event registry,
//! one realtime connection, one upload queue, and one content cache per
//! client instance. Consumers share the client (it is cheap to clone) so
//! "one logical connection" holds at the application level while tests can
//! construct fresh, fully isolated instances.

use std::sync::Arc;
use std::time::Duration;

use crate::{
    auth::AuthProvider,
    cache::{ContentCache, DEFAULT_CONTENT_TTL},
    connection::RealtimeConnection,
    documents::DocumentApi,
    error::{PaperLinkError, Result},
    event_handlers::EventHandlers,
    models::{ConnectionOptions, ConnectionState},
    registry::EventRegistry,
    timeouts::PaperLinkTimeouts,
    upload::{UploadQueue, DEFAULT_UPLOAD_STAGGER},
};

/// Main Paper client.
///
/// Use [`PaperLinkClientBuilder`] to construct instances with custom
/// configuration.
///
/// # Examples
///
/// ```rust,no_run
/// use paper_link::PaperLinkClient;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = PaperLinkClient::builder()
///     .base_url("http://localhost:3000")
///     .jwt_token("eyJhbGc...")
///     .build()?;
///
/// client.connect(None).await?;
/// let content = client.cache().get_content("doc-1").await?;
/// println!("{content}");
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct PaperLinkClient {
    base_url: String,
    registry: EventRegistry,
    connection: Arc<RealtimeConnection>,
    documents: DocumentApi,
    uploads: Arc<UploadQueue>,
    cache: Arc<ContentCache>,
    timeouts: PaperLinkTimeouts,
}

impl PaperLinkClient {
    /// Create a new builder for configuring the client.
    pub fn builder() -> PaperLinkClientBuilder {
        PaperLinkClientBuilder::new()
    }

    /// The configured base URL.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The event registry multiplexing realtime events.
    pub fn registry(&self) -> &EventRegistry {
        &self.registry
    }

    /// The realtime connection manager.
    pub fn connection(&self) -> &RealtimeConnection {
        &self.connection
    }

    /// The document HTTP operations.
    pub fn documents(&self) -> &DocumentApi {
        &self.documents
    }

    /// The upload queue controller.
    pub fn uploads(&self) -> &UploadQueue {
        &self.uploads
    }

    /// The document content cache.
    pub fn cache(&self) -> &ContentCache {
        &self.cache
    }

    /// The configured timeouts.
    pub fn timeouts(&self) -> &PaperLinkTimeouts {
        &self.timeouts
    }

    /// Open the realtime connection. See
    /// [`RealtimeConnection::connect`].
    pub async fn connect(&self, credential: Option<AuthProvider>) -> Result<()> {
        self.connection.connect(credential).await
    }

    /// Close the realtime connection. See
    /// [`RealtimeConnection::disconnect`].
    pub async fn disconnect(&self) {
        self.connection.disconnect().await
    }

    /// Current connection lifecycle state.
    pub fn connection_state(&self) -> ConnectionState {
        self.connection.state()
    }

    /// Whether the realtime connection is up.
    pub fn is_connected(&self) -> bool {
        self.connection.is_connected()
    }

    /// Round-trip connectivity probe. See
    /// [`RealtimeConnection::test_connection`].
    pub async fn test_connection(&self) -> bool {
        self.connection.test_connection().await
    }
}

/// Builder for configuring [`PaperLinkClient`] instances.
pub struct PaperLinkClientBuilder {
    base_url: Option<String>,
    timeout: Duration,
    auth: AuthProvider,
    timeouts: PaperLinkTimeouts,
    connection_options: ConnectionOptions,
    event_handlers: EventHandlers,
    content_ttl: Duration,
    upload_stagger: Duration,
}

impl PaperLinkClientBuilder {
    fn new() -> Self {
        Self {
            base_url: None,
            timeout: Duration::from_secs(30),
            auth: AuthProvider::none(),
            timeouts: PaperLinkTimeouts::default(),
            connection_options: ConnectionOptions::default(),
            event_handlers: EventHandlers::default(),
            content_ttl: DEFAULT_CONTENT_TTL,
            upload_stagger: DEFAULT_UPLOAD_STAGGER,
        }
    }

    /// Set the base URL for the Paper server.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the request timeout for HTTP requests.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set JWT token authentication.
    pub fn jwt_token(mut self, token: impl Into<String>) -> Self {
        self.auth = AuthProvider::jwt_token(token.into());
        self
    }

    /// Set the authentication provider directly.
    ///
    /// Allows setting any [`AuthProvider`] variant including Basic Auth.
    pub fn auth(mut self, auth: AuthProvider) -> Self {
        self.auth = auth;
        self
    }

    /// Set comprehensive timeout configuration for all operations.
    ///
    /// This overrides the individual `timeout()` setting.
    pub fn timeouts(mut self, timeouts: PaperLinkTimeouts) -> Self {
        self.timeout = timeouts.receive_timeout;
        self.timeouts = timeouts;
        self
    }

    /// Set connection options (transport preference, reconnect behavior).
    pub fn connection_options(mut self, options: ConnectionOptions) -> Self {
        self.connection_options = options;
        self
    }

    /// Set low-level connection diagnostics hooks.
    pub fn event_handlers(mut self, handlers: EventHandlers) -> Self {
        self.event_handlers = handlers;
        self
    }

    /// Set the content cache validity window. Default: 5 minutes.
    pub fn content_ttl(mut self, ttl: Duration) -> Self {
        self.content_ttl = ttl;
        self
    }

    /// Set the pause between successive upload starts. Default: 250 ms.
    pub fn upload_stagger(mut self, stagger: Duration) -> Self {
        self.upload_stagger = stagger;
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<PaperLinkClient> {
        let base_url = self
            .base_url
            .ok_or_else(|| PaperLinkError::ConfigurationError("base_url is required".into()))?;
        let base_url = base_url.trim_end_matches('/').to_string();

        // Keep-alive pooling cuts TCP handshake overhead for the bursty
        // request patterns of upload batches and cache preloads.
        let http_client = reqwest::Client::builder()
            .timeout(self.timeout)
            .connect_timeout(self.timeouts.connection_timeout)
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|e| PaperLinkError::ConfigurationError(e.to_string()))?;

        let documents = DocumentApi::new(base_url.clone(), http_client.clone(), self.auth.clone());
        let registry = EventRegistry::new();
        let connection = Arc::new(RealtimeConnection::new(
            base_url.clone(),
            http_client,
            self.auth,
            self.timeouts.clone(),
            self.connection_options,
            registry.clone(),
            self.event_handlers,
        ));
        let uploads = Arc::new(UploadQueue::new(
            documents.clone(),
            &registry,
            self.upload_stagger,
        ));
        let cache = Arc::new(ContentCache::new(documents.clone(), self.content_ttl));

        Ok(PaperLinkClient {
            base_url,
            registry,
            connection,
            documents,
            uploads,
            cache,
            timeouts: self.timeouts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_pattern() {
        let result = PaperLinkClient::builder()
            .base_url("http://localhost:3000")
            .timeout(Duration::from_secs(10))
            .jwt_token("test_token")
            .build();

        assert!(result.is_ok());
    }

    #[test]
    fn test_builder_missing_url() {
        let result = PaperLinkClient::builder().build();
        assert!(result.is_err());
    }

    #[test]
    fn test_builder_strips_trailing_slash() {
        let client = PaperLinkClient::builder()
            .base_url("http://localhost:3000/")
            .build()
            .expect("valid configuration");
        assert_eq!(client.base_url(), "http://localhost:3000");
    }
}
