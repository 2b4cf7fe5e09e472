//! Timeout configuration for Paper client operations.
//!
//! Centralized timeout management for HTTP requests, realtime transport
//! establishment, and the connectivity probe.

use std::time::Duration;

/// Timeout configuration for Paper client operations.
///
/// # Examples
///
/// ```rust
/// use paper_link::PaperLinkTimeouts;
/// use std::time::Duration;
///
/// // Use defaults (recommended for most cases)
/// let timeouts = PaperLinkTimeouts::default();
///
/// // Custom timeouts for high-latency environments
/// let timeouts = PaperLinkTimeouts::builder()
///     .connection_timeout(Duration::from_secs(60))
///     .receive_timeout(Duration::from_secs(120))
///     .build();
///
/// // Aggressive timeouts for local development
/// let timeouts = PaperLinkTimeouts::fast();
/// ```
#[derive(Debug, Clone)]
pub struct PaperLinkTimeouts {
    /// Timeout for establishing connections (TCP + TLS + WebSocket
    /// handshake). Default: 10 seconds.
    pub connection_timeout: Duration,

    /// Timeout for receiving data after an HTTP request is sent.
    /// Default: 30 seconds.
    pub receive_timeout: Duration,

    /// Timeout for authentication handshake on the realtime connection.
    /// Default: 5 seconds.
    pub auth_timeout: Duration,

    /// Maximum wait for the acknowledgement of a connectivity probe.
    /// Default: 5 seconds.
    pub probe_timeout: Duration,

    /// Keep-alive ping interval for the WebSocket transport.
    /// Set to 0 to disable keep-alive pings. Default: 10 seconds.
    pub keepalive_interval: Duration,

    /// Maximum time to wait for a Pong (or any frame) after sending a
    /// keepalive Ping before treating the connection as dead.
    /// Set to 0 to disable. Default: 5 seconds.
    pub pong_timeout: Duration,

    /// How long the server may hold one long-poll request before answering
    /// with an empty event batch. Default: 25 seconds.
    pub poll_wait: Duration,
}

impl Default for PaperLinkTimeouts {
    fn default() -> Self {
        Self {
            connection_timeout: Duration::from_secs(10),
            receive_timeout: Duration::from_secs(30),
            auth_timeout: Duration::from_secs(5),
            probe_timeout: Duration::from_secs(5),
            keepalive_interval: Duration::from_secs(10),
            pong_timeout: Duration::from_secs(5),
            poll_wait: Duration::from_secs(25),
        }
    }
}

impl PaperLinkTimeouts {
    /// Create a new builder for custom timeout configuration.
    pub fn builder() -> PaperLinkTimeoutsBuilder {
        PaperLinkTimeoutsBuilder::new()
    }

    /// Create timeouts optimized for fast local development.
    pub fn fast() -> Self {
        Self {
            connection_timeout: Duration::from_secs(2),
            receive_timeout: Duration::from_secs(5),
            auth_timeout: Duration::from_secs(2),
            probe_timeout: Duration::from_secs(2),
            keepalive_interval: Duration::from_secs(15),
            pong_timeout: Duration::from_secs(5),
            poll_wait: Duration::from_secs(5),
        }
    }

    /// Create timeouts optimized for high-latency or unreliable networks.
    pub fn relaxed() -> Self {
        Self {
            connection_timeout: Duration::from_secs(30),
            receive_timeout: Duration::from_secs(120),
            auth_timeout: Duration::from_secs(15),
            probe_timeout: Duration::from_secs(15),
            keepalive_interval: Duration::from_secs(30),
            pong_timeout: Duration::from_secs(10),
            poll_wait: Duration::from_secs(55),
        }
    }

    /// Check if a duration represents "no timeout" (zero or very large).
    pub fn is_no_timeout(duration: Duration) -> bool {
        duration.is_zero() || duration > Duration::from_secs(86400 * 365)
    }
}

/// Builder for creating custom [`PaperLinkTimeouts`] configurations.
#[derive(Debug, Clone)]
pub struct PaperLinkTimeoutsBuilder {
    timeouts: PaperLinkTimeouts,
}

impl PaperLinkTimeoutsBuilder {
    fn new() -> Self {
        Self {
            timeouts: PaperLinkTimeouts::default(),
        }
    }

    /// Set the connection timeout (TCP + TLS + handshake).
    pub fn connection_timeout(mut self, timeout: Duration) -> Self {
        self.timeouts.connection_timeout = timeout;
        self
    }

    /// Set the receive timeout (waiting for data after a request).
    pub fn receive_timeout(mut self, timeout: Duration) -> Self {
        self.timeouts.receive_timeout = timeout;
        self
    }

    /// Set the authentication handshake timeout.
    pub fn auth_timeout(mut self, timeout: Duration) -> Self {
        self.timeouts.auth_timeout = timeout;
        self
    }

    /// Set the connectivity probe acknowledgement timeout.
    pub fn probe_timeout(mut self, timeout: Duration) -> Self {
        self.timeouts.probe_timeout = timeout;
        self
    }

    /// Set the keepalive ping interval. Set to 0 to disable pings.
    pub fn keepalive_interval(mut self, interval: Duration) -> Self {
        self.timeouts.keepalive_interval = interval;
        self
    }

    /// Set the pong timeout (max wait for a frame after a keepalive Ping).
    /// Set to 0 to disable pong timeout checking.
    pub fn pong_timeout(mut self, timeout: Duration) -> Self {
        self.timeouts.pong_timeout = timeout;
        self
    }

    /// Set the long-poll hold window for the polling transport.
    pub fn poll_wait(mut self, wait: Duration) -> Self {
        self.timeouts.poll_wait = wait;
        self
    }

    /// Build the timeout configuration.
    pub fn build(self) -> PaperLinkTimeouts {
        self.timeouts
    }
}
