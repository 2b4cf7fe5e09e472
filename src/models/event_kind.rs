use std::fmt;

/// The closed set of event names the client understands, plus a fallback
/// for anything else the server pushes.
///
/// Inbound envelopes are parsed into an `EventKind` once, at the transport
/// boundary; every other layer works with the typed kind. Unrecognized
/// names are carried verbatim in [`EventKind::Other`] so new server event
/// types flow through the registry without any transport-layer changes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// Connection established (transport up and authenticated).
    Connect,
    /// Connection closed, intentionally or not.
    Disconnect,
    /// Connection or protocol error.
    Error,
    /// Connection re-established after a drop.
    Reconnect,
    /// A reconnection attempt is starting.
    ReconnectAttempt,
    /// A reconnection attempt failed.
    ReconnectError,
    /// Reconnection gave up (attempt limit reached).
    ReconnectFailed,
    /// Server-side job progress update.
    JobProgress,
    /// Server-side job finished successfully.
    JobCompleted,
    /// Server-side job failed.
    JobFailed,
    /// Client-emitted connectivity probe.
    Ping,
    /// Server acknowledgement of a probe.
    Pong,
    /// Any event name not in the closed set, carried verbatim.
    Other(String),
}

impl EventKind {
    /// Parse a wire event name into a kind.
    pub fn parse(name: &str) -> Self {
        match name {
            "connect" => Self::Connect,
            "disconnect" => Self::Disconnect,
            "error" => Self::Error,
            "reconnect" => Self::Reconnect,
            "reconnect_attempt" => Self::ReconnectAttempt,
            "reconnect_error" => Self::ReconnectError,
            "reconnect_failed" => Self::ReconnectFailed,
            "job_progress" => Self::JobProgress,
            "job_completed" => Self::JobCompleted,
            "job_failed" => Self::JobFailed,
            "ping" => Self::Ping,
            "pong" => Self::Pong,
            other => Self::Other(other.to_string()),
        }
    }

    /// The wire name for this kind.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Connect => "connect",
            Self::Disconnect => "disconnect",
            Self::Error => "error",
            Self::Reconnect => "reconnect",
            Self::ReconnectAttempt => "reconnect_attempt",
            Self::ReconnectError => "reconnect_error",
            Self::ReconnectFailed => "reconnect_failed",
            Self::JobProgress => "job_progress",
            Self::JobCompleted => "job_completed",
            Self::JobFailed => "job_failed",
            Self::Ping => "ping",
            Self::Pong => "pong",
            Self::Other(name) => name,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for EventKind {
    fn from(name: &str) -> Self {
        Self::parse(name)
    }
}

impl From<String> for EventKind {
    fn from(name: String) -> Self {
        Self::parse(&name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_names_round_trip() {
        for name in [
            "connect",
            "disconnect",
            "error",
            "reconnect",
            "reconnect_attempt",
            "reconnect_error",
            "reconnect_failed",
            "job_progress",
            "job_completed",
            "job_failed",
            "ping",
            "pong",
        ] {
            let kind = EventKind::parse(name);
            assert!(!matches!(kind, EventKind::Other(_)), "{} should be known", name);
            assert_eq!(kind.as_str(), name);
        }
    }

    #[test]
    fn test_unknown_name_falls_through_verbatim() {
        let kind = EventKind::parse("document_updated");
        assert_eq!(kind, EventKind::Other("document_updated".to_string()));
        assert_eq!(kind.as_str(), "document_updated");
    }
}
