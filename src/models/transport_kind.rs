use serde::{Deserialize, Serialize};

/// Realtime transport flavors, in the order the client should prefer them.
///
/// The default preference is a persistent WebSocket stream with an HTTP
/// long-polling fallback for networks that block upgrades.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportKind {
    /// Persistent bidirectional WebSocket stream.
    WebSocket,
    /// HTTP long-polling fallback.
    Polling,
}

impl TransportKind {
    /// Stable name used in diagnostics and the `connect` event payload.
    pub fn name(&self) -> &'static str {
        match self {
            Self::WebSocket => "websocket",
            Self::Polling => "polling",
        }
    }
}
