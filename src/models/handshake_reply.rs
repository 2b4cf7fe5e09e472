use serde::{Deserialize, Serialize};

/// Server replies during the realtime auth handshake.
///
/// These are the only inbound messages that do not use the
/// [`ServerEvent`](super::server_event::ServerEvent) envelope; they appear
/// exclusively between stream establishment and the first event.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HandshakeReply {
    /// Authentication accepted.
    AuthSuccess {
        /// Authenticated user id, when the server reports one.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        user_id: Option<String>,
    },
    /// Authentication rejected.
    AuthError {
        /// Human-readable rejection reason.
        message: String,
    },
}
