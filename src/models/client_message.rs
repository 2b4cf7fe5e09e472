use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use super::realtime_credentials::RealtimeCredentials;

/// Client-to-server realtime messages.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Authenticate the realtime connection.
    ///
    /// Sent immediately after the stream is established, before any other
    /// traffic. The server answers with an auth handshake reply.
    Authenticate {
        /// Credentials attached at connect time.
        #[serde(flatten)]
        credentials: RealtimeCredentials,
    },

    /// Application-level event emitted by the client.
    Event {
        /// Logical event name.
        event: String,
        /// Event payload.
        #[serde(default)]
        payload: JsonValue,
    },
}
