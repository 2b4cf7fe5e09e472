use serde::{Deserialize, Serialize};

use super::server_event::ServerEvent;

/// Response body of one long-poll request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollResponse {
    /// Cursor to pass on the next poll.
    pub cursor: u64,
    /// Events accumulated since the previous cursor; empty when the
    /// long-poll window elapsed without traffic.
    #[serde(default)]
    pub events: Vec<ServerEvent>,
}
