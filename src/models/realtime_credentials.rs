use serde::{Deserialize, Serialize};

/// Authentication credentials carried in the realtime handshake.
///
/// # JSON Wire Format
///
/// ```json
/// {"type": "authenticate", "method": "basic", "username": "alice", "password": "secret"}
/// {"type": "authenticate", "method": "jwt", "token": "eyJhbGciOiJIUzI1NiIs..."}
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum RealtimeCredentials {
    /// Username and password authentication.
    Basic { username: String, password: String },
    /// JWT token authentication.
    Jwt { token: String },
}
