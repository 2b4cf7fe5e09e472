//! Authentication provider for the Paper client.
//!
//! Attaches the appropriate Authorization header to HTTP requests and
//! converts into the credential payload sent during the realtime handshake.

use base64::{engine::general_purpose, Engine as _};

use crate::error::Result;
use crate::models::RealtimeCredentials;

/// Authentication credentials for the Paper service.
///
/// # Examples
///
/// ```rust
/// use paper_link::AuthProvider;
///
/// // HTTP Basic Auth
/// let auth = AuthProvider::basic_auth("alice".to_string(), "secret".to_string());
///
/// // JWT token authentication
/// let auth = AuthProvider::jwt_token("eyJhbGc...".to_string());
///
/// // No authentication (localhost bypass mode)
/// let auth = AuthProvider::none();
/// ```
#[derive(Debug, Clone)]
pub enum AuthProvider {
    /// HTTP Basic Auth (username, password).
    BasicAuth(String, String),

    /// JWT token authentication.
    JwtToken(String),

    /// No authentication (localhost bypass).
    None,
}

impl AuthProvider {
    /// Create HTTP Basic Auth credentials.
    ///
    /// Encodes username:password as base64 for the `Authorization: Basic`
    /// header following RFC 7617.
    pub fn basic_auth(username: String, password: String) -> Self {
        Self::BasicAuth(username, password)
    }

    /// Create JWT token authentication.
    pub fn jwt_token(token: String) -> Self {
        Self::JwtToken(token)
    }

    /// No authentication (for localhost bypass mode).
    pub fn none() -> Self {
        Self::None
    }

    /// Attach authentication headers to an HTTP request builder.
    ///
    /// - BasicAuth: `Authorization: Basic <base64(username:password)>`
    /// - JwtToken: `Authorization: Bearer <token>`
    /// - None: no headers
    pub fn apply_to_request(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<reqwest::RequestBuilder> {
        match self {
            Self::BasicAuth(username, password) => {
                let credentials = format!("{}:{}", username, password);
                let encoded = general_purpose::STANDARD.encode(credentials.as_bytes());
                Ok(request.header("Authorization", format!("Basic {}", encoded)))
            },
            Self::JwtToken(token) => Ok(request.bearer_auth(token)),
            Self::None => Ok(request),
        }
    }

    /// Credential payload for the realtime auth handshake.
    ///
    /// Returns `None` for [`AuthProvider::None`]; the connection then skips
    /// the authenticate message and proceeds unauthenticated (the server
    /// decides whether to allow that).
    pub fn realtime_credentials(&self) -> Option<RealtimeCredentials> {
        match self {
            Self::BasicAuth(username, password) => Some(RealtimeCredentials::Basic {
                username: username.clone(),
                password: password.clone(),
            }),
            Self::JwtToken(token) => Some(RealtimeCredentials::Jwt {
                token: token.clone(),
            }),
            Self::None => None,
        }
    }

    /// Check if authentication is configured.
    pub fn is_authenticated(&self) -> bool {
        !matches!(self, Self::None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_provider_creation() {
        let basic = AuthProvider::basic_auth("alice".to_string(), "secret".to_string());
        assert!(basic.is_authenticated());

        let jwt = AuthProvider::jwt_token("test_token".to_string());
        assert!(jwt.is_authenticated());

        let none = AuthProvider::none();
        assert!(!none.is_authenticated());
    }

    #[test]
    fn test_realtime_credentials_conversion() {
        let jwt = AuthProvider::jwt_token("tok".to_string());
        assert_eq!(
            jwt.realtime_credentials(),
            Some(RealtimeCredentials::Jwt {
                token: "tok".to_string()
            })
        );

        let basic = AuthProvider::basic_auth("alice".to_string(), "secret".to_string());
        assert_eq!(
            basic.realtime_credentials(),
            Some(RealtimeCredentials::Basic {
                username: "alice".to_string(),
                password: "secret".to_string()
            })
        );

        assert!(AuthProvider::none().realtime_credentials().is_none());
    }

    #[test]
    fn test_basic_auth_base64_format() {
        let credentials = format!("{}:{}", "alice", "secret123");
        let encoded = general_purpose::STANDARD.encode(credentials.as_bytes());

        // base64 of "alice:secret123"
        assert_eq!(encoded, "YWxpY2U6c2VjcmV0MTIz");
    }
}
