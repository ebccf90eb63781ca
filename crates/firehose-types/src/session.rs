//! Session identity: credentials and the streaming host.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

use crate::FirehoseError;

/// Default streaming host.
pub const DEFAULT_HOST: &str = "stream.twitter.com";

/// Default streaming port.
pub const DEFAULT_PORT: u16 = 443;

/// Basic-auth credentials for the streaming endpoint.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    /// Creates credentials, rejecting an empty username or password.
    ///
    /// # Errors
    ///
    /// Returns [`FirehoseError::Config`] if either part is empty.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Result<Self, FirehoseError> {
        let username = username.into();
        let password = password.into();
        if username.is_empty() {
            return Err(FirehoseError::Config("missing username".to_string()));
        }
        if password.is_empty() {
            return Err(FirehoseError::Config("missing password".to_string()));
        }
        Ok(Self { username, password })
    }

    /// Returns the username.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Returns the base64 `username:password` token for a basic-auth header.
    #[must_use]
    pub fn basic_token(&self) -> String {
        STANDARD.encode(format!("{}:{}", self.username, self.password))
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Credentials plus the host and port they are used against.
///
/// Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    credentials: Credentials,
    host: String,
    port: u16,
}

impl Session {
    /// Creates a session for the given host and port.
    #[must_use]
    pub fn new(credentials: Credentials, host: impl Into<String>, port: u16) -> Self {
        Self {
            credentials,
            host: host.into(),
            port,
        }
    }

    /// Creates a session against the default host and port.
    #[must_use]
    pub fn with_defaults(credentials: Credentials) -> Self {
        Self::new(credentials, DEFAULT_HOST, DEFAULT_PORT)
    }

    /// Returns the credentials.
    #[must_use]
    pub const fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    /// Returns the host name.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns the port.
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_parts_rejected() {
        assert_eq!(
            Credentials::new("", "secret"),
            Err(FirehoseError::Config("missing username".into()))
        );
        assert_eq!(
            Credentials::new("alice", ""),
            Err(FirehoseError::Config("missing password".into()))
        );
    }

    #[test]
    fn test_basic_token() {
        let creds = Credentials::new("Aladdin", "open sesame").unwrap();
        assert_eq!(creds.basic_token(), "QWxhZGRpbjpvcGVuIHNlc2FtZQ==");
    }

    #[test]
    fn test_debug_redacts_password() {
        let creds = Credentials::new("alice", "hunter2").unwrap();
        let debug = format!("{creds:?}");
        assert!(debug.contains("alice"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn test_session_defaults() {
        let session = Session::with_defaults(Credentials::new("a", "b").unwrap());
        assert_eq!(session.host(), DEFAULT_HOST);
        assert_eq!(session.port(), 443);
        assert_eq!(session.credentials().username(), "a");
    }
}
