//! Stream client configuration.

use firehose_backoff::BackoffPolicies;
use std::time::Duration;

/// Default streaming endpoint.
pub const DEFAULT_ENDPOINT: &str = "/1.1/statuses/sample.json";

/// Transport security for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Security {
    /// Plain TCP.
    Plain,
    /// TLS over TCP.
    Tls,
}

impl Security {
    /// TLS on port 443, plain TCP everywhere else.
    #[must_use]
    pub const fn for_port(port: u16) -> Self {
        if port == 443 { Self::Tls } else { Self::Plain }
    }
}

/// Configuration for the stream client.
#[derive(Debug, Clone)]
pub struct StreamConfig {
    /// Request path of the streaming endpoint.
    pub endpoint: String,
    /// Time allowed for resolving, dialing and sending the request.
    pub connect_timeout: Duration,
    /// Time allowed between bytes before the connection counts as stalled.
    pub idle_timeout: Duration,
    /// User agent string.
    pub user_agent: String,
    /// Transport security; chosen from the port when `None`.
    pub security: Option<Security>,
    /// Backoff policy table used between reconnect attempts.
    pub backoff: BackoffPolicies,
}

impl StreamConfig {
    /// Returns the security to use against `port`.
    #[must_use]
    pub fn security_for(&self, port: u16) -> Security {
        self.security.unwrap_or_else(|| Security::for_port(port))
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            connect_timeout: Duration::from_secs(30),
            idle_timeout: Duration::from_secs(90),
            user_agent: format!("firehose/{}", env!("CARGO_PKG_VERSION")),
            security: None,
            backoff: BackoffPolicies::default(),
        }
    }
}
