//! Error types for firehose.

use thiserror::Error;

/// Result type alias for firehose operations.
pub type Result<T> = std::result::Result<T, FirehoseError>;

/// Numeric error codes carried by [`FirehoseError`].
///
/// HTTP failures carry the response status instead of a code from this list,
/// except when the status line cannot be parsed ([`codes::HTTP_ERROR`]).
pub mod codes {
    /// Generic transport (dial) failure.
    pub const TCP_ERROR: i32 = 111;
    /// The only status accepted by the handshake.
    pub const HTTP_OK: u16 = 200;
    /// Unparseable or missing HTTP status.
    pub const HTTP_ERROR: u16 = 600;
    /// The readiness wait failed or the socket reported an I/O error.
    pub const SOCKET_ERROR: i32 = 1000;
    /// No bytes arrived within the idle timeout.
    pub const SOCKET_TIMEOUT: i32 = 1010;
    /// The peer closed the stream.
    pub const SOCKET_EOF: i32 = 1020;
    /// A backoff class ran out of retries.
    pub const CONNECT_RETRY_MAX: i32 = 2010;
    /// Generic DNS failure.
    pub const DNS_ERROR: i32 = 3000;
    /// The host resolved to no addresses.
    pub const DNS_HOST_NOT_FOUND: i32 = 3010;
    /// The session deadline was reached.
    pub const OUT_OF_TIME: i32 = 4000;
    /// The record limit was reached.
    pub const OUT_OF_RECORDS: i32 = 5000;
    /// The session could not be configured.
    pub const CONFIG_ERROR: i32 = 6000;
}

/// Every failure the client can report.
///
/// The variants are the classification the backoff controller works from,
/// so a failure keeps its code and message unchanged on its way through the
/// retry layer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FirehoseError {
    /// The session was configured with unusable values.
    #[error("configuration error: {0}")]
    Config(String),

    /// Host name resolution failed.
    #[error("DNS error ({code}): {message}")]
    Dns {
        /// Error code.
        code: i32,
        /// Error message.
        message: String,
    },

    /// The transport connection could not be opened.
    #[error("TCP error ({code}): {message}")]
    Tcp {
        /// Error code (OS errno when available).
        code: i32,
        /// Error message.
        message: String,
    },

    /// The server answered the request with something other than success.
    #[error("HTTP error ({status}): {message}")]
    Http {
        /// Response status, or [`codes::HTTP_ERROR`] when unparseable.
        status: u16,
        /// Reason phrase from the status line.
        message: String,
    },

    /// The peer closed the connection.
    #[error("remote server disconnected (EOF)")]
    SocketEof,

    /// No complete line arrived before the idle timeout expired.
    #[error("connection timed out")]
    SocketTimeout,

    /// Reading from or writing to the socket failed.
    #[error("connection error: {0}")]
    Socket(String),

    /// The session deadline has been reached.
    #[error("maximum execution time reached")]
    DeadlineExceeded,

    /// A backoff class exceeded its retry ceiling.
    #[error("maximum retry limit reached ({code}): {message}")]
    RetryExhausted {
        /// Code of the last underlying failure.
        code: i32,
        /// Message of the last underlying failure.
        message: String,
    },
}

impl FirehoseError {
    /// Returns the numeric code of this failure.
    #[must_use]
    pub fn code(&self) -> i32 {
        match self {
            Self::Config(_) => codes::CONFIG_ERROR,
            Self::Dns { code, .. } | Self::Tcp { code, .. } | Self::RetryExhausted { code, .. } => {
                *code
            }
            Self::Http { status, .. } => i32::from(*status),
            Self::SocketEof => codes::SOCKET_EOF,
            Self::SocketTimeout => codes::SOCKET_TIMEOUT,
            Self::Socket(_) => codes::SOCKET_ERROR,
            Self::DeadlineExceeded => codes::OUT_OF_TIME,
        }
    }

    /// Returns the human-readable message of this failure, without the code.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Config(message)
            | Self::Dns { message, .. }
            | Self::Tcp { message, .. }
            | Self::Http { message, .. }
            | Self::Socket(message)
            | Self::RetryExhausted { message, .. } => message.clone(),
            Self::SocketEof | Self::SocketTimeout | Self::DeadlineExceeded => self.to_string(),
        }
    }

    /// Creates the error for a host that resolved to nothing.
    #[must_use]
    pub fn host_not_found() -> Self {
        Self::Dns {
            code: codes::DNS_HOST_NOT_FOUND,
            message: "host not found".to_string(),
        }
    }

    /// Creates a transport error from an I/O error, keeping the OS errno.
    #[must_use]
    pub fn tcp(error: &std::io::Error) -> Self {
        Self::Tcp {
            code: error.raw_os_error().unwrap_or(codes::TCP_ERROR),
            message: error.to_string(),
        }
    }

    /// Returns true if this is the deadline condition.
    #[must_use]
    pub const fn is_deadline(&self) -> bool {
        matches!(self, Self::DeadlineExceeded)
    }

    /// Returns true if this failure came from reading an established stream.
    #[must_use]
    pub const fn is_stream(&self) -> bool {
        matches!(self, Self::SocketEof | Self::SocketTimeout | Self::Socket(_))
    }
}

/// The session deadline has already passed.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("maximum execution time reached")]
pub struct DeadlineExceeded;

impl From<DeadlineExceeded> for FirehoseError {
    fn from(_: DeadlineExceeded) -> Self {
        Self::DeadlineExceeded
    }
}
