//! Handshake request construction and status line parsing.

use firehose_types::{FirehoseError, codes};
use std::borrow::Cow;
use std::net::IpAddr;

/// Builds the `GET` request sent when a connection is opened.
///
/// # Example
///
/// ```
/// use firehose_stream::request::request_text;
///
/// let request = request_text("/1.1/statuses/sample.json", "stream.twitter.com", "dTpw", "firehose/0.1.0");
/// assert!(request.starts_with("GET /1.1/statuses/sample.json HTTP/1.1\r\n"));
/// assert!(request.contains("Authorization: Basic dTpw\r\n"));
/// assert!(request.ends_with("\r\n\r\n"));
/// ```
#[must_use]
pub fn request_text(path: &str, host: &str, basic_token: &str, user_agent: &str) -> String {
    format!(
        "GET {path} HTTP/1.1\r\n\
         Host: {host}\r\n\
         Authorization: Basic {basic_token}\r\n\
         User-Agent: {user_agent}\r\n\
         \r\n"
    )
}

/// Checks a response status line for success.
///
/// The trimmed line is split on whitespace into at most three fields; the
/// second must be `200`.
///
/// # Errors
///
/// Returns [`FirehoseError::Http`] carrying the reported status (or
/// [`codes::HTTP_ERROR`] when it is missing or not a number) and the reason
/// phrase (or `HTTP error`).
pub fn check_status_line(line: &str) -> Result<(), FirehoseError> {
    let line = line.trim();
    let (_version, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let rest = rest.trim_start();
    let (status, reason) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));
    let reason = reason.trim_start();

    let parsed = status.parse::<u16>().ok();
    if parsed == Some(codes::HTTP_OK) {
        return Ok(());
    }

    Err(FirehoseError::Http {
        status: parsed.unwrap_or(codes::HTTP_ERROR),
        message: if reason.is_empty() { "HTTP error" } else { reason }.to_string(),
    })
}

/// Returns the name to resolve for `host`.
///
/// Multi-label names get a trailing dot so the resolver does not expand them
/// with local search domains. IP literals and single-label names are
/// returned unchanged.
#[must_use]
pub fn fully_qualified(host: &str) -> Cow<'_, str> {
    if host.parse::<IpAddr>().is_ok() || host.ends_with('.') || !host.contains('.') {
        Cow::Borrowed(host)
    } else {
        Cow::Owned(format!("{host}."))
    }
}
