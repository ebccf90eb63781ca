//! CRLF line framing over an async byte source.

use bytes::{Bytes, BytesMut};
use firehose_types::{Deadline, FirehoseError};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tracing::trace;

/// Line terminator used by the stream.
pub const CRLF: &[u8] = b"\r\n";

/// Longest line accepted before the connection counts as broken.
pub const MAX_LINE_LEN: usize = 1024 * 1024;

const READ_CHUNK: usize = 8 * 1024;

/// Frames `\r\n`-terminated lines out of a byte source.
///
/// Bytes of an incomplete trailing line are kept between calls, so lines
/// split across reads are re-assembled without dropping or duplicating
/// anything.
#[derive(Debug)]
pub struct LineReader<R> {
    inner: R,
    pending: BytesMut,
    scanned: usize,
    idle_timeout: Duration,
    max_line_len: usize,
}

impl<R: AsyncRead + Unpin> LineReader<R> {
    /// Creates a reader that waits at most `idle_timeout` for new bytes.
    pub fn new(inner: R, idle_timeout: Duration) -> Self {
        Self {
            inner,
            pending: BytesMut::with_capacity(READ_CHUNK),
            scanned: 0,
            idle_timeout,
            max_line_len: MAX_LINE_LEN,
        }
    }

    /// Sets the longest accepted line, terminator included.
    #[must_use]
    pub const fn with_max_line_len(mut self, max_line_len: usize) -> Self {
        self.max_line_len = max_line_len;
        self
    }

    /// Returns the buffered bytes of the incomplete trailing line.
    #[must_use]
    pub fn pending(&self) -> &[u8] {
        &self.pending
    }

    /// Returns the next complete line, terminator included.
    ///
    /// Each wait for more bytes is bounded by the lesser of the idle timeout
    /// and the time left before `deadline`.
    ///
    /// # Errors
    ///
    /// - [`FirehoseError::DeadlineExceeded`] if the deadline is reached before
    ///   or during a wait
    /// - [`FirehoseError::SocketEof`] if the peer closed the stream
    /// - [`FirehoseError::SocketTimeout`] if no bytes arrived within the idle timeout
    /// - [`FirehoseError::Socket`] if the read itself failed or the line grew
    ///   past the maximum length
    pub async fn read_line(&mut self, deadline: &Deadline) -> Result<Bytes, FirehoseError> {
        loop {
            if let Some(line) = self.take_line() {
                trace!(line = %String::from_utf8_lossy(&line).trim_end(), "framed line");
                return Ok(line);
            }

            if self.pending.len() >= self.max_line_len {
                return Err(FirehoseError::Socket(format!(
                    "line exceeds {} bytes",
                    self.max_line_len
                )));
            }

            let wait = deadline.remaining(self.idle_timeout)?;
            self.pending.reserve(READ_CHUNK);
            match tokio::time::timeout(wait, self.inner.read_buf(&mut self.pending)).await {
                Err(_) if wait < self.idle_timeout => return Err(FirehoseError::DeadlineExceeded),
                Err(_) => return Err(FirehoseError::SocketTimeout),
                Ok(Ok(0)) => return Err(FirehoseError::SocketEof),
                Ok(Ok(_)) => {}
                Ok(Err(e)) => return Err(FirehoseError::Socket(e.to_string())),
            }
        }
    }

    /// Splits the first complete line off the buffer.
    ///
    /// Bytes already searched are not searched again, except the last one,
    /// which may be the `\r` of a terminator split across reads.
    fn take_line(&mut self) -> Option<Bytes> {
        let from = self.scanned.saturating_sub(CRLF.len() - 1);
        let Some(offset) = self.pending[from..]
            .windows(CRLF.len())
            .position(|window| window == CRLF)
        else {
            self.scanned = self.pending.len();
            return None;
        };
        self.scanned = 0;
        Some(self.pending.split_to(from + offset + CRLF.len()).freeze())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeDelta, Utc};
    use std::io;
    use tokio::io::AsyncWriteExt;
    use tokio_test::io::Builder;

    const IDLE: Duration = Duration::from_secs(90);

    #[tokio::test]
    async fn test_reassembles_fragments() {
        let mock = Builder::new()
            .read(b"{\"text\":")
            .read(b"\"hel")
            .read(b"lo\"}\r")
            .read(b"\n")
            .build();
        let mut reader = LineReader::new(mock, IDLE);

        let line = reader.read_line(&Deadline::none()).await.unwrap();
        assert_eq!(&line[..], b"{\"text\":\"hello\"}\r\n");
        assert!(reader.pending().is_empty());
        assert_eq!(
            reader.read_line(&Deadline::none()).await,
            Err(FirehoseError::SocketEof)
        );
    }

    #[tokio::test]
    async fn test_multiple_lines_in_one_read() {
        let mock = Builder::new().read(b"\r\n{\"a\":1}\r\n{\"b\"").read(b":2}\r\n").build();
        let mut reader = LineReader::new(mock, IDLE);

        assert_eq!(&reader.read_line(&Deadline::none()).await.unwrap()[..], b"\r\n");
        assert_eq!(&reader.read_line(&Deadline::none()).await.unwrap()[..], b"{\"a\":1}\r\n");
        assert_eq!(reader.pending(), b"{\"b\"");
        assert_eq!(&reader.read_line(&Deadline::none()).await.unwrap()[..], b"{\"b\":2}\r\n");
    }

    #[tokio::test]
    async fn test_bare_newline_does_not_end_line() {
        let mock = Builder::new().read(b"one\ntwo\r\n").build();
        let mut reader = LineReader::new(mock, IDLE);
        assert_eq!(&reader.read_line(&Deadline::none()).await.unwrap()[..], b"one\ntwo\r\n");
    }

    #[tokio::test]
    async fn test_eof_keeps_partial_line() {
        let mock = Builder::new().read(b"partial").build();
        let mut reader = LineReader::new(mock, IDLE);
        assert_eq!(
            reader.read_line(&Deadline::none()).await,
            Err(FirehoseError::SocketEof)
        );
        assert_eq!(reader.pending(), b"partial");
    }

    #[tokio::test]
    async fn test_read_error_is_socket_error() {
        let mock = Builder::new()
            .read_error(io::Error::new(io::ErrorKind::ConnectionReset, "reset by peer"))
            .build();
        let mut reader = LineReader::new(mock, IDLE);
        assert_eq!(
            reader.read_line(&Deadline::none()).await,
            Err(FirehoseError::Socket("reset by peer".into()))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_peer_times_out() {
        let (client, mut server) = tokio::io::duplex(64);
        server.write_all(b"no terminator").await.unwrap();
        let mut reader = LineReader::new(client, Duration::from_secs(5));

        let start = tokio::time::Instant::now();
        assert_eq!(
            reader.read_line(&Deadline::none()).await,
            Err(FirehoseError::SocketTimeout)
        );
        assert!(start.elapsed() >= Duration::from_secs(5));
        assert_eq!(reader.pending(), b"no terminator");
        drop(server);
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_cut_wait_is_deadline_exceeded() {
        let (client, _server) = tokio::io::duplex(64);
        let mut reader = LineReader::new(client, IDLE);
        let deadline = Deadline::after(Duration::from_secs(5));

        let start = tokio::time::Instant::now();
        assert_eq!(
            reader.read_line(&deadline).await,
            Err(FirehoseError::DeadlineExceeded)
        );
        assert!(start.elapsed() < IDLE);
    }

    #[tokio::test]
    async fn test_overlong_line_is_socket_error() {
        let mock = Builder::new().read(b"0123456789").read(b"0123456789").build();
        let mut reader = LineReader::new(mock, IDLE).with_max_line_len(16);
        assert_eq!(
            reader.read_line(&Deadline::none()).await,
            Err(FirehoseError::Socket("line exceeds 16 bytes".into()))
        );
    }

    #[tokio::test]
    async fn test_terminator_split_after_long_prefix() {
        let mock = Builder::new()
            .read(b"aaaaaaaa")
            .read(b"bbbbbbbb\r")
            .read(b"\nnext\r\n")
            .build();
        let mut reader = LineReader::new(mock, IDLE);
        assert_eq!(
            &reader.read_line(&Deadline::none()).await.unwrap()[..],
            b"aaaaaaaabbbbbbbb\r\n"
        );
        assert_eq!(&reader.read_line(&Deadline::none()).await.unwrap()[..], b"next\r\n");
    }

    #[tokio::test]
    async fn test_reached_deadline_stops_before_waiting() {
        let (client, _server) = tokio::io::duplex(64);
        let mut reader = LineReader::new(client, IDLE);
        let deadline = Deadline::at(Utc::now() - TimeDelta::seconds(1));
        assert_eq!(
            reader.read_line(&deadline).await,
            Err(FirehoseError::DeadlineExceeded)
        );
    }

    #[tokio::test]
    async fn test_buffered_line_returned_even_past_deadline() {
        let mock = Builder::new().read(b"a\r\nb\r\n").build();
        let mut reader = LineReader::new(mock, IDLE);
        reader.read_line(&Deadline::none()).await.unwrap();

        let deadline = Deadline::at(Utc::now() - TimeDelta::seconds(1));
        assert_eq!(&reader.read_line(&deadline).await.unwrap()[..], b"b\r\n");
    }
}
