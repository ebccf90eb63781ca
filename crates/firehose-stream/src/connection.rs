//! Connection lifecycle: resolve, dial, handshake, header skip.

use bytes::Bytes;
use firehose_types::{Deadline, FirehoseError, Session, codes};
use rand::seq::SliceRandom;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::dialer::{BoxTransport, Dialer};
use crate::line_reader::LineReader;
use crate::request::{check_status_line, fully_qualified, request_text};
use crate::{Security, StreamConfig};

/// Owns the single live connection of a session.
pub struct ConnectionManager<D> {
    session: Session,
    dialer: D,
    security: Security,
    idle_timeout: Duration,
    user_agent: String,
    connection: Option<LineReader<BoxTransport>>,
}

impl<D> std::fmt::Debug for ConnectionManager<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionManager")
            .field("session", &self.session)
            .field("security", &self.security)
            .field("idle_timeout", &self.idle_timeout)
            .field("connected", &self.connection.is_some())
            .finish_non_exhaustive()
    }
}

impl<D: Dialer> ConnectionManager<D> {
    /// Creates a manager without connecting.
    pub fn new(session: Session, dialer: D, config: &StreamConfig) -> Self {
        Self {
            security: config.security_for(session.port()),
            session,
            dialer,
            idle_timeout: config.idle_timeout,
            user_agent: config.user_agent.clone(),
            connection: None,
        }
    }

    /// Returns the session this manager connects for.
    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }

    /// Returns the dialer.
    #[must_use]
    pub const fn dialer(&self) -> &D {
        &self.dialer
    }

    /// Returns true if a connection is live.
    #[must_use]
    pub const fn is_connected(&self) -> bool {
        self.connection.is_some()
    }

    /// Opens a fresh connection to `path`, replacing any existing one.
    ///
    /// Resolution, dialing and sending the request share one `timeout`
    /// budget, and each step waits at most for what is left of it and of the
    /// deadline. Reading the response headers is bounded by the idle timeout
    /// and the deadline.
    ///
    /// # Errors
    ///
    /// - [`FirehoseError::DeadlineExceeded`] if the deadline is reached
    /// - [`FirehoseError::Dns`] if the host cannot be resolved
    /// - [`FirehoseError::Tcp`] if the transport cannot be opened
    /// - [`FirehoseError::Http`] if the status line is not a success
    /// - socket errors from [`LineReader::read_line`] while reading headers
    pub async fn connect(
        &mut self,
        path: &str,
        timeout: Duration,
        deadline: &Deadline,
    ) -> Result<(), FirehoseError> {
        self.disconnect();

        let budget = Budget::new(timeout, deadline)?;
        let addr = self.pick_address(&budget).await?;

        let host = self.session.host();
        let mut transport = match budget.run(self.dialer.dial(addr, host, self.security)).await? {
            Some(Ok(transport)) => transport,
            Some(Err(e)) => return Err(FirehoseError::tcp(&e)),
            None => {
                return Err(FirehoseError::Tcp {
                    code: codes::TCP_ERROR,
                    message: format!("connection to {addr} timed out"),
                });
            }
        };

        let request = request_text(
            path,
            host,
            &self.session.credentials().basic_token(),
            &self.user_agent,
        );
        let sent = budget
            .run(async {
                transport.write_all(request.as_bytes()).await?;
                transport.flush().await
            })
            .await?;
        match sent {
            Some(Ok(())) => {}
            Some(Err(e)) => return Err(FirehoseError::Socket(e.to_string())),
            None => return Err(FirehoseError::SocketTimeout),
        }

        let mut reader = LineReader::new(transport, self.idle_timeout);
        let status = reader.read_line(deadline).await?;
        check_status_line(&String::from_utf8_lossy(&status))?;

        loop {
            let header = reader.read_line(deadline).await?;
            if header.trim_ascii().is_empty() {
                break;
            }
        }

        info!(host, %addr, path, "connected");
        self.connection = Some(reader);
        Ok(())
    }

    /// Drops the live connection, if any. Never fails.
    pub fn disconnect(&mut self) {
        if self.connection.take().is_some() {
            debug!(host = self.session.host(), "disconnected");
        }
    }

    /// Reads the next line from the live connection.
    ///
    /// # Errors
    ///
    /// Returns [`FirehoseError::Socket`] without a live connection, otherwise
    /// any error from [`LineReader::read_line`].
    pub async fn read_line(&mut self, deadline: &Deadline) -> Result<Bytes, FirehoseError> {
        let Some(connection) = self.connection.as_mut() else {
            return Err(FirehoseError::Socket("no active connection".to_string()));
        };
        connection.read_line(deadline).await
    }

    /// Resolves the host and picks one address uniformly at random.
    async fn pick_address(&self, budget: &Budget<'_>) -> Result<SocketAddr, FirehoseError> {
        let name = fully_qualified(self.session.host());
        let resolved = match budget.run(self.dialer.resolve(&name, self.session.port())).await? {
            Some(Ok(addrs)) => addrs,
            Some(Err(e)) => {
                debug!(host = %name, error = %e, "lookup failed");
                return Err(FirehoseError::host_not_found());
            }
            None => {
                return Err(FirehoseError::Dns {
                    code: codes::DNS_ERROR,
                    message: format!("lookup of {name} timed out"),
                });
            }
        };
        debug!(host = %name, addresses = resolved.len(), "resolved");

        resolved
            .choose(&mut rand::thread_rng())
            .copied()
            .ok_or_else(FirehoseError::host_not_found)
    }
}

const FAR_FUTURE: Duration = Duration::from_secs(86_400 * 365 * 30);

/// Time allowed for the steps of one connect attempt.
#[derive(Debug, Clone, Copy)]
struct Budget<'a> {
    end: Instant,
    deadline: &'a Deadline,
}

impl<'a> Budget<'a> {
    fn new(timeout: Duration, deadline: &'a Deadline) -> Result<Self, FirehoseError> {
        deadline.remaining(timeout)?;
        let now = Instant::now();
        Ok(Self {
            end: now.checked_add(timeout).unwrap_or(now + FAR_FUTURE),
            deadline,
        })
    }

    /// Runs `step` within what is left of the budget and the deadline.
    ///
    /// Returns `None` if the budget ran out first, and
    /// [`FirehoseError::DeadlineExceeded`] if the deadline did.
    async fn run<F: Future>(&self, step: F) -> Result<Option<F::Output>, FirehoseError> {
        let left = self.end.saturating_duration_since(Instant::now());
        let wait = self.deadline.remaining(left)?;
        match tokio::time::timeout(wait, step).await {
            Ok(output) => Ok(Some(output)),
            Err(_) if wait < left => Err(FirehoseError::DeadlineExceeded),
            Err(_) => Ok(None),
        }
    }
}
