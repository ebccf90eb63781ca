//! The public read loop.

use firehose_backoff::Backoff;
use firehose_types::{Deadline, FirehoseError, Record, RecordLimit, Session};
use futures::Stream;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::connection::ConnectionManager;
use crate::dialer::{Dialer, NetDialer};
use crate::StreamConfig;

/// Where the consumer stands after its latest call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConsumerState {
    /// Reading, or ready to read.
    #[default]
    Running,
    /// The record limit was reached.
    StoppedByLimit,
    /// The deadline was reached.
    StoppedByDeadline,
    /// A fatal error ended the session.
    Failed,
}

impl ConsumerState {
    /// Returns true for the graceful stop states.
    #[must_use]
    pub const fn is_stopped(&self) -> bool {
        matches!(self, Self::StoppedByLimit | Self::StoppedByDeadline)
    }
}

/// Reads records from a streaming endpoint, reconnecting on failure.
///
/// Stream errors while reading and failed reconnect attempts are both spaced
/// out by the [`Backoff`] controller until it gives up or the deadline would
/// be crossed, at which point the consumer enters [`ConsumerState::Failed`]
/// and keeps returning that error.
///
/// # Example
///
/// ```no_run
/// use firehose_stream::{StreamConfig, StreamConsumer};
/// use firehose_types::{Credentials, Session};
///
/// # async fn run() -> Result<(), firehose_types::FirehoseError> {
/// let session = Session::with_defaults(Credentials::new("user", "secret")?);
/// let mut consumer = StreamConsumer::new(session, StreamConfig::default())?;
/// consumer.set_record_limit(Some(10));
///
/// while let Some(record) = consumer.next_record().await? {
///     println!("{record}");
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct StreamConsumer<D = NetDialer> {
    manager: ConnectionManager<D>,
    backoff: Backoff,
    endpoint: String,
    connect_timeout: Duration,
    deadline: Deadline,
    limit: RecordLimit,
    state: ConsumerState,
    failure: Option<FirehoseError>,
}

impl StreamConsumer<NetDialer> {
    /// Creates a consumer that dials the network.
    ///
    /// # Errors
    ///
    /// Returns [`FirehoseError::Config`] if the TLS configuration cannot be built.
    pub fn new(session: Session, config: StreamConfig) -> Result<Self, FirehoseError> {
        Ok(Self::with_dialer(session, NetDialer::new()?, config))
    }
}

impl<D: Dialer> StreamConsumer<D> {
    /// Creates a consumer that opens connections through `dialer`.
    pub fn with_dialer(session: Session, dialer: D, config: StreamConfig) -> Self {
        Self {
            manager: ConnectionManager::new(session, dialer, &config),
            backoff: Backoff::new(config.backoff),
            endpoint: config.endpoint,
            connect_timeout: config.connect_timeout,
            deadline: Deadline::none(),
            limit: RecordLimit::unlimited(),
            state: ConsumerState::Running,
            failure: None,
        }
    }

    /// Sets the request path used by subsequent connects.
    pub fn set_endpoint(&mut self, endpoint: impl Into<String>) {
        self.endpoint = endpoint.into();
    }

    /// Sets the deadline checked before every wait.
    pub const fn set_deadline(&mut self, deadline: Deadline) {
        self.deadline = deadline;
    }

    /// Sets the record limit and restarts its count. `None` or `Some(0)`
    /// means unlimited.
    pub const fn set_record_limit(&mut self, max: Option<u64>) {
        self.limit = RecordLimit::new(max);
    }

    /// Returns the request path.
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Returns the deadline.
    #[must_use]
    pub const fn deadline(&self) -> Deadline {
        self.deadline
    }

    /// Returns the state left by the latest call.
    #[must_use]
    pub const fn state(&self) -> ConsumerState {
        self.state
    }

    /// Returns the number of records emitted since the limit was last set.
    #[must_use]
    pub const fn records_emitted(&self) -> u64 {
        self.limit.emitted()
    }

    /// Returns the backoff controller.
    #[must_use]
    pub const fn backoff(&self) -> &Backoff {
        &self.backoff
    }

    /// Returns the session.
    #[must_use]
    pub const fn session(&self) -> &Session {
        self.manager.session()
    }

    /// Returns true if a connection is live.
    #[must_use]
    pub const fn is_connected(&self) -> bool {
        self.manager.is_connected()
    }

    /// Makes a single connection attempt, without backoff.
    ///
    /// Success resets the backoff controller and clears a previous failure.
    ///
    /// # Errors
    ///
    /// Returns the classified DNS, TCP, HTTP or socket error of the attempt.
    pub async fn connect(&mut self) -> Result<(), FirehoseError> {
        self.manager
            .connect(&self.endpoint, self.connect_timeout, &self.deadline)
            .await?;
        self.backoff.reset();
        self.failure = None;
        self.state = ConsumerState::Running;
        Ok(())
    }

    /// Drops the live connection, if any.
    pub fn disconnect(&mut self) {
        self.manager.disconnect();
    }

    /// Waits for the next record.
    ///
    /// Returns `Ok(None)` once the record limit or the deadline is reached.
    /// Lines that are not records (keep-alives, control messages, malformed
    /// JSON) are skipped.
    ///
    /// # Errors
    ///
    /// Returns the fatal error that moved the consumer to
    /// [`ConsumerState::Failed`]: a non-retryable failure,
    /// [`FirehoseError::RetryExhausted`], or [`FirehoseError::DeadlineExceeded`]
    /// raised while reconnecting. Once failed, every call returns it again.
    pub async fn next_record(&mut self) -> Result<Option<Record>, FirehoseError> {
        if let Some(failure) = &self.failure {
            return Err(failure.clone());
        }

        loop {
            if self.limit.is_reached() {
                self.stop(ConsumerState::StoppedByLimit);
                return Ok(None);
            }
            if self.deadline.is_reached() {
                self.stop(ConsumerState::StoppedByDeadline);
                return Ok(None);
            }
            self.state = ConsumerState::Running;

            if !self.manager.is_connected() {
                if let Err(e) = self.reconnect().await {
                    return Err(self.fail(e));
                }
            }

            match self.manager.read_line(&self.deadline).await {
                Ok(line) => {
                    let line = String::from_utf8_lossy(&line);
                    if let Some(record) = Record::from_line(&line) {
                        self.limit.record();
                        return Ok(Some(record));
                    }
                    debug!(line = %line.trim_end(), "skipped non-record line");
                }
                Err(FirehoseError::DeadlineExceeded) => {
                    self.stop(ConsumerState::StoppedByDeadline);
                    return Ok(None);
                }
                Err(e) => {
                    warn!(code = e.code(), message = %e.message(), "stream interrupted, reconnecting");
                    self.manager.disconnect();
                    if let Err(fatal) = self.backoff.wait(&e, &self.deadline).await {
                        return Err(self.fail(fatal));
                    }
                }
            }
        }
    }

    /// Turns the consumer into a stream of records.
    ///
    /// The stream ends on a graceful stop, and yields a fatal error once
    /// before ending.
    pub fn into_records(self) -> impl Stream<Item = Result<Record, FirehoseError>> {
        futures::stream::unfold(Some(self), |consumer| async move {
            let mut consumer = consumer?;
            let next = consumer.next_record().await;
            match next {
                Ok(Some(record)) => Some((Ok(record), Some(consumer))),
                Ok(None) => None,
                Err(e) => Some((Err(e), None)),
            }
        })
    }

    /// Connects, backing off between failed attempts.
    async fn reconnect(&mut self) -> Result<(), FirehoseError> {
        loop {
            match self
                .manager
                .connect(&self.endpoint, self.connect_timeout, &self.deadline)
                .await
            {
                Ok(()) => {
                    self.backoff.reset();
                    return Ok(());
                }
                Err(e) => {
                    self.backoff.wait(&e, &self.deadline).await?;
                }
            }
        }
    }

    fn stop(&mut self, state: ConsumerState) {
        if self.state != state {
            info!(state = ?state, emitted = self.limit.emitted(), "stream stopped");
        }
        self.state = state;
        self.manager.disconnect();
    }

    fn fail(&mut self, error: FirehoseError) -> FirehoseError {
        debug!(code = error.code(), message = %error.message(), "stream failed");
        self.state = ConsumerState::Failed;
        self.manager.disconnect();
        self.failure = Some(error.clone());
        error
    }
}
