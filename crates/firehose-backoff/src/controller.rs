//! Backoff state machine.

use chrono::{DateTime, Utc};
use firehose_types::{Deadline, FirehoseError};
use std::time::Duration;
use tracing::warn;

use crate::{BackoffClass, BackoffPolicies, Classification};

/// Progress of the current run of same-class failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffState {
    /// Class of the run.
    pub class: BackoffClass,
    /// Number of failures in the run, starting at 1.
    pub attempts: u32,
    /// Wait chosen for the latest failure.
    pub last_wait: Duration,
}

/// Decides how long to wait before reconnecting, and when to give up.
#[derive(Debug, Clone, Default)]
pub struct Backoff {
    policies: BackoffPolicies,
    state: Option<BackoffState>,
}

impl Backoff {
    /// Creates a controller with the given policy table.
    #[must_use]
    pub const fn new(policies: BackoffPolicies) -> Self {
        Self {
            policies,
            state: None,
        }
    }

    /// Returns the policy table.
    #[must_use]
    pub const fn policies(&self) -> &BackoffPolicies {
        &self.policies
    }

    /// Returns the current run, if a failure has been recorded since the last reset.
    #[must_use]
    pub const fn state(&self) -> Option<&BackoffState> {
        self.state.as_ref()
    }

    /// Forgets the current run. Called after every successful connect.
    pub const fn reset(&mut self) {
        self.state = None;
    }

    /// Records `failure` and computes the wait before the next attempt.
    ///
    /// # Errors
    ///
    /// Returns `failure` itself if it is not retryable,
    /// [`FirehoseError::RetryExhausted`] if its class ran out of attempts, and
    /// [`FirehoseError::DeadlineExceeded`] if the wait would reach the deadline.
    pub fn next_delay(
        &mut self,
        failure: &FirehoseError,
        deadline: &Deadline,
        now: DateTime<Utc>,
    ) -> Result<Duration, FirehoseError> {
        let Classification::Retryable(class) = Classification::of(failure) else {
            return Err(failure.clone());
        };
        let policy = *self.policies.get(class);

        let (attempts, wait) = match self.state {
            Some(state) if state.class == class => {
                (state.attempts.saturating_add(1), policy.grow(state.last_wait))
            }
            _ => (1, policy.initial),
        };

        let (wait, capped) = policy.clamp(wait);
        self.state = Some(BackoffState {
            class,
            attempts,
            last_wait: wait,
        });

        if attempts > policy.max_attempts {
            return Err(FirehoseError::RetryExhausted {
                code: failure.code(),
                message: failure.message(),
            });
        }

        if capped {
            warn!(
                class = %class,
                code = failure.code(),
                message = %failure.message(),
                "maximum backoff time reached"
            );
        } else if policy.cap.is_none() {
            warn!(
                class = %class,
                code = failure.code(),
                message = %failure.message(),
                "connection error, waiting for reconnect"
            );
        }

        if let Some(left) = deadline.time_left_at(now)? {
            if wait >= left {
                return Err(FirehoseError::DeadlineExceeded);
            }
        }

        Ok(wait)
    }

    /// Records `failure` and sleeps for the computed wait.
    ///
    /// # Errors
    ///
    /// See [`Backoff::next_delay`]. Nothing is slept when an error is returned.
    pub async fn wait(
        &mut self,
        failure: &FirehoseError,
        deadline: &Deadline,
    ) -> Result<Duration, FirehoseError> {
        let delay = self.next_delay(failure, deadline, Utc::now())?;
        if let Some(state) = self.state {
            warn!(
                class = %state.class,
                code = failure.code(),
                message = %failure.message(),
                attempt = state.attempts,
                wait_ms = millis(delay),
                "backing off before reconnect"
            );
        }
        tokio::time::sleep(delay).await;
        Ok(delay)
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
