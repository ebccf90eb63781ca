//! Failure classification and per-class backoff policies.

use firehose_types::{FirehoseError, codes};
use std::time::Duration;

/// HTTP statuses that mean the client is being rate limited.
pub const RATE_LIMITED_STATUSES: [u16; 2] = [420, 429];

/// Other HTTP statuses worth retrying.
pub const RETRYABLE_STATUSES: [u16; 11] = [
    codes::HTTP_ERROR,
    401,
    403,
    404,
    408,
    418,
    500,
    501,
    502,
    503,
    504,
];

/// A class of failures sharing one backoff policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BackoffClass {
    /// Transport level failures: dial errors and broken handshakes.
    Tcp,
    /// HTTP 420 / 429.
    HttpRateLimited,
    /// Any other retryable HTTP status.
    Http,
    /// Host name resolution failures.
    Dns,
}

impl BackoffClass {
    /// Returns the class name used in log output.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Tcp => "tcp",
            Self::HttpRateLimited => "http-rate-limited",
            Self::Http => "http",
            Self::Dns => "dns",
        }
    }
}

impl std::fmt::Display for BackoffClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How a failure is handled by the backoff controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Classification {
    /// Wait according to the class policy, then retry.
    Retryable(BackoffClass),
    /// Re-raise immediately, never back off.
    NonRetryable,
}

impl Classification {
    /// Classifies a failure.
    ///
    /// Socket failures raised while a handshake is in progress count as
    /// transport failures.
    #[must_use]
    pub fn of(error: &FirehoseError) -> Self {
        match error {
            FirehoseError::Tcp { .. }
            | FirehoseError::SocketEof
            | FirehoseError::SocketTimeout
            | FirehoseError::Socket(_) => Self::Retryable(BackoffClass::Tcp),
            FirehoseError::Dns { .. } => Self::Retryable(BackoffClass::Dns),
            FirehoseError::Http { status, .. } if RATE_LIMITED_STATUSES.contains(status) => {
                Self::Retryable(BackoffClass::HttpRateLimited)
            }
            FirehoseError::Http { status, .. } if RETRYABLE_STATUSES.contains(status) => {
                Self::Retryable(BackoffClass::Http)
            }
            FirehoseError::Http { .. }
            | FirehoseError::Config(_)
            | FirehoseError::DeadlineExceeded
            | FirehoseError::RetryExhausted { .. } => Self::NonRetryable,
        }
    }
}

/// How the wait grows between consecutive same-class failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Growth {
    /// Add the initial wait each attempt.
    Linear,
    /// Double the previous wait each attempt.
    Exponential,
}

/// Wait-growth rule and retry ceiling for one backoff class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BackoffPolicy {
    /// Wait before the first retry of a run.
    pub initial: Duration,
    /// Growth rule for later retries.
    pub growth: Growth,
    /// Highest attempt number that is still retried.
    pub max_attempts: u32,
    /// Upper bound on a single wait, if any.
    pub cap: Option<Duration>,
}

impl BackoffPolicy {
    /// Transport failures: +250 ms per attempt up to 16 s, 64 attempts.
    pub const TCP: Self = Self {
        initial: Duration::from_millis(250),
        growth: Growth::Linear,
        max_attempts: 64,
        cap: Some(Duration::from_millis(16_000)),
    };

    /// Rate limiting: start at one minute and double, 5 attempts.
    pub const HTTP_RATE_LIMITED: Self = Self {
        initial: Duration::from_millis(60_000),
        growth: Growth::Exponential,
        max_attempts: 5,
        cap: None,
    };

    /// Other HTTP errors: start at 5 s and double up to 320 s, 7 attempts.
    pub const HTTP: Self = Self {
        initial: Duration::from_millis(5_000),
        growth: Growth::Exponential,
        max_attempts: 7,
        cap: Some(Duration::from_millis(320_000)),
    };

    /// DNS failures: start at 1 s and double up to 8 s, 8 attempts.
    pub const DNS: Self = Self {
        initial: Duration::from_millis(1_000),
        growth: Growth::Exponential,
        max_attempts: 8,
        cap: Some(Duration::from_millis(8_000)),
    };

    /// Computes the next wait from the previous one.
    #[must_use]
    pub fn grow(&self, previous: Duration) -> Duration {
        match self.growth {
            Growth::Linear => previous.saturating_add(self.initial),
            Growth::Exponential => previous.saturating_mul(2),
        }
    }

    /// Applies the cap, returning the wait and whether the cap was hit.
    #[must_use]
    pub fn clamp(&self, wait: Duration) -> (Duration, bool) {
        match self.cap {
            Some(cap) if wait >= cap => (cap, true),
            _ => (wait, false),
        }
    }
}

/// The policy table, one entry per backoff class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BackoffPolicies {
    /// Policy for [`BackoffClass::Tcp`].
    pub tcp: BackoffPolicy,
    /// Policy for [`BackoffClass::HttpRateLimited`].
    pub http_rate_limited: BackoffPolicy,
    /// Policy for [`BackoffClass::Http`].
    pub http: BackoffPolicy,
    /// Policy for [`BackoffClass::Dns`].
    pub dns: BackoffPolicy,
}

impl BackoffPolicies {
    /// Returns the policy for a class.
    #[must_use]
    pub const fn get(&self, class: BackoffClass) -> &BackoffPolicy {
        match class {
            BackoffClass::Tcp => &self.tcp,
            BackoffClass::HttpRateLimited => &self.http_rate_limited,
            BackoffClass::Http => &self.http,
            BackoffClass::Dns => &self.dns,
        }
    }
}

impl Default for BackoffPolicies {
    fn default() -> Self {
        Self {
            tcp: BackoffPolicy::TCP,
            http_rate_limited: BackoffPolicy::HTTP_RATE_LIMITED,
            http: BackoffPolicy::HTTP,
            dns: BackoffPolicy::DNS,
        }
    }
}
