//! Session deadline and bounded wait computation.

use chrono::{DateTime, TimeDelta, Utc};
use std::time::Duration;

use crate::DeadlineExceeded;

/// Optional absolute point in time after which a session must stop.
///
/// Every blocking operation asks the deadline for a bounded wait before it
/// suspends, so a reached deadline always wins over any other timeout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Deadline(Option<DateTime<Utc>>);

impl Deadline {
    /// A deadline that is never reached.
    #[must_use]
    pub const fn none() -> Self {
        Self(None)
    }

    /// A deadline at the given instant.
    #[must_use]
    pub const fn at(instant: DateTime<Utc>) -> Self {
        Self(Some(instant))
    }

    /// A deadline `duration` from now.
    ///
    /// Durations too large to represent yield a deadline that is never reached.
    #[must_use]
    pub fn after(duration: Duration) -> Self {
        let instant = TimeDelta::from_std(duration)
            .ok()
            .and_then(|delta| Utc::now().checked_add_signed(delta));
        Self(instant)
    }

    /// Returns the deadline instant, if one is set.
    #[must_use]
    pub const fn instant(&self) -> Option<DateTime<Utc>> {
        self.0
    }

    /// Returns true if a deadline is set.
    #[must_use]
    pub const fn is_set(&self) -> bool {
        self.0.is_some()
    }

    /// Returns true if the deadline is set and `now` is at or past it.
    #[must_use]
    pub fn is_reached_at(&self, now: DateTime<Utc>) -> bool {
        self.0.is_some_and(|end| end <= now)
    }

    /// Returns true if the deadline is set and has passed.
    #[must_use]
    pub fn is_reached(&self) -> bool {
        self.is_reached_at(Utc::now())
    }

    /// Returns the time left at `now`, or `None` when no deadline is set.
    ///
    /// # Errors
    ///
    /// Returns [`DeadlineExceeded`] if the deadline is at or before `now`.
    pub fn time_left_at(&self, now: DateTime<Utc>) -> Result<Option<Duration>, DeadlineExceeded> {
        let Some(end) = self.0 else {
            return Ok(None);
        };
        match (end - now).to_std() {
            Ok(left) if !left.is_zero() => Ok(Some(left)),
            _ => Err(DeadlineExceeded),
        }
    }

    /// Bounds `requested` by the time left at `now`.
    ///
    /// With no deadline `requested` is returned unchanged, otherwise the
    /// lesser of `requested` and the time left.
    ///
    /// # Errors
    ///
    /// Returns [`DeadlineExceeded`] if the deadline is at or before `now`.
    pub fn remaining_at(
        &self,
        now: DateTime<Utc>,
        requested: Duration,
    ) -> Result<Duration, DeadlineExceeded> {
        Ok(self
            .time_left_at(now)?
            .map_or(requested, |left| left.min(requested)))
    }

    /// Bounds `requested` by the time left right now.
    ///
    /// # Errors
    ///
    /// Returns [`DeadlineExceeded`] if the deadline has passed.
    pub fn remaining(&self, requested: Duration) -> Result<Duration, DeadlineExceeded> {
        self.remaining_at(Utc::now(), requested)
    }
}

impl From<Option<DateTime<Utc>>> for Deadline {
    fn from(instant: Option<DateTime<Utc>>) -> Self {
        Self(instant)
    }
}

impl std::fmt::Display for Deadline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            Some(end) => write!(f, "{}", end.to_rfc3339()),
            None => write!(f, "unset"),
        }
    }
}
