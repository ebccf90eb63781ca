//! Record count limit.

/// Optional maximum number of emitted records, with its running count.
///
/// A limit of `None` or `Some(0)` never stops the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RecordLimit {
    max: Option<u64>,
    emitted: u64,
}

impl RecordLimit {
    /// Creates a limit with a fresh counter.
    #[must_use]
    pub const fn new(max: Option<u64>) -> Self {
        Self { max, emitted: 0 }
    }

    /// A limit that is never reached.
    #[must_use]
    pub const fn unlimited() -> Self {
        Self::new(None)
    }

    /// Returns the configured maximum.
    #[must_use]
    pub const fn max(&self) -> Option<u64> {
        self.max
    }

    /// Returns the number of records counted since the limit was set.
    #[must_use]
    pub const fn emitted(&self) -> u64 {
        self.emitted
    }

    /// Returns true if a non-zero maximum is set and has been reached.
    #[must_use]
    pub const fn is_reached(&self) -> bool {
        match self.max {
            Some(max) if max > 0 => self.emitted >= max,
            _ => false,
        }
    }

    /// Counts one emitted record.
    pub const fn record(&mut self) {
        self.emitted = self.emitted.saturating_add(1);
    }
}
