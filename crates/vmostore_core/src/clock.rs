//! Time sources for entry timestamps and expiry checks.

use std::sync::atomic::{AtomicI64, Ordering};

/// A source of wall-clock time in milliseconds since the Unix epoch.
pub trait Clock: Send + Sync {
    /// Returns the current time in milliseconds since the Unix epoch.
    fn now_millis(&self) -> i64;
}

/// The system clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// A clock that only moves when told to.
///
/// ```rust
/// use vmostore_core::{Clock, ManualClock};
///
/// let clock = ManualClock::new(1_000);
/// clock.advance(500);
/// assert_eq!(clock.now_millis(), 1_500);
/// ```
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    /// Creates a clock frozen at `now_millis`.
    #[must_use]
    pub fn new(now_millis: i64) -> Self {
        Self {
            now: AtomicI64::new(now_millis),
        }
    }

    /// Creates a clock frozen at the given RFC 3339 instant.
    ///
    /// # Panics
    ///
    /// Panics if `instant` is not valid RFC 3339.
    #[must_use]
    pub fn at(instant: &str) -> Self {
        let parsed = chrono::DateTime::parse_from_rfc3339(instant)
            .unwrap_or_else(|e| panic!("invalid RFC 3339 instant {instant:?}: {e}"));
        Self::new(parsed.timestamp_millis())
    }

    /// Sets the current time.
    pub fn set(&self, now_millis: i64) {
        self.now.store(now_millis, Ordering::SeqCst);
    }

    /// Moves the clock forward by `millis`.
    pub fn advance(&self, millis: i64) {
        self.now.fetch_add(millis, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_moves_on_demand() {
        let clock = ManualClock::new(10);
        assert_eq!(clock.now_millis(), 10);
        clock.advance(5);
        assert_eq!(clock.now_millis(), 15);
        clock.set(0);
        assert_eq!(clock.now_millis(), 0);
    }

    #[test]
    fn manual_clock_from_rfc3339() {
        let clock = ManualClock::at("2024-09-13T02:15:17.000Z");
        assert_eq!(clock.now_millis(), 1_726_193_717_000);
    }

    #[test]
    fn system_clock_is_recent() {
        // 2024-01-01T00:00:00Z
        assert!(SystemClock.now_millis() > 1_704_067_200_000);
    }
}
