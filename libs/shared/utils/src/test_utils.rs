use std::sync::RwLock;

use chrono::{DateTime, Duration, TimeZone, Utc};

use crate::clock::Clock;

/// Deterministic clock for tests: starts at a fixed instant and only moves
/// when the test advances it.
pub struct FixedClock {
    now: RwLock<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: RwLock::new(now),
        }
    }

    /// Midnight 2025-01-01 UTC, an arbitrary but stable epoch for tests.
    pub fn default_epoch() -> Self {
        Self::new(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap())
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.write().unwrap();
        *now += by;
    }

    pub fn set(&self, to: DateTime<Utc>) {
        *self.now.write().unwrap() = to;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.read().unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_clock_advances_only_on_request() {
        let clock = FixedClock::default_epoch();
        let before = clock.now();
        assert_eq!(before, clock.now());

        clock.advance(Duration::hours(2));
        assert_eq!(clock.now() - before, Duration::hours(2));
    }
}
