//! A settable clock for deterministic tests.

use chrono::{DateTime, Duration, Utc};
use sewa_core::Clock;
use std::sync::{Arc, Mutex};

/// A [`Clock`] frozen at a chosen instant, advanced explicitly by tests.
///
/// Cloning shares the underlying instant, so a clock handed to the code
/// under test can still be advanced from the test body.
#[derive(Clone, Debug)]
pub struct FixedClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl FixedClock {
    /// Creates a clock frozen at `now`.
    #[must_use]
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(now)),
        }
    }

    /// Creates a clock frozen at an arbitrary but fixed instant.
    #[must_use]
    pub fn default_instant() -> Self {
        Self::at("2026-03-01T08:00:00Z".parse().unwrap())
    }

    /// Moves the clock forward.
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap();
        *now += by;
    }

    /// Sets the clock to an absolute instant.
    pub fn set(&self, to: DateTime<Utc>) {
        *self.now.lock().unwrap() = to;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_moves_shared_instant() {
        let clock = FixedClock::default_instant();
        let handle = clock.clone();
        let before = clock.now();
        handle.advance(Duration::minutes(90));
        assert_eq!(clock.now(), before + Duration::minutes(90));
    }
}
