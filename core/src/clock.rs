//! Time as an injected dependency.
//!
//! Anything that asks "what time is it" takes a [`Clock`] so the reaper
//! cutoff, cache expiry, and booking timestamps are deterministic under
//! test. `sewa-testing` provides a settable `FixedClock`.

use chrono::{DateTime, Utc};

/// Source of the current time.
pub trait Clock: Send + Sync {
    /// The current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// Production clock backed by the system time.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
