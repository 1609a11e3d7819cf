//! Rental periods and the overlap predicate.
//!
//! A booking holds a vehicle for a half-open range of calendar dates
//! `[start, end)`: the renter picks the car up on `start` and returns it on
//! `end`. Half-open ranges make back-to-back rentals (one booking returning
//! the morning another begins) conflict-free without any time-of-day
//! arithmetic.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Error constructing a [`BookingPeriod`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PeriodError {
    /// `start` was not strictly before `end`.
    #[error("rental period must end after it starts ({start} >= {end})")]
    Empty {
        /// Requested pickup date.
        start: NaiveDate,
        /// Requested return date.
        end: NaiveDate,
    },
}

/// A half-open range of rental dates `[start, end)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingPeriod {
    start: NaiveDate,
    end: NaiveDate,
}

impl BookingPeriod {
    /// Creates a period, rejecting empty or inverted ranges.
    ///
    /// # Errors
    ///
    /// Returns [`PeriodError::Empty`] unless `start < end`.
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, PeriodError> {
        if start < end {
            Ok(Self { start, end })
        } else {
            Err(PeriodError::Empty { start, end })
        }
    }

    /// Pickup date.
    #[must_use]
    pub const fn start(&self) -> NaiveDate {
        self.start
    }

    /// Return date (exclusive).
    #[must_use]
    pub const fn end(&self) -> NaiveDate {
        self.end
    }

    /// Whether two periods share at least one rental day.
    ///
    /// Two half-open intervals `[s1,e1)` and `[s2,e2)` overlap iff
    /// `s1 < e2 && s2 < e1`. Back-to-back periods (`e1 == s2`) do not
    /// overlap.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Number of rental days (always at least 1).
    #[must_use]
    pub fn days(&self) -> i64 {
        self.end.signed_duration_since(self.start).num_days()
    }

    /// Whether `date` falls inside the period.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date < self.end
    }
}

impl fmt::Display for BookingPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn date(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn period(start: &str, end: &str) -> BookingPeriod {
        BookingPeriod::new(date(start), date(end)).unwrap()
    }

    #[test]
    fn rejects_empty_and_inverted_ranges() {
        assert!(BookingPeriod::new(date("2026-03-10"), date("2026-03-10")).is_err());
        assert!(BookingPeriod::new(date("2026-03-11"), date("2026-03-10")).is_err());
    }

    #[test]
    fn one_day_rental_is_minimal_valid_period() {
        let p = period("2026-03-10", "2026-03-11");
        assert_eq!(p.days(), 1);
        assert!(p.contains(date("2026-03-10")));
        assert!(!p.contains(date("2026-03-11")));
    }

    #[test]
    fn overlapping_ranges_are_detected() {
        let a = period("2026-03-10", "2026-03-15");
        assert!(a.overlaps(&period("2026-03-14", "2026-03-20")));
        assert!(a.overlaps(&period("2026-03-01", "2026-03-11")));
        assert!(a.overlaps(&period("2026-03-11", "2026-03-12")));
        // Fully containing range
        assert!(a.overlaps(&period("2026-03-01", "2026-04-01")));
    }

    #[test]
    fn back_to_back_rentals_do_not_overlap() {
        let a = period("2026-03-10", "2026-03-15");
        assert!(!a.overlaps(&period("2026-03-15", "2026-03-20")));
        assert!(!a.overlaps(&period("2026-03-05", "2026-03-10")));
    }

    fn arb_date() -> impl Strategy<Value = NaiveDate> {
        // A few years around the epoch of interest; plenty for interval algebra.
        (0i64..2000).prop_map(|offset| {
            date("2025-01-01") + chrono::Duration::days(offset)
        })
    }

    fn arb_period() -> impl Strategy<Value = BookingPeriod> {
        (arb_date(), 1i64..60).prop_map(|(start, len)| {
            BookingPeriod::new(start, start + chrono::Duration::days(len)).unwrap()
        })
    }

    proptest! {
        #[test]
        fn overlap_is_symmetric(a in arb_period(), b in arb_period()) {
            prop_assert_eq!(a.overlaps(&b), b.overlaps(&a));
        }

        #[test]
        fn overlap_matches_shared_day_definition(a in arb_period(), b in arb_period()) {
            // The predicate must agree with "some calendar day is in both".
            let shares_day = (0..a.days())
                .map(|d| a.start() + chrono::Duration::days(d))
                .any(|day| b.contains(day));
            prop_assert_eq!(a.overlaps(&b), shares_day);
        }

        #[test]
        fn period_always_overlaps_itself(a in arb_period()) {
            prop_assert!(a.overlaps(&a));
        }
    }
}
