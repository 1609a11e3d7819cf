//! Given-When-Then harness for the booking state machine.
//!
//! ```ignore
//! TransitionTest::given(fixtures::booking().build())
//!     .at(fixtures::fixed_now())
//!     .when(BookingCommand::Confirm)
//!     .then(|booking, event| {
//!         assert_eq!(booking.status, BookingStatus::Confirmed);
//!         assert!(matches!(event, BookingEvent::Confirmed { .. }));
//!     })
//!     .run();
//! ```

use chrono::{DateTime, Utc};
use sewa_core::{Booking, BookingCommand, BookingError, BookingEvent};

type OkAssertion = Box<dyn FnOnce(&Booking, &BookingEvent)>;
type ErrAssertion = Box<dyn FnOnce(&Booking, &BookingError)>;

/// Fluent test harness for [`Booking::apply`].
pub struct TransitionTest {
    booking: Booking,
    now: DateTime<Utc>,
    command: Option<BookingCommand>,
    ok_assertions: Vec<OkAssertion>,
    err_assertions: Vec<ErrAssertion>,
}

impl TransitionTest {
    /// Starts from this booking state (Given).
    #[must_use]
    pub fn given(booking: Booking) -> Self {
        Self {
            now: booking.created_at,
            booking,
            command: None,
            ok_assertions: Vec::new(),
            err_assertions: Vec::new(),
        }
    }

    /// Applies the command at this instant instead of `created_at`.
    #[must_use]
    pub const fn at(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    /// The command under test (When).
    #[must_use]
    pub fn when(mut self, command: BookingCommand) -> Self {
        self.command = Some(command);
        self
    }

    /// Asserts on the mutated booking and the emitted event (Then).
    ///
    /// The test fails if the transition was rejected.
    #[must_use]
    pub fn then<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&Booking, &BookingEvent) + 'static,
    {
        self.ok_assertions.push(Box::new(assertion));
        self
    }

    /// Asserts that the transition is rejected (Then).
    ///
    /// The booking must be left untouched; the harness checks that itself.
    #[must_use]
    pub fn then_rejected<F>(mut self, assertion: F) -> Self
    where
        F: FnOnce(&Booking, &BookingError) + 'static,
    {
        self.err_assertions.push(Box::new(assertion));
        self
    }

    /// Runs the transition and all assertions.
    ///
    /// # Panics
    ///
    /// Panics when no command was set, when the outcome kind (ok/rejected)
    /// does not match the registered assertions, or when an assertion fails.
    pub fn run(self) {
        let command = self.command.expect("command must be set with when()");
        let before = self.booking.clone();
        let mut booking = self.booking;

        match booking.apply(command, self.now) {
            Ok(event) => {
                assert!(
                    self.err_assertions.is_empty(),
                    "expected rejection, but {command:?} produced {event:?}"
                );
                for assertion in self.ok_assertions {
                    assertion(&booking, &event);
                }
            }
            Err(error) => {
                assert!(
                    self.ok_assertions.is_empty(),
                    "expected success, but {command:?} was rejected: {error}"
                );
                assert_eq!(booking, before, "a rejected command must not mutate the booking");
                for assertion in self.err_assertions {
                    assertion(&booking, &error);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures;
    use sewa_core::{BookingStatus, CancelReason, PaymentStatus};

    #[test]
    fn harness_runs_ok_assertions() {
        TransitionTest::given(fixtures::booking().build())
            .when(BookingCommand::Confirm)
            .then(|booking, event| {
                assert_eq!(booking.status, BookingStatus::Confirmed);
                assert!(matches!(event, BookingEvent::Confirmed { .. }));
            })
            .run();
    }

    #[test]
    fn harness_checks_rejections_leave_state_untouched() {
        TransitionTest::given(fixtures::booking().build())
            .when(BookingCommand::Return)
            .then_rejected(|booking, error| {
                assert_eq!(booking.payment_status, PaymentStatus::Pending);
                assert!(matches!(error, BookingError::InvalidTransition { .. }));
            })
            .run();
    }

    #[test]
    #[should_panic(expected = "expected success")]
    fn harness_fails_when_outcome_kind_mismatches() {
        TransitionTest::given(fixtures::booking().build())
            .when(BookingCommand::Cancel { by: CancelReason::Renter })
            .when(BookingCommand::Return)
            .then(|_, _| {})
            .run();
    }
}
