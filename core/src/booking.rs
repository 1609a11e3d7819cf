//! Booking lifecycle state machine.
//!
//! A [`Booking`] is the reservation of one vehicle for one [`BookingPeriod`]
//! by one renter. State changes go through [`Booking::apply`], which
//! validates the transition and returns the [`BookingEvent`] that happened;
//! the storage layer persists the mutated booking afterwards. Keeping the
//! transitions pure makes every lifecycle rule unit-testable without a
//! database.
//!
//! Bookings with an *active* status (`Pending`, `Confirmed`, `Ongoing`) hold
//! the vehicle: the overlap guard in `sewa-postgres` only considers these.

use crate::ids::{BookingId, UserId, VehicleId};
use crate::money::Money;
use crate::period::BookingPeriod;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Lifecycle status of a booking.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    /// Placed, awaiting payment. Holds the vehicle until paid or reaped.
    Pending,
    /// Paid and locked in.
    Confirmed,
    /// Vehicle picked up, rental in progress.
    Ongoing,
    /// Vehicle returned.
    Completed,
    /// Cancelled by a party or expired by the reaper.
    Cancelled,
}

impl BookingStatus {
    /// Whether this status holds the vehicle for overlap purposes.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self, Self::Pending | Self::Confirmed | Self::Ongoing)
    }

    /// Whether no further transitions are possible.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled)
    }

    /// Database/API string form.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Ongoing => "ongoing",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BookingStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            "ongoing" => Ok(Self::Ongoing),
            "completed" => Ok(Self::Completed),
            "cancelled" => Ok(Self::Cancelled),
            other => Err(UnknownVariant::new("booking status", other)),
        }
    }
}

/// Payment status tracked alongside the booking status.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Not yet charged.
    Pending,
    /// Charged successfully.
    Paid,
    /// Last charge attempt failed; retryable until the booking is reaped.
    Failed,
    /// Charged, then refunded on cancellation.
    Refunded,
}

impl PaymentStatus {
    /// Database/API string form.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Failed => "failed",
            Self::Refunded => "refunded",
        }
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "paid" => Ok(Self::Paid),
            "failed" => Ok(Self::Failed),
            "refunded" => Ok(Self::Refunded),
            other => Err(UnknownVariant::new("payment status", other)),
        }
    }
}

/// Who (or what) cancelled a booking.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CancelReason {
    /// The renter backed out.
    Renter,
    /// The vehicle owner declined (only possible before payment).
    Owner,
    /// Back-office intervention.
    Admin,
    /// The reaper cancelled a booking stuck pending payment.
    PaymentTimeout,
}

impl CancelReason {
    /// Database/API string form.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Renter => "renter",
            Self::Owner => "owner",
            Self::Admin => "admin",
            Self::PaymentTimeout => "payment_timeout",
        }
    }
}

impl FromStr for CancelReason {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "renter" => Ok(Self::Renter),
            "owner" => Ok(Self::Owner),
            "admin" => Ok(Self::Admin),
            "payment_timeout" => Ok(Self::PaymentTimeout),
            other => Err(UnknownVariant::new("cancel reason", other)),
        }
    }
}

/// A string that did not match any variant of a status enum.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind}: {value}")]
pub struct UnknownVariant {
    kind: &'static str,
    value: String,
}

impl UnknownVariant {
    pub(crate) fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// Commands accepted by [`Booking::apply`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BookingCommand {
    /// Payment captured; lock the booking in.
    Confirm,
    /// A charge attempt failed.
    FailPayment,
    /// Owner hands the vehicle over.
    PickUp,
    /// Renter returns the vehicle.
    Return,
    /// A party cancels the booking.
    Cancel {
        /// Who is cancelling.
        by: CancelReason,
    },
    /// Reap the booking if it has been pending payment since before `cutoff`.
    Expire {
        /// Bookings created before this instant are stale.
        cutoff: DateTime<Utc>,
    },
}

impl BookingCommand {
    const fn name(&self) -> &'static str {
        match self {
            Self::Confirm => "confirm",
            Self::FailPayment => "fail_payment",
            Self::PickUp => "pick_up",
            Self::Return => "return",
            Self::Cancel { .. } => "cancel",
            Self::Expire { .. } => "expire",
        }
    }
}

/// What a successful [`Booking::apply`] did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BookingEvent {
    /// Booking confirmed (paid).
    Confirmed {
        /// When.
        at: DateTime<Utc>,
    },
    /// Charge attempt failed; booking still pending.
    PaymentFailed,
    /// Rental started.
    PickedUp {
        /// When.
        at: DateTime<Utc>,
    },
    /// Rental finished.
    Returned {
        /// When.
        at: DateTime<Utc>,
    },
    /// Booking cancelled.
    Cancelled {
        /// Who cancelled.
        by: CancelReason,
        /// Whether a captured payment was released for refund.
        refunded: bool,
        /// When.
        at: DateTime<Utc>,
    },
}

/// Rejected booking transitions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BookingError {
    /// The command does not apply in the current status.
    #[error("cannot {command} a {status} booking")]
    InvalidTransition {
        /// Current booking status.
        status: BookingStatus,
        /// Rejected command.
        command: &'static str,
    },
    /// `Expire` on a booking younger than the cutoff.
    #[error("booking is not yet past the payment timeout")]
    NotYetExpired,
    /// A booking with the vehicle out cannot be cancelled.
    #[error("an ongoing rental cannot be cancelled")]
    CannotCancelOngoing,
    /// Owners may not drop a booking the renter has already paid for.
    #[error("owner cannot cancel a paid booking")]
    OwnerCannotCancelPaid,
    /// `daily_rate * days` overflowed.
    #[error("booking total overflows")]
    AmountOverflow,
}

/// A reservation of a vehicle for a rental period.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    /// Booking id.
    pub id: BookingId,
    /// Reserved vehicle.
    pub vehicle_id: VehicleId,
    /// Renter who placed the booking.
    pub renter_id: UserId,
    /// Rental period.
    pub period: BookingPeriod,
    /// Daily rate at the time of booking.
    pub daily_rate: Money,
    /// Total amount (`daily_rate * days`).
    pub total: Money,
    /// Lifecycle status.
    pub status: BookingStatus,
    /// Payment status.
    pub payment_status: PaymentStatus,
    /// Set when the booking is cancelled.
    pub cancel_reason: Option<CancelReason>,
    /// When the booking was placed.
    pub created_at: DateTime<Utc>,
    /// When payment was captured.
    pub confirmed_at: Option<DateTime<Utc>>,
    /// When the vehicle came back.
    pub completed_at: Option<DateTime<Utc>>,
    /// When the booking was cancelled.
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl Booking {
    /// Places a new pending booking.
    ///
    /// The caller is responsible for running the overlap guard before
    /// persisting the result.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::AmountOverflow`] if the total cannot be
    /// represented.
    pub fn place(
        id: BookingId,
        vehicle_id: VehicleId,
        renter_id: UserId,
        period: BookingPeriod,
        daily_rate: Money,
        now: DateTime<Utc>,
    ) -> Result<Self, BookingError> {
        let days = u64::try_from(period.days()).map_err(|_| BookingError::AmountOverflow)?;
        let total = daily_rate
            .checked_multiply(days)
            .ok_or(BookingError::AmountOverflow)?;
        Ok(Self {
            id,
            vehicle_id,
            renter_id,
            period,
            daily_rate,
            total,
            status: BookingStatus::Pending,
            payment_status: PaymentStatus::Pending,
            cancel_reason: None,
            created_at: now,
            confirmed_at: None,
            completed_at: None,
            cancelled_at: None,
        })
    }

    /// Applies a lifecycle command, mutating the booking on success.
    ///
    /// # Errors
    ///
    /// Returns a [`BookingError`] and leaves the booking untouched when the
    /// transition is not allowed from the current state.
    pub fn apply(
        &mut self,
        command: BookingCommand,
        now: DateTime<Utc>,
    ) -> Result<BookingEvent, BookingError> {
        match (self.status, command) {
            (BookingStatus::Pending, BookingCommand::Confirm) => {
                self.status = BookingStatus::Confirmed;
                self.payment_status = PaymentStatus::Paid;
                self.confirmed_at = Some(now);
                Ok(BookingEvent::Confirmed { at: now })
            }
            (BookingStatus::Pending, BookingCommand::FailPayment) => {
                self.payment_status = PaymentStatus::Failed;
                Ok(BookingEvent::PaymentFailed)
            }
            (BookingStatus::Confirmed, BookingCommand::PickUp) => {
                self.status = BookingStatus::Ongoing;
                Ok(BookingEvent::PickedUp { at: now })
            }
            (BookingStatus::Ongoing, BookingCommand::Return) => {
                self.status = BookingStatus::Completed;
                self.completed_at = Some(now);
                Ok(BookingEvent::Returned { at: now })
            }
            (BookingStatus::Ongoing, BookingCommand::Cancel { .. }) => {
                Err(BookingError::CannotCancelOngoing)
            }
            (BookingStatus::Pending | BookingStatus::Confirmed, BookingCommand::Cancel { by }) => {
                if by == CancelReason::Owner && self.payment_status == PaymentStatus::Paid {
                    return Err(BookingError::OwnerCannotCancelPaid);
                }
                Ok(self.cancel(by, now))
            }
            (BookingStatus::Pending, BookingCommand::Expire { cutoff }) => {
                // Only bookings still waiting on money are reapable.
                if !matches!(
                    self.payment_status,
                    PaymentStatus::Pending | PaymentStatus::Failed
                ) {
                    return Err(BookingError::InvalidTransition {
                        status: self.status,
                        command: "expire",
                    });
                }
                if self.created_at >= cutoff {
                    return Err(BookingError::NotYetExpired);
                }
                Ok(self.cancel(CancelReason::PaymentTimeout, now))
            }
            (status, command) => Err(BookingError::InvalidTransition {
                status,
                command: command.name(),
            }),
        }
    }

    fn cancel(&mut self, by: CancelReason, now: DateTime<Utc>) -> BookingEvent {
        let refunded = self.payment_status == PaymentStatus::Paid;
        if refunded {
            self.payment_status = PaymentStatus::Refunded;
        }
        self.status = BookingStatus::Cancelled;
        self.cancel_reason = Some(by);
        self.cancelled_at = Some(now);
        BookingEvent::Cancelled { by, refunded, at: now }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn now() -> DateTime<Utc> {
        "2026-03-01T08:00:00Z".parse().unwrap()
    }

    fn period() -> BookingPeriod {
        BookingPeriod::new(
            "2026-03-10".parse().unwrap(),
            "2026-03-15".parse().unwrap(),
        )
        .unwrap()
    }

    fn pending() -> Booking {
        Booking::place(
            BookingId::new(),
            VehicleId::new(),
            UserId::new(),
            period(),
            Money::from_ringgit(120),
            now(),
        )
        .unwrap()
    }

    #[test]
    fn place_computes_total_from_rate_and_days() {
        let booking = pending();
        assert_eq!(booking.status, BookingStatus::Pending);
        assert_eq!(booking.payment_status, PaymentStatus::Pending);
        assert_eq!(booking.total, Money::from_ringgit(600)); // 5 days * RM120
    }

    #[test]
    fn place_rejects_overflowing_totals() {
        let result = Booking::place(
            BookingId::new(),
            VehicleId::new(),
            UserId::new(),
            period(),
            Money::from_sen(u64::MAX),
            now(),
        );
        assert_eq!(result.unwrap_err(), BookingError::AmountOverflow);
    }

    #[test]
    fn confirm_marks_paid() {
        let mut booking = pending();
        let event = booking.apply(BookingCommand::Confirm, now()).unwrap();
        assert_eq!(event, BookingEvent::Confirmed { at: now() });
        assert_eq!(booking.status, BookingStatus::Confirmed);
        assert_eq!(booking.payment_status, PaymentStatus::Paid);
        assert_eq!(booking.confirmed_at, Some(now()));
    }

    #[test]
    fn failed_payment_keeps_booking_pending() {
        let mut booking = pending();
        booking.apply(BookingCommand::FailPayment, now()).unwrap();
        assert_eq!(booking.status, BookingStatus::Pending);
        assert_eq!(booking.payment_status, PaymentStatus::Failed);
        // A retry can still succeed.
        booking.apply(BookingCommand::Confirm, now()).unwrap();
        assert_eq!(booking.status, BookingStatus::Confirmed);
    }

    #[test]
    fn full_happy_path() {
        let mut booking = pending();
        booking.apply(BookingCommand::Confirm, now()).unwrap();
        booking.apply(BookingCommand::PickUp, now()).unwrap();
        let event = booking
            .apply(BookingCommand::Return, now() + Duration::days(5))
            .unwrap();
        assert!(matches!(event, BookingEvent::Returned { .. }));
        assert_eq!(booking.status, BookingStatus::Completed);
        assert!(booking.completed_at.is_some());
    }

    #[test]
    fn cancelling_a_paid_booking_refunds() {
        let mut booking = pending();
        booking.apply(BookingCommand::Confirm, now()).unwrap();
        let event = booking
            .apply(BookingCommand::Cancel { by: CancelReason::Renter }, now())
            .unwrap();
        assert_eq!(
            event,
            BookingEvent::Cancelled { by: CancelReason::Renter, refunded: true, at: now() }
        );
        assert_eq!(booking.payment_status, PaymentStatus::Refunded);
        assert_eq!(booking.cancel_reason, Some(CancelReason::Renter));
    }

    #[test]
    fn owner_cannot_cancel_once_paid() {
        let mut booking = pending();
        booking.apply(BookingCommand::Confirm, now()).unwrap();
        let err = booking
            .apply(BookingCommand::Cancel { by: CancelReason::Owner }, now())
            .unwrap_err();
        assert_eq!(err, BookingError::OwnerCannotCancelPaid);
        assert_eq!(booking.status, BookingStatus::Confirmed);
    }

    #[test]
    fn owner_can_decline_before_payment() {
        let mut booking = pending();
        booking
            .apply(BookingCommand::Cancel { by: CancelReason::Owner }, now())
            .unwrap();
        assert_eq!(booking.status, BookingStatus::Cancelled);
        // Nothing was captured, so nothing to refund.
        assert_eq!(booking.payment_status, PaymentStatus::Pending);
    }

    #[test]
    fn ongoing_rental_cannot_be_cancelled() {
        let mut booking = pending();
        booking.apply(BookingCommand::Confirm, now()).unwrap();
        booking.apply(BookingCommand::PickUp, now()).unwrap();
        let err = booking
            .apply(BookingCommand::Cancel { by: CancelReason::Admin }, now())
            .unwrap_err();
        assert_eq!(err, BookingError::CannotCancelOngoing);
    }

    #[test]
    fn expire_reaps_only_stale_pending_bookings() {
        let mut booking = pending();
        // Cutoff before creation: too young.
        let err = booking
            .apply(
                BookingCommand::Expire { cutoff: now() - Duration::minutes(5) },
                now() + Duration::hours(1),
            )
            .unwrap_err();
        assert_eq!(err, BookingError::NotYetExpired);

        // Cutoff after creation: reaped.
        let at = now() + Duration::hours(1);
        let event = booking
            .apply(BookingCommand::Expire { cutoff: now() + Duration::minutes(61) }, at)
            .unwrap();
        assert_eq!(
            event,
            BookingEvent::Cancelled { by: CancelReason::PaymentTimeout, refunded: false, at }
        );
        assert_eq!(booking.cancel_reason, Some(CancelReason::PaymentTimeout));
    }

    #[test]
    fn expire_ignores_confirmed_bookings() {
        let mut booking = pending();
        booking.apply(BookingCommand::Confirm, now()).unwrap();
        let err = booking
            .apply(
                BookingCommand::Expire { cutoff: now() + Duration::hours(2) },
                now() + Duration::hours(2),
            )
            .unwrap_err();
        assert!(matches!(err, BookingError::InvalidTransition { .. }));
        assert_eq!(booking.status, BookingStatus::Confirmed);
    }

    #[test]
    fn terminal_bookings_reject_everything() {
        let mut booking = pending();
        booking
            .apply(BookingCommand::Cancel { by: CancelReason::Renter }, now())
            .unwrap();
        for command in [
            BookingCommand::Confirm,
            BookingCommand::PickUp,
            BookingCommand::Return,
            BookingCommand::Cancel { by: CancelReason::Admin },
        ] {
            assert!(booking.apply(command, now()).is_err());
        }
    }

    #[test]
    fn status_strings_round_trip() {
        for status in [
            BookingStatus::Pending,
            BookingStatus::Confirmed,
            BookingStatus::Ongoing,
            BookingStatus::Completed,
            BookingStatus::Cancelled,
        ] {
            assert_eq!(status.as_str().parse::<BookingStatus>().unwrap(), status);
        }
        assert!("paused".parse::<BookingStatus>().is_err());
    }

    #[test]
    fn active_statuses_match_overlap_set() {
        assert!(BookingStatus::Pending.is_active());
        assert!(BookingStatus::Confirmed.is_active());
        assert!(BookingStatus::Ongoing.is_active());
        assert!(!BookingStatus::Completed.is_active());
        assert!(!BookingStatus::Cancelled.is_active());
    }
}
