//! Sewa domain model.
//!
//! Pure domain types and logic for the car-rental marketplace: identifiers,
//! money, rental periods, the booking lifecycle state machine, vehicles,
//! users, payments, reviews, and traffic-violation records.
//!
//! Everything here is side-effect free. Persistence, HTTP, and external
//! gateways live in the `sewa-postgres` and `sewa-server` crates, which call
//! into this one.
//!
//! # The booking invariant
//!
//! For a given vehicle, bookings whose status is *active* (`Pending`,
//! `Confirmed`, or `Ongoing`) must have pairwise non-overlapping rental
//! periods. [`BookingPeriod::overlaps`] is the single definition of overlap;
//! the storage layer enforces the invariant transactionally and via a
//! database exclusion constraint, both built on the same predicate.
//!
//! ```text
//! Booking lifecycle:
//!
//!   Pending ──Confirm──▶ Confirmed ──PickUp──▶ Ongoing ──Return──▶ Completed
//!      │  │                   │
//!      │  └──Cancel/Expire──▶ Cancelled ◀──Cancel──┘
//!      └──FailPayment──▶ Pending (payment failed, retryable until reaped)
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod booking;
pub mod clock;
pub mod ids;
pub mod money;
pub mod payment;
pub mod period;
pub mod review;
pub mod user;
pub mod vehicle;
pub mod violation;

pub use booking::{
    Booking, BookingCommand, BookingError, BookingEvent, BookingStatus, CancelReason,
    PaymentStatus, UnknownVariant,
};
pub use clock::{Clock, SystemClock};
pub use ids::{BookingId, PaymentId, ReviewId, UserId, VehicleId};
pub use money::Money;
pub use payment::{Payment, PaymentMethod, PaymentState};
pub use period::{BookingPeriod, PeriodError};
pub use review::{Rating, RatingError, Review};
pub use user::{Role, User};
pub use vehicle::{ListingStatus, Plate, PlateError, Vehicle};
pub use violation::Violation;
