//! Booking lifecycle scenarios, driven through the transition harness.
//!
//! These cover the sequences the HTTP handlers and the reaper produce in
//! practice, without a database: the happy rental journey, the payment
//! window elapsing, and the race between a late payment and the reaper.

#![allow(clippy::unwrap_used)]

use chrono::Duration;
use sewa_core::{
    BookingCommand, BookingEvent, BookingStatus, CancelReason, Money, PaymentStatus,
};
use sewa_testing::{TransitionTest, fixtures};

#[test]
fn renter_journey_from_placement_to_review_eligibility() {
    let mut booking = fixtures::booking()
        .daily_rate(Money::from_ringgit(95))
        .period(fixtures::period("2026-04-06", "2026-04-09"))
        .build();
    let t0 = fixtures::fixed_now();

    assert_eq!(booking.total, Money::from_ringgit(285));

    booking.apply(BookingCommand::Confirm, t0 + Duration::minutes(3)).unwrap();
    booking
        .apply(BookingCommand::PickUp, t0 + Duration::days(35))
        .unwrap();
    let returned = booking
        .apply(BookingCommand::Return, t0 + Duration::days(38))
        .unwrap();

    assert!(matches!(returned, BookingEvent::Returned { .. }));
    // Completed is what the review endpoint requires.
    assert_eq!(booking.status, BookingStatus::Completed);
    assert_eq!(booking.payment_status, PaymentStatus::Paid);
}

#[test]
fn payment_window_elapses_and_reaper_wins() {
    let t0 = fixtures::fixed_now();
    // The reaper computes cutoff = now - timeout; an hour-old pending
    // booking is past a 60-minute window.
    TransitionTest::given(fixtures::booking().created_at(t0).build())
        .at(t0 + Duration::minutes(90))
        .when(BookingCommand::Expire { cutoff: t0 + Duration::minutes(30) })
        .then(|booking, event| {
            assert_eq!(booking.status, BookingStatus::Cancelled);
            assert_eq!(booking.cancel_reason, Some(CancelReason::PaymentTimeout));
            assert!(matches!(
                event,
                BookingEvent::Cancelled { by: CancelReason::PaymentTimeout, refunded: false, .. }
            ));
        })
        .run();
}

#[test]
fn fresh_booking_survives_a_sweep() {
    let t0 = fixtures::fixed_now();
    TransitionTest::given(fixtures::booking().created_at(t0).build())
        .at(t0 + Duration::minutes(5))
        .when(BookingCommand::Expire { cutoff: t0 - Duration::minutes(55) })
        .then_rejected(|booking, _| {
            assert_eq!(booking.status, BookingStatus::Pending);
        })
        .run();
}

#[test]
fn late_payment_after_reap_is_rejected() {
    let t0 = fixtures::fixed_now();
    let mut booking = fixtures::booking().created_at(t0).build();

    // Reaper fires first.
    booking
        .apply(
            BookingCommand::Expire { cutoff: t0 + Duration::hours(2) },
            t0 + Duration::hours(2),
        )
        .unwrap();

    // The renter's charge lands afterwards; the domain refuses, which is
    // what drives the handler's compensating refund.
    TransitionTest::given(booking)
        .at(t0 + Duration::hours(2) + Duration::seconds(1))
        .when(BookingCommand::Confirm)
        .then_rejected(|booking, _| {
            assert_eq!(booking.status, BookingStatus::Cancelled);
            assert_eq!(booking.payment_status, PaymentStatus::Pending);
        })
        .run();
}

#[test]
fn declined_charge_leaves_the_window_open_for_a_retry() {
    let t0 = fixtures::fixed_now();
    let mut booking = fixtures::booking().created_at(t0).build();

    booking.apply(BookingCommand::FailPayment, t0 + Duration::minutes(2)).unwrap();
    assert_eq!(booking.payment_status, PaymentStatus::Failed);

    // Retry succeeds inside the window.
    booking.apply(BookingCommand::Confirm, t0 + Duration::minutes(10)).unwrap();
    assert_eq!(booking.status, BookingStatus::Confirmed);

    // A failed-then-paid booking is not reapable.
    let err = booking
        .apply(
            BookingCommand::Expire { cutoff: t0 + Duration::hours(2) },
            t0 + Duration::hours(2),
        )
        .unwrap_err();
    assert!(matches!(err, sewa_core::BookingError::InvalidTransition { .. }));
}
