//! Renter notifications.
//!
//! Delivery is behind a trait so mail or SMS providers can be wired in
//! later. The default implementation emits structured log events, which is
//! what a back office tailing its own logs actually reads.

use async_trait::async_trait;
use sewa_core::{Booking, CancelReason};

/// Delivery seam for booking lifecycle notifications.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Booking paid and locked in.
    async fn booking_confirmed(&self, booking: &Booking);

    /// Booking cancelled by a person.
    async fn booking_cancelled(&self, booking: &Booking, by: CancelReason);

    /// Booking expired by the reaper.
    async fn booking_expired(&self, booking: &Booking);
}

/// Notifier that writes structured log lines.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn booking_confirmed(&self, booking: &Booking) {
        tracing::info!(
            booking_id = %booking.id,
            renter_id = %booking.renter_id,
            total = %booking.total,
            "notify: booking confirmed"
        );
    }

    async fn booking_cancelled(&self, booking: &Booking, by: CancelReason) {
        tracing::info!(
            booking_id = %booking.id,
            renter_id = %booking.renter_id,
            by = by.as_str(),
            "notify: booking cancelled"
        );
    }

    async fn booking_expired(&self, booking: &Booking) {
        tracing::info!(
            booking_id = %booking.id,
            renter_id = %booking.renter_id,
            "notify: booking expired, payment window elapsed"
        );
    }
}

#[cfg(test)]
pub(crate) mod recording {
    //! A notifier that records calls, for asserting on side effects.

    #![allow(clippy::unwrap_used)]

    use super::{Booking, CancelReason, Notifier, async_trait};
    use sewa_core::BookingId;
    use std::sync::Mutex;

    /// What was notified.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Notified {
        /// `booking_confirmed` was called.
        Confirmed(BookingId),
        /// `booking_cancelled` was called.
        Cancelled(BookingId, CancelReason),
        /// `booking_expired` was called.
        Expired(BookingId),
    }

    /// Records every notification.
    #[derive(Debug, Default)]
    pub struct RecordingNotifier {
        calls: Mutex<Vec<Notified>>,
    }

    impl RecordingNotifier {
        pub fn calls(&self) -> Vec<Notified> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn booking_confirmed(&self, booking: &Booking) {
            self.calls.lock().unwrap().push(Notified::Confirmed(booking.id));
        }

        async fn booking_cancelled(&self, booking: &Booking, by: CancelReason) {
            self.calls.lock().unwrap().push(Notified::Cancelled(booking.id, by));
        }

        async fn booking_expired(&self, booking: &Booking) {
            self.calls.lock().unwrap().push(Notified::Expired(booking.id));
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::recording::{Notified, RecordingNotifier};
    use super::*;
    use sewa_testing::fixtures;

    #[tokio::test]
    async fn recording_notifier_captures_call_order() {
        let notifier = RecordingNotifier::default();
        let booking = fixtures::booking().build();

        notifier.booking_confirmed(&booking).await;
        notifier.booking_cancelled(&booking, CancelReason::Renter).await;
        notifier.booking_expired(&booking).await;

        assert_eq!(
            notifier.calls(),
            vec![
                Notified::Confirmed(booking.id),
                Notified::Cancelled(booking.id, CancelReason::Renter),
                Notified::Expired(booking.id),
            ]
        );
    }
}
