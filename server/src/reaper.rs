//! Expired-booking reaper.
//!
//! A background task that periodically cancels bookings stuck pending
//! payment longer than the configured timeout, releasing their vehicles for
//! new bookings. The sweep itself is a single guarded `UPDATE` in
//! [`sewa_postgres::BookingStore::reap_expired`]; this module owns the
//! cadence, logging, metrics, and renter notifications.
//!
//! A failed sweep is logged and retried at the next tick; the reaper never
//! takes the server down. On shutdown the task drains promptly via the
//! shutdown channel.

use crate::config::ReaperConfig;
use crate::notify::Notifier;
use sewa_core::Clock;
use sewa_postgres::BookingStore;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Dependencies the reaper needs.
pub struct Reaper {
    store: BookingStore,
    clock: Arc<dyn Clock>,
    notifier: Arc<dyn Notifier>,
    config: ReaperConfig,
}

impl Reaper {
    /// Builds a reaper.
    #[must_use]
    pub fn new(
        store: BookingStore,
        clock: Arc<dyn Clock>,
        notifier: Arc<dyn Notifier>,
        config: ReaperConfig,
    ) -> Self {
        Self { store, clock, notifier, config }
    }

    /// Runs one sweep: cancels stale pending bookings, notifies their
    /// renters, and returns how many were reaped.
    ///
    /// # Errors
    ///
    /// Returns the store error when the sweep statement fails.
    pub async fn sweep(&self) -> Result<usize, sewa_postgres::StoreError> {
        let now = self.clock.now();
        let cutoff = now - self.config.pending_timeout;
        let reaped = self.store.reap_expired(cutoff, now).await?;

        for booking in &reaped {
            tracing::info!(
                booking_id = %booking.id,
                vehicle_id = %booking.vehicle_id,
                created_at = %booking.created_at,
                "reaped booking stuck pending payment"
            );
            crate::metrics::record_booking_reaped();
            self.notifier.booking_expired(booking).await;
        }
        Ok(reaped.len())
    }

    /// Spawns the periodic sweep loop. The task exits when `shutdown`
    /// observes a value or the sender side is dropped.
    #[must_use]
    pub fn spawn(self, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.config.sweep_interval);
            // The first tick fires immediately; that is what we want, stale
            // bookings from before a restart get reaped right away.
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        match self.sweep().await {
                            Ok(0) => tracing::debug!("reaper sweep: nothing to do"),
                            Ok(count) => tracing::info!(count, "reaper sweep cancelled stale bookings"),
                            Err(error) => tracing::warn!(%error, "reaper sweep failed; will retry"),
                        }
                    }
                    _ = shutdown.changed() => {
                        tracing::info!("reaper shutting down");
                        break;
                    }
                }
            }
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Duration;

    // Sweep behavior against a real database is covered by the ignored
    // integration tests in sewa-postgres. Here we pin the cutoff
    // arithmetic, which is the part the reaper itself owns.
    #[test]
    fn cutoff_is_now_minus_timeout() {
        let timeout = Duration::minutes(60);
        let now: chrono::DateTime<chrono::Utc> = "2026-03-01T12:00:00Z".parse().unwrap();
        let cutoff = now - timeout;
        assert_eq!(cutoff, "2026-03-01T11:00:00Z".parse::<chrono::DateTime<chrono::Utc>>().unwrap());
    }
}
