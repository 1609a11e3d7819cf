//! Back-office reporting aggregates.
//!
//! The numbers an operations dashboard renders: booking counts by status,
//! revenue, fleet size, and a daily booking series.

use crate::bookings::money_from_db;
use crate::error::StoreError;
use chrono::NaiveDate;
use serde::Serialize;
use sewa_core::Money;
use sqlx::PgPool;
use std::sync::Arc;

/// Marketplace-wide summary numbers.
#[derive(Debug, Clone, Serialize)]
pub struct MarketSummary {
    /// Bookings awaiting payment.
    pub pending_bookings: i64,
    /// Paid, not yet picked up.
    pub confirmed_bookings: i64,
    /// Rentals in progress.
    pub ongoing_bookings: i64,
    /// Finished rentals.
    pub completed_bookings: i64,
    /// Cancelled bookings (all reasons).
    pub cancelled_bookings: i64,
    /// Of the cancelled, how many the reaper expired.
    pub reaped_bookings: i64,
    /// Net captured revenue (captured minus refunded).
    pub revenue: Money,
    /// Vehicles currently listed.
    pub listed_vehicles: i64,
    /// Share of the listed fleet currently out on rental.
    pub fleet_utilization: f64,
}

/// One day of booking volume.
#[derive(Debug, Clone, Serialize)]
pub struct DailyBookings {
    /// The day.
    pub day: NaiveDate,
    /// Bookings placed that day.
    pub placed: i64,
}

/// Read-only reporting queries.
#[derive(Clone)]
pub struct ReportStore {
    pool: Arc<PgPool>,
}

impl ReportStore {
    /// Creates a store over the shared pool.
    #[must_use]
    pub const fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// Computes the marketplace summary.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] on query failure.
    pub async fn summary(&self) -> Result<MarketSummary, StoreError> {
        let counts: Vec<(String, i64)> =
            sqlx::query_as("SELECT status, COUNT(*) FROM bookings GROUP BY status")
                .fetch_all(self.pool.as_ref())
                .await?;
        let count_of = |status: &str| {
            counts
                .iter()
                .find(|(s, _)| s == status)
                .map_or(0, |(_, n)| *n)
        };

        let (reaped,): (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM bookings WHERE cancel_reason = 'payment_timeout'",
        )
        .fetch_one(self.pool.as_ref())
        .await?;

        let (captured, refunded): (i64, i64) = sqlx::query_as(
            "SELECT
                 COALESCE(SUM(amount_sen) FILTER (WHERE state = 'captured'), 0)::BIGINT,
                 COALESCE(SUM(amount_sen) FILTER (WHERE state = 'refunded'), 0)::BIGINT
             FROM payments",
        )
        .fetch_one(self.pool.as_ref())
        .await?;

        let (listed_vehicles,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM vehicles WHERE listing_status = 'listed'")
                .fetch_one(self.pool.as_ref())
                .await?;

        let ongoing = count_of("ongoing");
        #[allow(clippy::cast_precision_loss)]
        let fleet_utilization = if listed_vehicles > 0 {
            ongoing as f64 / listed_vehicles as f64
        } else {
            0.0
        };

        Ok(MarketSummary {
            pending_bookings: count_of("pending"),
            confirmed_bookings: count_of("confirmed"),
            ongoing_bookings: ongoing,
            completed_bookings: count_of("completed"),
            cancelled_bookings: count_of("cancelled"),
            reaped_bookings: reaped,
            revenue: money_from_db(captured.saturating_sub(refunded).max(0))?,
            listed_vehicles,
            fleet_utilization,
        })
    }

    /// Bookings placed per day over the trailing `days` days.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] on query failure.
    pub async fn daily_bookings(&self, days: i32) -> Result<Vec<DailyBookings>, StoreError> {
        let rows: Vec<(NaiveDate, i64)> = sqlx::query_as(
            "SELECT created_at::DATE AS day, COUNT(*)
             FROM bookings
             WHERE created_at >= now() - make_interval(days => $1)
             GROUP BY day ORDER BY day",
        )
        .bind(days)
        .fetch_all(self.pool.as_ref())
        .await?;
        Ok(rows
            .into_iter()
            .map(|(day, placed)| DailyBookings { day, placed })
            .collect())
    }
}
