//! Booking persistence: the overlap guard and the reaper sweep.
//!
//! The booking invariant (no two active bookings for one vehicle may
//! overlap) is enforced here twice:
//!
//! 1. [`BookingStore::create`] runs in a transaction that locks the vehicle
//!    row (`SELECT ... FOR UPDATE`), applies the overlap predicate against
//!    active bookings, and only then inserts. Concurrent writers for the
//!    same vehicle serialize on the row lock.
//! 2. The `bookings_no_overlap` exclusion constraint (see the bookings
//!    migration) re-checks the same predicate inside PostgreSQL, so nothing
//!    that bypasses this store can break the invariant either. A
//!    constraint hit decodes as SQLSTATE `23P01` and maps to
//!    [`StoreError::OverlapConflict`] like any other clash.
//!
//! Both checks and the availability search share one predicate shape:
//! `start_date < $end AND $start < end_date` over rows with an active
//! status.

use crate::error::StoreError;
use chrono::{DateTime, NaiveDate, Utc};
use sewa_core::{
    Booking, BookingId, BookingPeriod, BookingStatus, CancelReason, Money, PaymentStatus, UserId,
    VehicleId,
};
use sqlx::PgPool;
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;

/// SQL list of statuses that hold a vehicle.
///
/// Must match [`BookingStatus::is_active`]; a unit test below keeps the two
/// in sync.
pub(crate) const ACTIVE_STATUSES_SQL: &str = "'pending','confirmed','ongoing'";

const BOOKING_COLUMNS: &str = "id, vehicle_id, renter_id, start_date, end_date, \
     daily_rate_sen, total_sen, status, payment_status, cancel_reason, \
     created_at, confirmed_at, completed_at, cancelled_at";

/// Repository for bookings.
#[derive(Clone)]
pub struct BookingStore {
    pool: Arc<PgPool>,
}

#[derive(sqlx::FromRow)]
struct BookingRow {
    id: Uuid,
    vehicle_id: Uuid,
    renter_id: Uuid,
    start_date: NaiveDate,
    end_date: NaiveDate,
    daily_rate_sen: i64,
    total_sen: i64,
    status: String,
    payment_status: String,
    cancel_reason: Option<String>,
    created_at: DateTime<Utc>,
    confirmed_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    cancelled_at: Option<DateTime<Utc>>,
}

impl TryFrom<BookingRow> for Booking {
    type Error = StoreError;

    fn try_from(row: BookingRow) -> Result<Self, Self::Error> {
        let period = BookingPeriod::new(row.start_date, row.end_date)
            .map_err(|e| StoreError::Decode(e.to_string()))?;
        let cancel_reason = row
            .cancel_reason
            .as_deref()
            .map(CancelReason::from_str)
            .transpose()
            .map_err(|e| StoreError::Decode(e.to_string()))?;
        Ok(Self {
            id: BookingId::from_uuid(row.id),
            vehicle_id: VehicleId::from_uuid(row.vehicle_id),
            renter_id: UserId::from_uuid(row.renter_id),
            period,
            daily_rate: money_from_db(row.daily_rate_sen)?,
            total: money_from_db(row.total_sen)?,
            status: BookingStatus::from_str(&row.status)
                .map_err(|e| StoreError::Decode(e.to_string()))?,
            payment_status: PaymentStatus::from_str(&row.payment_status)
                .map_err(|e| StoreError::Decode(e.to_string()))?,
            cancel_reason,
            created_at: row.created_at,
            confirmed_at: row.confirmed_at,
            completed_at: row.completed_at,
            cancelled_at: row.cancelled_at,
        })
    }
}

pub(crate) fn money_from_db(sen: i64) -> Result<Money, StoreError> {
    u64::try_from(sen)
        .map(Money::from_sen)
        .map_err(|_| StoreError::Decode(format!("negative money amount {sen}")))
}

pub(crate) fn money_to_db(amount: Money) -> Result<i64, StoreError> {
    i64::try_from(amount.sen())
        .map_err(|_| StoreError::OutOfRange(format!("amount {amount} exceeds storage range")))
}

impl BookingStore {
    /// Creates a store over the shared pool.
    #[must_use]
    pub const fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// Inserts a freshly placed booking, guarded against double-booking.
    ///
    /// # Errors
    ///
    /// - [`StoreError::NotFound`] if the vehicle does not exist
    /// - [`StoreError::OverlapConflict`] if the period intersects an active
    ///   booking (from the guard or from the exclusion constraint)
    #[tracing::instrument(skip_all, fields(booking_id = %booking.id, vehicle_id = %booking.vehicle_id))]
    pub async fn create(&self, booking: &Booking) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        // Lock the vehicle row so concurrent guards for this vehicle queue up.
        let vehicle: Option<(Uuid,)> =
            sqlx::query_as("SELECT id FROM vehicles WHERE id = $1 FOR UPDATE")
                .bind(booking.vehicle_id.as_uuid())
                .fetch_optional(&mut *tx)
                .await?;
        if vehicle.is_none() {
            return Err(StoreError::NotFound {
                entity: "vehicle",
                id: booking.vehicle_id.to_string(),
            });
        }

        let (clash,): (bool,) = sqlx::query_as(&format!(
            "SELECT EXISTS(
                 SELECT 1 FROM bookings
                 WHERE vehicle_id = $1
                   AND status IN ({ACTIVE_STATUSES_SQL})
                   AND start_date < $3 AND $2 < end_date)"
        ))
        .bind(booking.vehicle_id.as_uuid())
        .bind(booking.period.start())
        .bind(booking.period.end())
        .fetch_one(&mut *tx)
        .await?;
        if clash {
            return Err(StoreError::OverlapConflict);
        }

        sqlx::query(&format!(
            "INSERT INTO bookings ({BOOKING_COLUMNS})
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)"
        ))
        .bind(booking.id.as_uuid())
        .bind(booking.vehicle_id.as_uuid())
        .bind(booking.renter_id.as_uuid())
        .bind(booking.period.start())
        .bind(booking.period.end())
        .bind(money_to_db(booking.daily_rate)?)
        .bind(money_to_db(booking.total)?)
        .bind(booking.status.as_str())
        .bind(booking.payment_status.as_str())
        .bind(booking.cancel_reason.map(|r| r.as_str()))
        .bind(booking.created_at)
        .bind(booking.confirmed_at)
        .bind(booking.completed_at)
        .bind(booking.cancelled_at)
        .execute(&mut *tx)
        .await
        .map_err(StoreError::from_booking_insert)?;

        tx.commit().await?;
        tracing::debug!("booking created");
        Ok(())
    }

    /// Fetches a booking by id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] on query failure.
    pub async fn get(&self, id: BookingId) -> Result<Option<Booking>, StoreError> {
        let row: Option<BookingRow> =
            sqlx::query_as(&format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1"))
                .bind(id.as_uuid())
                .fetch_optional(self.pool.as_ref())
                .await?;
        row.map(Booking::try_from).transpose()
    }

    /// All bookings placed by a renter, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] on query failure.
    pub async fn list_for_renter(&self, renter_id: UserId) -> Result<Vec<Booking>, StoreError> {
        let rows: Vec<BookingRow> = sqlx::query_as(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings
             WHERE renter_id = $1 ORDER BY created_at DESC"
        ))
        .bind(renter_id.as_uuid())
        .fetch_all(self.pool.as_ref())
        .await?;
        rows.into_iter().map(Booking::try_from).collect()
    }

    /// Active bookings for a vehicle intersecting `window`, earliest first.
    ///
    /// Backs the availability calendar.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] on query failure.
    pub async fn active_for_vehicle_in(
        &self,
        vehicle_id: VehicleId,
        window: BookingPeriod,
    ) -> Result<Vec<Booking>, StoreError> {
        let rows: Vec<BookingRow> = sqlx::query_as(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings
             WHERE vehicle_id = $1
               AND status IN ({ACTIVE_STATUSES_SQL})
               AND start_date < $3 AND $2 < end_date
             ORDER BY start_date"
        ))
        .bind(vehicle_id.as_uuid())
        .bind(window.start())
        .bind(window.end())
        .fetch_all(self.pool.as_ref())
        .await?;
        rows.into_iter().map(Booking::try_from).collect()
    }

    /// Persists the outcome of a lifecycle transition.
    ///
    /// The update is conditioned on the status the booking had when it was
    /// loaded, so two racing transitions cannot both win.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Stale`] if the row no longer has
    /// `expected_status`.
    #[tracing::instrument(skip_all, fields(booking_id = %booking.id, status = %booking.status))]
    pub async fn persist_transition(
        &self,
        booking: &Booking,
        expected_status: BookingStatus,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE bookings
             SET status = $2, payment_status = $3, cancel_reason = $4,
                 confirmed_at = $5, completed_at = $6, cancelled_at = $7
             WHERE id = $1 AND status = $8",
        )
        .bind(booking.id.as_uuid())
        .bind(booking.status.as_str())
        .bind(booking.payment_status.as_str())
        .bind(booking.cancel_reason.map(|r| r.as_str()))
        .bind(booking.confirmed_at)
        .bind(booking.completed_at)
        .bind(booking.cancelled_at)
        .bind(expected_status.as_str())
        .execute(self.pool.as_ref())
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::Stale);
        }
        Ok(())
    }

    /// Cancels every booking stuck pending payment since before `cutoff`.
    ///
    /// This is the reaper's sweep: one statement that flips stale rows to
    /// `cancelled`/`payment_timeout` and returns them so the caller can
    /// notify renters and bump metrics. Bookings whose payment already
    /// succeeded are `confirmed` and untouched by the predicate.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] on query failure.
    pub async fn reap_expired(
        &self,
        cutoff: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<Vec<Booking>, StoreError> {
        let rows: Vec<BookingRow> = sqlx::query_as(&format!(
            "UPDATE bookings
             SET status = 'cancelled', cancel_reason = 'payment_timeout', cancelled_at = $2
             WHERE status = 'pending'
               AND payment_status IN ('pending','failed')
               AND created_at < $1
             RETURNING {BOOKING_COLUMNS}"
        ))
        .bind(cutoff)
        .bind(now)
        .fetch_all(self.pool.as_ref())
        .await?;
        rows.into_iter().map(Booking::try_from).collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn active_status_sql_matches_domain_predicate() {
        let from_sql: Vec<BookingStatus> = ACTIVE_STATUSES_SQL
            .split(',')
            .map(|s| s.trim_matches('\'').parse().unwrap())
            .collect();
        for status in [
            BookingStatus::Pending,
            BookingStatus::Confirmed,
            BookingStatus::Ongoing,
            BookingStatus::Completed,
            BookingStatus::Cancelled,
        ] {
            assert_eq!(
                from_sql.contains(&status),
                status.is_active(),
                "SQL active list out of sync for {status}"
            );
        }
    }

    #[test]
    fn money_round_trips_through_bigint() {
        let amount = Money::from_ringgit(123);
        assert_eq!(money_from_db(money_to_db(amount).unwrap()).unwrap(), amount);
        assert!(money_from_db(-1).is_err());
        assert!(money_to_db(Money::from_sen(u64::MAX)).is_err());
    }
}
