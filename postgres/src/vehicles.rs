//! Vehicle persistence and the availability search.

use crate::bookings::{ACTIVE_STATUSES_SQL, money_from_db, money_to_db};
use crate::error::StoreError;
use chrono::{DateTime, Utc};
use sewa_core::{BookingPeriod, ListingStatus, Money, Plate, UserId, Vehicle, VehicleId};
use sqlx::PgPool;
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;

const VEHICLE_COLUMNS: &str =
    "id, owner_id, plate, make, model, year, daily_rate_sen, listing_status, created_at";

/// Repository for vehicle listings.
#[derive(Clone)]
pub struct VehicleStore {
    pool: Arc<PgPool>,
}

#[derive(sqlx::FromRow)]
struct VehicleRow {
    id: Uuid,
    owner_id: Uuid,
    plate: String,
    make: String,
    model: String,
    year: i32,
    daily_rate_sen: i64,
    listing_status: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<VehicleRow> for Vehicle {
    type Error = StoreError;

    fn try_from(row: VehicleRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: VehicleId::from_uuid(row.id),
            owner_id: UserId::from_uuid(row.owner_id),
            plate: Plate::parse(&row.plate).map_err(|e| StoreError::Decode(e.to_string()))?,
            make: row.make,
            model: row.model,
            year: row.year,
            daily_rate: money_from_db(row.daily_rate_sen)?,
            listing_status: ListingStatus::from_str(&row.listing_status)
                .map_err(|e| StoreError::Decode(e.to_string()))?,
            created_at: row.created_at,
        })
    }
}

impl VehicleStore {
    /// Creates a store over the shared pool.
    #[must_use]
    pub const fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// Inserts a new vehicle.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Conflict`] when the plate is already listed.
    pub async fn create(&self, vehicle: &Vehicle) -> Result<(), StoreError> {
        sqlx::query(&format!(
            "INSERT INTO vehicles ({VEHICLE_COLUMNS})
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)"
        ))
        .bind(vehicle.id.as_uuid())
        .bind(vehicle.owner_id.as_uuid())
        .bind(vehicle.plate.as_str())
        .bind(&vehicle.make)
        .bind(&vehicle.model)
        .bind(vehicle.year)
        .bind(money_to_db(vehicle.daily_rate)?)
        .bind(vehicle.listing_status.as_str())
        .bind(vehicle.created_at)
        .execute(self.pool.as_ref())
        .await
        .map_err(|e| StoreError::from_unique(e, "plate already registered"))?;
        Ok(())
    }

    /// Fetches a vehicle by id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] on query failure.
    pub async fn get(&self, id: VehicleId) -> Result<Option<Vehicle>, StoreError> {
        let row: Option<VehicleRow> =
            sqlx::query_as(&format!("SELECT {VEHICLE_COLUMNS} FROM vehicles WHERE id = $1"))
                .bind(id.as_uuid())
                .fetch_optional(self.pool.as_ref())
                .await?;
        row.map(Vehicle::try_from).transpose()
    }

    /// All vehicles owned by a user.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] on query failure.
    pub async fn list_for_owner(&self, owner_id: UserId) -> Result<Vec<Vehicle>, StoreError> {
        let rows: Vec<VehicleRow> = sqlx::query_as(&format!(
            "SELECT {VEHICLE_COLUMNS} FROM vehicles WHERE owner_id = $1 ORDER BY created_at"
        ))
        .bind(owner_id.as_uuid())
        .fetch_all(self.pool.as_ref())
        .await?;
        rows.into_iter().map(Vehicle::try_from).collect()
    }

    /// Updates mutable listing fields (make, model, year, rate).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the vehicle does not exist.
    pub async fn update_details(
        &self,
        id: VehicleId,
        make: &str,
        model: &str,
        year: i32,
        daily_rate: Money,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE vehicles SET make = $2, model = $3, year = $4, daily_rate_sen = $5
             WHERE id = $1",
        )
        .bind(id.as_uuid())
        .bind(make)
        .bind(model)
        .bind(year)
        .bind(money_to_db(daily_rate)?)
        .execute(self.pool.as_ref())
        .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound { entity: "vehicle", id: id.to_string() });
        }
        Ok(())
    }

    /// Changes marketplace visibility. Existing bookings are unaffected.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if the vehicle does not exist.
    pub async fn set_listing_status(
        &self,
        id: VehicleId,
        status: ListingStatus,
    ) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE vehicles SET listing_status = $2 WHERE id = $1")
            .bind(id.as_uuid())
            .bind(status.as_str())
            .execute(self.pool.as_ref())
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound { entity: "vehicle", id: id.to_string() });
        }
        Ok(())
    }

    /// Listed vehicles free for the whole of `period`.
    ///
    /// A vehicle qualifies when no active booking overlaps the requested
    /// period; the same predicate the booking guard uses, negated.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] on query failure.
    pub async fn search_available(&self, period: BookingPeriod) -> Result<Vec<Vehicle>, StoreError> {
        let rows: Vec<VehicleRow> = sqlx::query_as(&format!(
            "SELECT {VEHICLE_COLUMNS} FROM vehicles v
             WHERE v.listing_status = 'listed'
               AND NOT EXISTS (
                   SELECT 1 FROM bookings b
                   WHERE b.vehicle_id = v.id
                     AND b.status IN ({ACTIVE_STATUSES_SQL})
                     AND b.start_date < $2 AND $1 < b.end_date)
             ORDER BY v.created_at"
        ))
        .bind(period.start())
        .bind(period.end())
        .fetch_all(self.pool.as_ref())
        .await?;
        rows.into_iter().map(Vehicle::try_from).collect()
    }
}
