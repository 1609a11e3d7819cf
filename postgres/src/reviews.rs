//! Review persistence and rating aggregates.

use crate::error::StoreError;
use chrono::{DateTime, Utc};
use sewa_core::{BookingId, Rating, Review, ReviewId, UserId, VehicleId};
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

const REVIEW_COLUMNS: &str =
    "id, booking_id, vehicle_id, renter_id, rating, comment, created_at";

/// Aggregate rating for a vehicle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatingSummary {
    /// Mean rating, `None` when unreviewed.
    pub average: Option<f64>,
    /// Number of reviews.
    pub count: i64,
}

/// Repository for reviews.
#[derive(Clone)]
pub struct ReviewStore {
    pool: Arc<PgPool>,
}

#[derive(sqlx::FromRow)]
struct ReviewRow {
    id: Uuid,
    booking_id: Uuid,
    vehicle_id: Uuid,
    renter_id: Uuid,
    rating: i16,
    comment: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<ReviewRow> for Review {
    type Error = StoreError;

    fn try_from(row: ReviewRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: ReviewId::from_uuid(row.id),
            booking_id: BookingId::from_uuid(row.booking_id),
            vehicle_id: VehicleId::from_uuid(row.vehicle_id),
            renter_id: UserId::from_uuid(row.renter_id),
            rating: Rating::new(row.rating).map_err(|e| StoreError::Decode(e.to_string()))?,
            comment: row.comment,
            created_at: row.created_at,
        })
    }
}

impl ReviewStore {
    /// Creates a store over the shared pool.
    #[must_use]
    pub const fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// Inserts a review. The `booking_id` unique index enforces
    /// one-review-per-booking.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Conflict`] when the booking is already
    /// reviewed.
    pub async fn create(&self, review: &Review) -> Result<(), StoreError> {
        sqlx::query(&format!(
            "INSERT INTO reviews ({REVIEW_COLUMNS}) VALUES ($1, $2, $3, $4, $5, $6, $7)"
        ))
        .bind(review.id.as_uuid())
        .bind(review.booking_id.as_uuid())
        .bind(review.vehicle_id.as_uuid())
        .bind(review.renter_id.as_uuid())
        .bind(review.rating.value())
        .bind(&review.comment)
        .bind(review.created_at)
        .execute(self.pool.as_ref())
        .await
        .map_err(|e| StoreError::from_unique(e, "booking already reviewed"))?;
        Ok(())
    }

    /// Reviews for a vehicle, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] on query failure.
    pub async fn list_for_vehicle(&self, vehicle_id: VehicleId) -> Result<Vec<Review>, StoreError> {
        let rows: Vec<ReviewRow> = sqlx::query_as(&format!(
            "SELECT {REVIEW_COLUMNS} FROM reviews
             WHERE vehicle_id = $1 ORDER BY created_at DESC"
        ))
        .bind(vehicle_id.as_uuid())
        .fetch_all(self.pool.as_ref())
        .await?;
        rows.into_iter().map(Review::try_from).collect()
    }

    /// Average rating and review count for a vehicle.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] on query failure.
    pub async fn summary_for_vehicle(
        &self,
        vehicle_id: VehicleId,
    ) -> Result<RatingSummary, StoreError> {
        let (average, count): (Option<f64>, i64) = sqlx::query_as(
            "SELECT AVG(rating)::FLOAT8, COUNT(*) FROM reviews WHERE vehicle_id = $1",
        )
        .bind(vehicle_id.as_uuid())
        .fetch_one(self.pool.as_ref())
        .await?;
        Ok(RatingSummary { average, count })
    }
}
