//! Review endpoints.

use crate::auth::AuthUser;
use crate::state::AppState;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sewa_core::{BookingId, BookingStatus, Rating, Review, ReviewId, VehicleId};
use sewa_web::AppError;
use uuid::Uuid;

/// Request to review a completed booking.
#[derive(Debug, Deserialize)]
pub struct CreateReviewRequest {
    /// Star rating, 1 to 5.
    pub rating: i16,
    /// Free-text comment.
    pub comment: String,
}

/// Public view of a review.
#[derive(Debug, Serialize)]
pub struct ReviewResponse {
    /// Review id.
    pub id: Uuid,
    /// Reviewed booking.
    pub booking_id: Uuid,
    /// Reviewed vehicle.
    pub vehicle_id: Uuid,
    /// Reviewer.
    pub renter_id: Uuid,
    /// Star rating.
    pub rating: i16,
    /// Comment.
    pub comment: String,
    /// When the review was left.
    pub created_at: DateTime<Utc>,
}

impl From<Review> for ReviewResponse {
    fn from(review: Review) -> Self {
        Self {
            id: *review.id.as_uuid(),
            booking_id: *review.booking_id.as_uuid(),
            vehicle_id: *review.vehicle_id.as_uuid(),
            renter_id: *review.renter_id.as_uuid(),
            rating: review.rating.value(),
            comment: review.comment,
            created_at: review.created_at,
        }
    }
}

/// `POST /api/bookings/:id/review`: only the renter, only after return,
/// only once.
pub async fn create(
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
    Json(request): Json<CreateReviewRequest>,
) -> Result<(StatusCode, Json<ReviewResponse>), AppError> {
    let rating = Rating::new(request.rating).map_err(|e| AppError::validation(e.to_string()))?;
    let booking_id = BookingId::from_uuid(id);
    let booking = state
        .stores
        .bookings
        .get(booking_id)
        .await
        .map_err(super::store_error)?
        .ok_or_else(|| AppError::not_found("booking", booking_id))?;

    if booking.renter_id != user.id {
        return Err(AppError::forbidden("only the renter can review a booking"));
    }
    if booking.status != BookingStatus::Completed {
        return Err(AppError::conflict("only completed rentals can be reviewed"));
    }

    let review = Review {
        id: ReviewId::new(),
        booking_id,
        vehicle_id: booking.vehicle_id,
        renter_id: user.id,
        rating,
        comment: request.comment.trim().to_string(),
        created_at: state.clock.now(),
    };
    // The unique index on booking_id turns a second attempt into a 409.
    state.stores.reviews.create(&review).await.map_err(super::store_error)?;

    tracing::info!(review_id = %review.id, vehicle_id = %review.vehicle_id, "review created");
    Ok((StatusCode::CREATED, Json(review.into())))
}

/// Reviews plus the aggregate, as vehicle pages want both.
#[derive(Debug, Serialize)]
pub struct VehicleReviewsResponse {
    /// Individual reviews, newest first.
    pub reviews: Vec<ReviewResponse>,
    /// Mean rating, when reviewed.
    pub average_rating: Option<f64>,
    /// Number of reviews.
    pub review_count: i64,
}

/// `GET /api/vehicles/:id/reviews`: public.
pub async fn list_for_vehicle(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<Json<VehicleReviewsResponse>, AppError> {
    let vehicle_id = VehicleId::from_uuid(id);
    let reviews = state
        .stores
        .reviews
        .list_for_vehicle(vehicle_id)
        .await
        .map_err(super::store_error)?;
    let summary = state
        .stores
        .reviews
        .summary_for_vehicle(vehicle_id)
        .await
        .map_err(super::store_error)?;
    Ok(Json(VehicleReviewsResponse {
        reviews: reviews.into_iter().map(ReviewResponse::from).collect(),
        average_rating: summary.average,
        review_count: summary.count,
    }))
}
