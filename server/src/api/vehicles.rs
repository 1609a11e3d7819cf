//! Fleet endpoints: listings, availability search, booking calendar.

use crate::auth::AuthUser;
use crate::state::AppState;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sewa_core::{
    BookingPeriod, BookingStatus, ListingStatus, Money, Plate, User, Vehicle, VehicleId,
};
use sewa_web::AppError;
use uuid::Uuid;

/// Request to create or update a vehicle listing.
#[derive(Debug, Deserialize)]
pub struct VehicleRequest {
    /// Registration plate (any familiar formatting).
    pub plate: String,
    /// Manufacturer.
    pub make: String,
    /// Model.
    pub model: String,
    /// Model year.
    pub year: i32,
    /// Price per rental day, in sen.
    pub daily_rate_sen: u64,
}

/// Public view of a vehicle.
#[derive(Debug, Serialize)]
pub struct VehicleResponse {
    /// Vehicle id.
    pub id: Uuid,
    /// Owner id.
    pub owner_id: Uuid,
    /// Normalized plate.
    pub plate: String,
    /// Manufacturer.
    pub make: String,
    /// Model.
    pub model: String,
    /// Model year.
    pub year: i32,
    /// Price per rental day, in sen.
    pub daily_rate_sen: u64,
    /// Marketplace visibility.
    pub listing_status: ListingStatus,
    /// When the listing was created.
    pub created_at: DateTime<Utc>,
}

impl From<Vehicle> for VehicleResponse {
    fn from(vehicle: Vehicle) -> Self {
        Self {
            id: *vehicle.id.as_uuid(),
            owner_id: *vehicle.owner_id.as_uuid(),
            plate: vehicle.plate.as_str().to_string(),
            make: vehicle.make,
            model: vehicle.model,
            year: vehicle.year,
            daily_rate_sen: vehicle.daily_rate.sen(),
            listing_status: vehicle.listing_status,
            created_at: vehicle.created_at,
        }
    }
}

/// Vehicle detail including the rating aggregate.
#[derive(Debug, Serialize)]
pub struct VehicleDetailResponse {
    /// The vehicle.
    #[serde(flatten)]
    pub vehicle: VehicleResponse,
    /// Mean rating, when reviewed.
    pub average_rating: Option<f64>,
    /// Number of reviews.
    pub review_count: i64,
}

const fn plausible_year(year: i32) -> bool {
    matches!(year, 1980..=2100)
}

fn validate_request(request: &VehicleRequest) -> Result<(Plate, Money), AppError> {
    let plate = Plate::parse(&request.plate).map_err(|e| AppError::validation(e.to_string()))?;
    if request.make.trim().is_empty() || request.model.trim().is_empty() {
        return Err(AppError::validation("make and model must not be empty"));
    }
    if !plausible_year(request.year) {
        return Err(AppError::validation(format!("implausible model year {}", request.year)));
    }
    if request.daily_rate_sen == 0 {
        return Err(AppError::validation("daily rate must be positive"));
    }
    Ok((plate, Money::from_sen(request.daily_rate_sen)))
}

/// `POST /api/vehicles`: owners and admins only.
pub async fn create(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(request): Json<VehicleRequest>,
) -> Result<(StatusCode, Json<VehicleResponse>), AppError> {
    if !user.role.can_list_vehicles() {
        return Err(AppError::forbidden("only owners can list vehicles"));
    }
    let (plate, daily_rate) = validate_request(&request)?;

    let vehicle = Vehicle {
        id: VehicleId::new(),
        owner_id: user.id,
        plate,
        make: request.make.trim().to_string(),
        model: request.model.trim().to_string(),
        year: request.year,
        daily_rate,
        listing_status: ListingStatus::Draft,
        created_at: state.clock.now(),
    };
    state.stores.vehicles.create(&vehicle).await.map_err(super::store_error)?;

    tracing::info!(vehicle_id = %vehicle.id, plate = %vehicle.plate, "vehicle created");
    Ok((StatusCode::CREATED, Json(vehicle.into())))
}

/// `GET /api/vehicles`: the caller's own fleet.
pub async fn list_mine(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<VehicleResponse>>, AppError> {
    let vehicles = state
        .stores
        .vehicles
        .list_for_owner(user.id)
        .await
        .map_err(super::store_error)?;
    Ok(Json(vehicles.into_iter().map(VehicleResponse::from).collect()))
}

/// `GET /api/vehicles/:id`: public detail with rating aggregate.
pub async fn get_vehicle(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<Json<VehicleDetailResponse>, AppError> {
    let id = VehicleId::from_uuid(id);
    let vehicle = state
        .stores
        .vehicles
        .get(id)
        .await
        .map_err(super::store_error)?
        .ok_or_else(|| AppError::not_found("vehicle", id))?;
    let summary = state
        .stores
        .reviews
        .summary_for_vehicle(id)
        .await
        .map_err(super::store_error)?;
    Ok(Json(VehicleDetailResponse {
        vehicle: vehicle.into(),
        average_rating: summary.average,
        review_count: summary.count,
    }))
}

pub(crate) fn require_owner_or_admin(user: &User, vehicle: &Vehicle) -> Result<(), AppError> {
    if user.id == vehicle.owner_id || user.role.is_admin() {
        Ok(())
    } else {
        Err(AppError::forbidden("not your vehicle"))
    }
}

pub(crate) async fn load_vehicle(
    state: &AppState,
    id: VehicleId,
) -> Result<Vehicle, AppError> {
    state
        .stores
        .vehicles
        .get(id)
        .await
        .map_err(super::store_error)?
        .ok_or_else(|| AppError::not_found("vehicle", id))
}

/// `PUT /api/vehicles/:id`: owner or admin.
pub async fn update(
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
    Json(request): Json<VehicleRequest>,
) -> Result<Json<VehicleResponse>, AppError> {
    let id = VehicleId::from_uuid(id);
    let vehicle = load_vehicle(&state, id).await?;
    require_owner_or_admin(&user, &vehicle)?;
    let (plate, daily_rate) = validate_request(&request)?;
    if plate != vehicle.plate {
        return Err(AppError::validation("a listing's plate cannot change"));
    }

    state
        .stores
        .vehicles
        .update_details(id, request.make.trim(), request.model.trim(), request.year, daily_rate)
        .await
        .map_err(super::store_error)?;
    let updated = load_vehicle(&state, id).await?;
    Ok(Json(updated.into()))
}

async fn set_listing(
    user: &User,
    state: &AppState,
    id: VehicleId,
    status: ListingStatus,
) -> Result<Json<VehicleResponse>, AppError> {
    let vehicle = load_vehicle(state, id).await?;
    require_owner_or_admin(user, &vehicle)?;
    state
        .stores
        .vehicles
        .set_listing_status(id, status)
        .await
        .map_err(super::store_error)?;
    tracing::info!(vehicle_id = %id, status = status.as_str(), "listing status changed");
    let updated = load_vehicle(state, id).await?;
    Ok(Json(updated.into()))
}

/// `POST /api/vehicles/:id/list`: publish the listing.
pub async fn list_for_rent(
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<Json<VehicleResponse>, AppError> {
    set_listing(&user, &state, VehicleId::from_uuid(id), ListingStatus::Listed).await
}

/// `POST /api/vehicles/:id/delist`: hide from search. Existing bookings
/// are unaffected.
pub async fn delist(
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<Json<VehicleResponse>, AppError> {
    set_listing(&user, &state, VehicleId::from_uuid(id), ListingStatus::Delisted).await
}

/// Date-range query parameters.
#[derive(Debug, Deserialize)]
pub struct PeriodQuery {
    /// Pickup date.
    pub start: NaiveDate,
    /// Return date (exclusive).
    pub end: NaiveDate,
}

impl PeriodQuery {
    pub(crate) fn period(&self) -> Result<BookingPeriod, AppError> {
        BookingPeriod::new(self.start, self.end).map_err(|e| AppError::validation(e.to_string()))
    }
}

/// `GET /api/vehicles/search?start=&end=`: listed vehicles free for the
/// whole period.
pub async fn search_available(
    Query(query): Query<PeriodQuery>,
    State(state): State<AppState>,
) -> Result<Json<Vec<VehicleResponse>>, AppError> {
    let period = query.period()?;
    let vehicles = state
        .stores
        .vehicles
        .search_available(period)
        .await
        .map_err(super::store_error)?;
    Ok(Json(vehicles.into_iter().map(VehicleResponse::from).collect()))
}

/// One booked span in a vehicle's calendar.
#[derive(Debug, Serialize)]
pub struct CalendarEntry {
    /// Pickup date.
    pub start: NaiveDate,
    /// Return date (exclusive).
    pub end: NaiveDate,
    /// Why the span is blocked.
    pub status: BookingStatus,
}

/// `GET /api/vehicles/:id/calendar?start=&end=`: active booked spans
/// intersecting the window.
pub async fn calendar(
    Path(id): Path<Uuid>,
    Query(query): Query<PeriodQuery>,
    State(state): State<AppState>,
) -> Result<Json<Vec<CalendarEntry>>, AppError> {
    let id = VehicleId::from_uuid(id);
    load_vehicle(&state, id).await?;
    let window = query.period()?;
    let bookings = state
        .stores
        .bookings
        .active_for_vehicle_in(id, window)
        .await
        .map_err(super::store_error)?;
    Ok(Json(
        bookings
            .into_iter()
            .map(|b| CalendarEntry {
                start: b.period.start(),
                end: b.period.end(),
                status: b.status,
            })
            .collect(),
    ))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn request() -> VehicleRequest {
        VehicleRequest {
            plate: "wxy 1234".to_string(),
            make: "Perodua".to_string(),
            model: "Myvi".to_string(),
            year: 2023,
            daily_rate_sen: 12_000,
        }
    }

    #[test]
    fn valid_requests_normalize_the_plate() {
        let (plate, rate) = validate_request(&request()).unwrap();
        assert_eq!(plate.as_str(), "WXY1234");
        assert_eq!(rate, Money::from_sen(12_000));
    }

    #[test]
    fn zero_rate_and_bad_year_are_rejected() {
        let mut bad_rate = request();
        bad_rate.daily_rate_sen = 0;
        assert!(validate_request(&bad_rate).is_err());

        let mut bad_year = request();
        bad_year.year = 1899;
        assert!(validate_request(&bad_year).is_err());
    }

    #[test]
    fn junk_plates_are_rejected() {
        let mut bad = request();
        bad.plate = "W_1".to_string();
        assert!(validate_request(&bad).is_err());
    }
}
