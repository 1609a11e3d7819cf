//! HTTP surface: router assembly, health probes, and error mapping.

use crate::state::AppState;
use axum::{
    Json, Router,
    extract::State,
    routing::{get, post, put},
};
use serde::Serialize;
use sewa_core::BookingError;
use sewa_postgres::StoreError;
use sewa_web::{AppError, middleware::request_id_layer};

pub mod bookings;
pub mod reports;
pub mod reviews;
pub mod users;
pub mod vehicles;
pub mod violations;

/// Builds the complete router.
#[must_use]
pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        // Accounts
        .route("/users/register", post(users::register))
        .route("/users/me", get(users::me))
        // Fleet
        .route("/vehicles", post(vehicles::create).get(vehicles::list_mine))
        .route("/vehicles/search", get(vehicles::search_available))
        .route("/vehicles/:id", get(vehicles::get_vehicle).put(vehicles::update))
        .route("/vehicles/:id/list", post(vehicles::list_for_rent))
        .route("/vehicles/:id/delist", post(vehicles::delist))
        .route("/vehicles/:id/calendar", get(vehicles::calendar))
        .route("/vehicles/:id/reviews", get(reviews::list_for_vehicle))
        // Bookings
        .route("/bookings", post(bookings::place).get(bookings::list_mine))
        .route("/bookings/:id", get(bookings::get_booking))
        .route("/bookings/:id/pay", post(bookings::pay))
        .route("/bookings/:id/cancel", post(bookings::cancel))
        .route("/bookings/:id/pickup", post(bookings::pickup))
        .route("/bookings/:id/return", post(bookings::return_vehicle))
        .route("/bookings/:id/review", post(reviews::create))
        // Traffic violations
        .route("/violations/:plate", get(violations::lookup))
        // Back-office reports
        .route("/admin/reports/summary", get(reports::summary))
        .route("/admin/reports/bookings", get(reports::daily_bookings));

    Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready))
        .nest("/api", api)
        .layer(request_id_layer())
        .with_state(state)
}

/// Maps storage failures onto HTTP errors.
///
/// Overlap conflicts get their own stable code so booking clients can offer
/// "pick another date" instead of a generic error.
pub(crate) fn store_error(err: StoreError) -> AppError {
    match err {
        StoreError::OverlapConflict => {
            crate::metrics::record_booking_conflict();
            AppError::conflict_with_code(
                "BOOKING_CONFLICT",
                "vehicle already has an active booking overlapping the requested period",
            )
        }
        StoreError::NotFound { entity, id } => AppError::not_found(entity, id),
        StoreError::Conflict(message) => AppError::conflict(message),
        StoreError::Stale => AppError::conflict("record was modified concurrently, retry"),
        other => AppError::internal("database error").with_source(other.into()),
    }
}

/// Maps rejected lifecycle transitions onto HTTP errors.
pub(crate) fn booking_error(err: BookingError) -> AppError {
    match err {
        BookingError::AmountOverflow => AppError::validation(err.to_string()),
        _ => AppError::conflict(err.to_string()),
    }
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// Liveness probe.
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok", version: env!("CARGO_PKG_VERSION") })
}

/// Readiness probe: pings the database.
async fn ready(State(state): State<AppState>) -> Result<Json<HealthResponse>, AppError> {
    sewa_postgres::ping(&state.pool)
        .await
        .map_err(|e| AppError::unavailable("database unreachable").with_source(e.into()))?;
    Ok(Json(HealthResponse { status: "ready", version: env!("CARGO_PKG_VERSION") }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use sewa_core::BookingStatus;

    #[test]
    fn overlap_conflicts_use_the_booking_conflict_code() {
        let err = store_error(StoreError::OverlapConflict);
        assert_eq!(err.status(), StatusCode::CONFLICT);
        assert_eq!(err.code(), "BOOKING_CONFLICT");
    }

    #[test]
    fn missing_entities_map_to_404() {
        let err = store_error(StoreError::NotFound { entity: "vehicle", id: "v-1".to_string() });
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn rejected_transitions_map_to_409() {
        let err = booking_error(BookingError::InvalidTransition {
            status: BookingStatus::Completed,
            command: "confirm",
        });
        assert_eq!(err.status(), StatusCode::CONFLICT);
    }
}
