//! Back-office reporting endpoints (admin only).
//!
//! Booking pipeline counts, revenue, fleet size, and booking volume over
//! time; the numbers a back-office dashboard renders.

use crate::auth::AdminUser;
use crate::state::AppState;
use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;
use sewa_postgres::{DailyBookings, MarketSummary};
use sewa_web::AppError;

/// `GET /api/admin/reports/summary`.
pub async fn summary(
    AdminUser(_admin): AdminUser,
    State(state): State<AppState>,
) -> Result<Json<MarketSummary>, AppError> {
    let summary = state.stores.reports.summary().await.map_err(super::store_error)?;
    Ok(Json(summary))
}

/// Daily-series query parameters.
#[derive(Debug, Deserialize)]
pub struct DailyQuery {
    /// Trailing window in days (1–365, default 30).
    pub days: Option<i32>,
}

/// `GET /api/admin/reports/bookings?days=`.
pub async fn daily_bookings(
    AdminUser(_admin): AdminUser,
    Query(query): Query<DailyQuery>,
    State(state): State<AppState>,
) -> Result<Json<Vec<DailyBookings>>, AppError> {
    let days = query.days.unwrap_or(30);
    if !(1..=365).contains(&days) {
        return Err(AppError::validation("days must be between 1 and 365"));
    }
    let series = state
        .stores
        .reports
        .daily_bookings(days)
        .await
        .map_err(super::store_error)?;
    Ok(Json(series))
}
