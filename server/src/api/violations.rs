//! JPJ traffic-violation lookup endpoint.

use crate::auth::AuthUser;
use crate::jpj::JpjError;
use crate::state::AppState;
use axum::{
    Json,
    extract::{Path, Query, State},
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sewa_core::{Plate, Violation};
use sewa_web::AppError;

/// Lookup query parameters.
#[derive(Debug, Default, Deserialize)]
pub struct LookupQuery {
    /// Skip the cache and query the gateway.
    #[serde(default)]
    pub refresh: bool,
}

/// One outstanding summons.
#[derive(Debug, Serialize)]
pub struct ViolationResponse {
    /// Offence description.
    pub offence: String,
    /// Where it was recorded.
    pub location: String,
    /// Date of the offence.
    pub issued_on: NaiveDate,
    /// Fine amount in sen.
    pub amount_sen: u64,
}

impl From<Violation> for ViolationResponse {
    fn from(violation: Violation) -> Self {
        Self {
            offence: violation.offence,
            location: violation.location,
            issued_on: violation.issued_on,
            amount_sen: violation.amount.sen(),
        }
    }
}

/// Lookup result.
#[derive(Debug, Serialize)]
pub struct LookupResponse {
    /// Normalized plate.
    pub plate: String,
    /// Outstanding summonses.
    pub violations: Vec<ViolationResponse>,
    /// Total outstanding fines in sen.
    pub total_outstanding_sen: u64,
    /// Whether the answer came from cache.
    pub from_cache: bool,
    /// When the gateway was last queried for this plate.
    pub fetched_at: DateTime<Utc>,
}

/// `GET /api/violations/:plate?refresh=`: authenticated; each gateway
/// round-trip costs a real SMS, hence the cache.
pub async fn lookup(
    AuthUser(_user): AuthUser,
    Path(plate): Path<String>,
    Query(query): Query<LookupQuery>,
    State(state): State<AppState>,
) -> Result<Json<LookupResponse>, AppError> {
    let plate = Plate::parse(&plate).map_err(|e| AppError::validation(e.to_string()))?;

    let outcome = state
        .jpj
        .lookup(&plate, query.refresh)
        .await
        .map_err(|e| match e {
            JpjError::Gateway(message) => AppError::upstream(format!("sms gateway: {message}")),
            JpjError::Parse(message) => {
                AppError::upstream(format!("unreadable JPJ reply: {message}"))
            }
        })?;

    let total_outstanding_sen = outcome.violations.iter().map(|v| v.amount.sen()).sum();
    Ok(Json(LookupResponse {
        plate: plate.as_str().to_string(),
        violations: outcome.violations.into_iter().map(ViolationResponse::from).collect(),
        total_outstanding_sen,
        from_cache: outcome.from_cache,
        fetched_at: outcome.fetched_at,
    }))
}
