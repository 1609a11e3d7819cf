//! Booking endpoints: the full lifecycle from placement to return.
//!
//! Placement runs the overlap guard; payment drives the gateway and the
//! `Confirm` transition; cancellation refunds captured charges. Transitions
//! are computed by the pure state machine in `sewa-core` and persisted with
//! an expected-status condition, so a racing reaper or second client can
//! never double-apply one.

use super::vehicles::{PeriodQuery, load_vehicle, require_owner_or_admin};
use crate::auth::AuthUser;
use crate::payment_gateway::GatewayError;
use crate::state::AppState;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sewa_core::{
    Booking, BookingCommand, BookingId, BookingStatus, CancelReason, Payment, PaymentMethod,
    PaymentStatus, User, VehicleId,
};
use sewa_web::AppError;
use uuid::Uuid;

/// Request to place a booking.
#[derive(Debug, Deserialize)]
pub struct PlaceBookingRequest {
    /// Vehicle to book.
    pub vehicle_id: Uuid,
    /// Pickup date.
    pub start: NaiveDate,
    /// Return date (exclusive).
    pub end: NaiveDate,
}

/// Public view of a booking.
#[derive(Debug, Serialize)]
pub struct BookingResponse {
    /// Booking id.
    pub id: Uuid,
    /// Booked vehicle.
    pub vehicle_id: Uuid,
    /// Renter.
    pub renter_id: Uuid,
    /// Pickup date.
    pub start: NaiveDate,
    /// Return date (exclusive).
    pub end: NaiveDate,
    /// Daily rate at booking time, in sen.
    pub daily_rate_sen: u64,
    /// Total amount, in sen.
    pub total_sen: u64,
    /// Lifecycle status.
    pub status: BookingStatus,
    /// Payment status.
    pub payment_status: PaymentStatus,
    /// Why the booking was cancelled, when it was.
    pub cancel_reason: Option<CancelReason>,
    /// When the booking was placed.
    pub created_at: DateTime<Utc>,
    /// Payment deadline, while the booking is pending.
    pub expires_at: Option<DateTime<Utc>>,
    /// When payment was captured.
    pub confirmed_at: Option<DateTime<Utc>>,
    /// When the vehicle came back.
    pub completed_at: Option<DateTime<Utc>>,
    /// When the booking was cancelled.
    pub cancelled_at: Option<DateTime<Utc>>,
}

impl BookingResponse {
    fn new(booking: Booking, pending_timeout: chrono::Duration) -> Self {
        let expires_at = (booking.status == BookingStatus::Pending)
            .then(|| booking.created_at + pending_timeout);
        Self {
            id: *booking.id.as_uuid(),
            vehicle_id: *booking.vehicle_id.as_uuid(),
            renter_id: *booking.renter_id.as_uuid(),
            start: booking.period.start(),
            end: booking.period.end(),
            daily_rate_sen: booking.daily_rate.sen(),
            total_sen: booking.total.sen(),
            status: booking.status,
            payment_status: booking.payment_status,
            cancel_reason: booking.cancel_reason,
            created_at: booking.created_at,
            expires_at,
            confirmed_at: booking.confirmed_at,
            completed_at: booking.completed_at,
            cancelled_at: booking.cancelled_at,
        }
    }
}

/// `POST /api/bookings`: place a booking; the vehicle is held until the
/// payment window elapses.
pub async fn place(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(request): Json<PlaceBookingRequest>,
) -> Result<(StatusCode, Json<BookingResponse>), AppError> {
    let period = PeriodQuery { start: request.start, end: request.end }.period()?;
    let now = state.clock.now();
    if period.start() < now.date_naive() {
        return Err(AppError::validation("rental cannot start in the past"));
    }

    let vehicle_id = VehicleId::from_uuid(request.vehicle_id);
    let vehicle = load_vehicle(&state, vehicle_id).await?;
    if !vehicle.is_bookable() {
        return Err(AppError::conflict("vehicle is not listed for rent"));
    }
    if vehicle.owner_id == user.id {
        return Err(AppError::validation("you cannot book your own vehicle"));
    }

    let booking = Booking::place(
        BookingId::new(),
        vehicle_id,
        user.id,
        period,
        vehicle.daily_rate,
        now,
    )
    .map_err(super::booking_error)?;

    // The guard (and, under races, the exclusion constraint) rejects
    // overlaps here.
    state.stores.bookings.create(&booking).await.map_err(super::store_error)?;
    crate::metrics::record_booking_placed();
    tracing::info!(
        booking_id = %booking.id,
        vehicle_id = %vehicle_id,
        period = %booking.period,
        total = %booking.total,
        "booking placed"
    );

    Ok((
        StatusCode::CREATED,
        Json(BookingResponse::new(booking, state.pending_timeout)),
    ))
}

/// `GET /api/bookings`: the caller's bookings.
pub async fn list_mine(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<BookingResponse>>, AppError> {
    let bookings = state
        .stores
        .bookings
        .list_for_renter(user.id)
        .await
        .map_err(super::store_error)?;
    Ok(Json(
        bookings
            .into_iter()
            .map(|b| BookingResponse::new(b, state.pending_timeout))
            .collect(),
    ))
}

async fn load_booking(state: &AppState, id: BookingId) -> Result<Booking, AppError> {
    state
        .stores
        .bookings
        .get(id)
        .await
        .map_err(super::store_error)?
        .ok_or_else(|| AppError::not_found("booking", id))
}

/// `GET /api/bookings/:id`: visible to the renter, the vehicle owner, and
/// admins.
pub async fn get_booking(
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<Json<BookingResponse>, AppError> {
    let booking = load_booking(&state, BookingId::from_uuid(id)).await?;
    if booking.renter_id != user.id && !user.role.is_admin() {
        let vehicle = load_vehicle(&state, booking.vehicle_id).await?;
        if vehicle.owner_id != user.id {
            return Err(AppError::forbidden("not your booking"));
        }
    }
    Ok(Json(BookingResponse::new(booking, state.pending_timeout)))
}

/// Payment request.
#[derive(Debug, Deserialize)]
pub struct PayRequest {
    /// How the renter pays.
    pub method: PaymentMethod,
}

/// `POST /api/bookings/:id/pay`: charge the renter and confirm the
/// booking.
pub async fn pay(
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
    Json(request): Json<PayRequest>,
) -> Result<Json<BookingResponse>, AppError> {
    let mut booking = load_booking(&state, BookingId::from_uuid(id)).await?;
    if booking.renter_id != user.id {
        return Err(AppError::forbidden("only the renter can pay for a booking"));
    }
    if booking.status != BookingStatus::Pending {
        return Err(AppError::conflict(format!(
            "cannot pay a {} booking",
            booking.status
        )));
    }

    let now = state.clock.now();
    let receipt = match state.gateway.charge(booking.id, booking.total, &request.method).await {
        Ok(receipt) => receipt,
        Err(GatewayError::Declined { reason }) => {
            booking.apply(BookingCommand::FailPayment, now).map_err(super::booking_error)?;
            state
                .stores
                .bookings
                .persist_transition(&booking, BookingStatus::Pending)
                .await
                .map_err(super::store_error)?;
            tracing::info!(booking_id = %booking.id, reason = %reason, "payment declined");
            return Err(AppError::new(
                StatusCode::PAYMENT_REQUIRED,
                "PAYMENT_DECLINED",
                format!("payment declined: {reason}"),
            ));
        }
        Err(GatewayError::Unavailable(message)) => {
            return Err(AppError::upstream(format!("payment gateway unavailable: {message}")));
        }
    };

    booking.apply(BookingCommand::Confirm, now).map_err(super::booking_error)?;
    if let Err(err) = state
        .stores
        .bookings
        .persist_transition(&booking, BookingStatus::Pending)
        .await
    {
        // The booking changed while the charge was in flight (most likely
        // the reaper fired). Compensate: give the money back.
        tracing::warn!(
            booking_id = %booking.id,
            transaction_id = %receipt.transaction_id,
            "booking changed during charge; refunding"
        );
        if let Err(refund_err) = state.gateway.refund(&receipt.transaction_id, receipt.amount).await
        {
            tracing::error!(
                booking_id = %booking.id,
                transaction_id = %receipt.transaction_id,
                error = %refund_err,
                "compensating refund failed; needs manual follow-up"
            );
        }
        return Err(super::store_error(err));
    }

    let payment = Payment::captured(
        booking.id,
        receipt.amount,
        request.method,
        receipt.transaction_id,
        now,
    );
    state.stores.payments.record(&payment).await.map_err(super::store_error)?;

    crate::metrics::record_booking_confirmed(booking.total.sen());
    state.notifier.booking_confirmed(&booking).await;
    tracing::info!(booking_id = %booking.id, total = %booking.total, "booking confirmed");

    Ok(Json(BookingResponse::new(booking, state.pending_timeout)))
}

/// Cancellation request.
#[derive(Debug, Default, Deserialize)]
pub struct CancelRequest {
    /// Optional free-text reason, logged only.
    pub note: Option<String>,
}

async fn cancel_reason_for(
    state: &AppState,
    user: &User,
    booking: &Booking,
) -> Result<CancelReason, AppError> {
    if booking.renter_id == user.id {
        return Ok(CancelReason::Renter);
    }
    if user.role.is_admin() {
        return Ok(CancelReason::Admin);
    }
    let vehicle = load_vehicle(state, booking.vehicle_id).await?;
    if vehicle.owner_id == user.id {
        return Ok(CancelReason::Owner);
    }
    Err(AppError::forbidden("not your booking"))
}

/// `POST /api/bookings/:id/cancel`: renter, owner (before payment), or
/// admin. Captured payments are refunded.
pub async fn cancel(
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
    Json(request): Json<CancelRequest>,
) -> Result<Json<BookingResponse>, AppError> {
    let mut booking = load_booking(&state, BookingId::from_uuid(id)).await?;
    let by = cancel_reason_for(&state, &user, &booking).await?;
    let expected = booking.status;

    let now = state.clock.now();
    let event = booking
        .apply(BookingCommand::Cancel { by }, now)
        .map_err(super::booking_error)?;
    state
        .stores
        .bookings
        .persist_transition(&booking, expected)
        .await
        .map_err(super::store_error)?;

    let mut refunded_sen = None;
    if let sewa_core::BookingEvent::Cancelled { refunded: true, .. } = event {
        refunded_sen = Some(booking.total.sen());
        refund_captured_payment(&state, &booking, now).await;
    }

    crate::metrics::record_booking_cancelled(refunded_sen);
    state.notifier.booking_cancelled(&booking, by).await;
    tracing::info!(
        booking_id = %booking.id,
        by = by.as_str(),
        note = request.note.as_deref().unwrap_or(""),
        refunded = refunded_sen.is_some(),
        "booking cancelled"
    );

    Ok(Json(BookingResponse::new(booking, state.pending_timeout)))
}

/// Refunds the captured payment for a cancelled booking. Failures are
/// logged for manual follow-up rather than failing the cancellation; the
/// booking is already cancelled and the vehicle released.
async fn refund_captured_payment(state: &AppState, booking: &Booking, now: DateTime<Utc>) {
    let payment = match state.stores.payments.captured_for_booking(booking.id).await {
        Ok(Some(payment)) => payment,
        Ok(None) => {
            tracing::error!(booking_id = %booking.id, "refund due but no captured payment found");
            return;
        }
        Err(err) => {
            tracing::error!(booking_id = %booking.id, error = %err, "refund lookup failed");
            return;
        }
    };
    if let Err(err) = state.gateway.refund(&payment.transaction_id, payment.amount).await {
        tracing::error!(
            booking_id = %booking.id,
            transaction_id = %payment.transaction_id,
            error = %err,
            "gateway refund failed; needs manual follow-up"
        );
        return;
    }
    if let Err(err) = state.stores.payments.mark_refunded(payment.id, now).await {
        tracing::error!(
            booking_id = %booking.id,
            payment_id = %payment.id,
            error = %err,
            "refund succeeded but ledger update failed"
        );
    }
}

/// `POST /api/bookings/:id/pickup`: the owner hands the vehicle over.
pub async fn pickup(
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<Json<BookingResponse>, AppError> {
    transition_by_owner(user, id, state, BookingCommand::PickUp).await
}

/// `POST /api/bookings/:id/return`: the rental ends.
pub async fn return_vehicle(
    AuthUser(user): AuthUser,
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<Json<BookingResponse>, AppError> {
    let response = transition_by_owner(user, id, state, BookingCommand::Return).await?;
    crate::metrics::record_booking_completed();
    Ok(response)
}

async fn transition_by_owner(
    user: User,
    id: Uuid,
    state: AppState,
    command: BookingCommand,
) -> Result<Json<BookingResponse>, AppError> {
    let mut booking = load_booking(&state, BookingId::from_uuid(id)).await?;
    let vehicle = load_vehicle(&state, booking.vehicle_id).await?;
    require_owner_or_admin(&user, &vehicle)?;

    let expected = booking.status;
    booking.apply(command, state.clock.now()).map_err(super::booking_error)?;
    state
        .stores
        .bookings
        .persist_transition(&booking, expected)
        .await
        .map_err(super::store_error)?;

    tracing::info!(booking_id = %booking.id, status = %booking.status, "booking transitioned");
    Ok(Json(BookingResponse::new(booking, state.pending_timeout)))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use sewa_testing::fixtures;

    #[test]
    fn pending_bookings_expose_a_payment_deadline() {
        let booking = fixtures::booking().build();
        let created_at = booking.created_at;
        let response = BookingResponse::new(booking, chrono::Duration::minutes(60));
        assert_eq!(response.expires_at, Some(created_at + chrono::Duration::minutes(60)));
    }

    #[test]
    fn confirmed_bookings_have_no_deadline() {
        let mut booking = fixtures::booking().build();
        booking.apply(BookingCommand::Confirm, fixtures::fixed_now()).unwrap();
        let response = BookingResponse::new(booking, chrono::Duration::minutes(60));
        assert_eq!(response.expires_at, None);
        assert_eq!(response.payment_status, PaymentStatus::Paid);
    }
}
