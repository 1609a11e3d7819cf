//! Business metrics.
//!
//! Prometheus counters and gauges for the marketplace:
//!
//! - `sewa_bookings_total{event}`: booking lifecycle events
//!   (placed, confirmed, cancelled, expired, completed)
//! - `sewa_bookings_reaped_total`: bookings cancelled by the reaper
//! - `sewa_booking_conflicts_total`: overlap guard rejections
//! - `sewa_revenue_sen_total` / `sewa_refunds_sen_total`: money captured
//!   and returned
//! - `sewa_jpj_lookups_total{source}`: violation lookups by cache/gateway
//! - `sewa_active_bookings`: bookings currently holding a vehicle

use metrics::{describe_counter, describe_gauge};

/// Registers metric descriptions. Call once at startup.
pub fn register() {
    describe_counter!(
        "sewa_bookings_total",
        "Booking lifecycle events by kind (placed, confirmed, cancelled, expired, completed)"
    );
    describe_counter!(
        "sewa_bookings_reaped_total",
        "Bookings cancelled by the expired-booking reaper"
    );
    describe_counter!(
        "sewa_booking_conflicts_total",
        "Booking attempts rejected by the overlap guard"
    );
    describe_counter!("sewa_revenue_sen_total", "Captured payment volume in sen");
    describe_counter!("sewa_refunds_sen_total", "Refunded payment volume in sen");
    describe_counter!(
        "sewa_jpj_lookups_total",
        "JPJ violation lookups by source (cache or gateway)"
    );
    describe_gauge!(
        "sewa_active_bookings",
        "Bookings currently holding a vehicle (pending, confirmed, or ongoing)"
    );
    tracing::info!("business metrics registered");
}

/// A booking was placed and now holds its vehicle.
pub fn record_booking_placed() {
    metrics::counter!("sewa_bookings_total", "event" => "placed").increment(1);
    metrics::gauge!("sewa_active_bookings").increment(1.0);
}

/// A booking was paid and confirmed.
pub fn record_booking_confirmed(amount_sen: u64) {
    metrics::counter!("sewa_bookings_total", "event" => "confirmed").increment(1);
    metrics::counter!("sewa_revenue_sen_total").increment(amount_sen);
}

/// A rental finished; the vehicle is free again.
pub fn record_booking_completed() {
    metrics::counter!("sewa_bookings_total", "event" => "completed").increment(1);
    metrics::gauge!("sewa_active_bookings").decrement(1.0);
}

/// A booking was cancelled by a person.
pub fn record_booking_cancelled(refunded_sen: Option<u64>) {
    metrics::counter!("sewa_bookings_total", "event" => "cancelled").increment(1);
    metrics::gauge!("sewa_active_bookings").decrement(1.0);
    if let Some(sen) = refunded_sen {
        metrics::counter!("sewa_refunds_sen_total").increment(sen);
    }
}

/// The reaper expired a stale pending booking.
pub fn record_booking_reaped() {
    metrics::counter!("sewa_bookings_total", "event" => "expired").increment(1);
    metrics::counter!("sewa_bookings_reaped_total").increment(1);
    metrics::gauge!("sewa_active_bookings").decrement(1.0);
}

/// The overlap guard rejected a booking attempt.
pub fn record_booking_conflict() {
    metrics::counter!("sewa_booking_conflicts_total").increment(1);
}

/// A JPJ lookup was answered, from cache or from the gateway.
pub fn record_jpj_lookup(from_cache: bool) {
    let source = if from_cache { "cache" } else { "gateway" };
    metrics::counter!("sewa_jpj_lookups_total", "source" => source).increment(1);
}
