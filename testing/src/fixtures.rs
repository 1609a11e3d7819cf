//! Builders for domain objects with sensible defaults.

use chrono::{DateTime, NaiveDate, Utc};
use sewa_core::{
    Booking, BookingId, BookingPeriod, ListingStatus, Money, Plate, Role, User, UserId, Vehicle,
    VehicleId,
};

/// The instant all fixtures default to.
#[must_use]
pub fn fixed_now() -> DateTime<Utc> {
    "2026-03-01T08:00:00Z".parse().unwrap()
}

/// Parses a `YYYY-MM-DD` date literal.
#[must_use]
pub fn date(s: &str) -> NaiveDate {
    s.parse().unwrap()
}

/// Builds a period from two date literals.
#[must_use]
pub fn period(start: &str, end: &str) -> BookingPeriod {
    BookingPeriod::new(date(start), date(end)).unwrap()
}

/// Builder for [`Booking`] fixtures.
#[derive(Debug)]
pub struct BookingBuilder {
    vehicle_id: VehicleId,
    renter_id: UserId,
    period: BookingPeriod,
    daily_rate: Money,
    created_at: DateTime<Utc>,
}

impl BookingBuilder {
    /// Reserve this vehicle.
    #[must_use]
    pub const fn vehicle(mut self, id: VehicleId) -> Self {
        self.vehicle_id = id;
        self
    }

    /// Book on behalf of this renter.
    #[must_use]
    pub const fn renter(mut self, id: UserId) -> Self {
        self.renter_id = id;
        self
    }

    /// Use this rental period.
    #[must_use]
    pub const fn period(mut self, period: BookingPeriod) -> Self {
        self.period = period;
        self
    }

    /// Use this daily rate.
    #[must_use]
    pub const fn daily_rate(mut self, rate: Money) -> Self {
        self.daily_rate = rate;
        self
    }

    /// Place the booking at this instant.
    #[must_use]
    pub const fn created_at(mut self, at: DateTime<Utc>) -> Self {
        self.created_at = at;
        self
    }

    /// Builds the pending booking.
    #[must_use]
    pub fn build(self) -> Booking {
        Booking::place(
            BookingId::new(),
            self.vehicle_id,
            self.renter_id,
            self.period,
            self.daily_rate,
            self.created_at,
        )
        .unwrap()
    }
}

/// A pending booking for 2026-03-10..2026-03-15 at RM120/day.
#[must_use]
pub fn booking() -> BookingBuilder {
    BookingBuilder {
        vehicle_id: VehicleId::new(),
        renter_id: UserId::new(),
        period: period("2026-03-10", "2026-03-15"),
        daily_rate: Money::from_ringgit(120),
        created_at: fixed_now(),
    }
}

/// A listed Perodua Myvi owned by a fresh user.
#[must_use]
pub fn vehicle(owner_id: UserId) -> Vehicle {
    Vehicle {
        id: VehicleId::new(),
        owner_id,
        plate: Plate::parse("WXY 1234").unwrap(),
        make: "Perodua".to_string(),
        model: "Myvi".to_string(),
        year: 2023,
        daily_rate: Money::from_ringgit(120),
        listing_status: ListingStatus::Listed,
        created_at: fixed_now(),
    }
}

/// A user with the given role.
#[must_use]
pub fn user(role: Role) -> User {
    let id = UserId::new();
    User {
        id,
        email: format!("{id}@example.my"),
        display_name: "Test User".to_string(),
        role,
        created_at: fixed_now(),
    }
}
