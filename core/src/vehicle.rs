//! Vehicle listings and registration plates.

use crate::booking::UnknownVariant;
use crate::ids::{UserId, VehicleId};
use crate::money::Money;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error normalizing a registration plate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlateError {
    /// Nothing left after stripping separators.
    #[error("registration plate is empty")]
    Empty,
    /// Plates are short; anything longer is a typo or junk input.
    #[error("registration plate is too long: {0}")]
    TooLong(String),
    /// Only letters and digits survive normalization.
    #[error("registration plate contains invalid character {0:?}")]
    InvalidChar(char),
}

/// A normalized Malaysian registration plate (uppercase, no separators).
///
/// `wxy 1234` and `WXY-1234` both normalize to `WXY1234`, so plate equality
/// and cache keys behave the way people expect.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Plate(String);

impl Plate {
    const MAX_LEN: usize = 12;

    /// Normalizes and validates a raw plate string.
    ///
    /// # Errors
    ///
    /// Returns a [`PlateError`] for empty, overlong, or non-alphanumeric
    /// input.
    pub fn parse(raw: &str) -> Result<Self, PlateError> {
        let mut normalized = String::with_capacity(raw.len());
        for c in raw.chars() {
            if c.is_whitespace() || c == '-' {
                continue;
            }
            if !c.is_ascii_alphanumeric() {
                return Err(PlateError::InvalidChar(c));
            }
            normalized.push(c.to_ascii_uppercase());
        }
        if normalized.is_empty() {
            return Err(PlateError::Empty);
        }
        if normalized.len() > Self::MAX_LEN {
            return Err(PlateError::TooLong(normalized));
        }
        Ok(Self(normalized))
    }

    /// The normalized plate string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Plate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Plate {
    type Err = PlateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Marketplace visibility of a vehicle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingStatus {
    /// Created but not yet published.
    Draft,
    /// Bookable.
    Listed,
    /// Hidden from search. Existing bookings are unaffected.
    Delisted,
}

impl ListingStatus {
    /// Database/API string form.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Listed => "listed",
            Self::Delisted => "delisted",
        }
    }
}

impl FromStr for ListingStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(Self::Draft),
            "listed" => Ok(Self::Listed),
            "delisted" => Ok(Self::Delisted),
            other => Err(UnknownVariant::new("listing status", other)),
        }
    }
}

/// A vehicle offered on the marketplace.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vehicle {
    /// Vehicle id.
    pub id: VehicleId,
    /// Owning user.
    pub owner_id: UserId,
    /// Registration plate.
    pub plate: Plate,
    /// Manufacturer, e.g. "Perodua".
    pub make: String,
    /// Model, e.g. "Myvi".
    pub model: String,
    /// Model year.
    pub year: i32,
    /// Price per rental day.
    pub daily_rate: Money,
    /// Marketplace visibility.
    pub listing_status: ListingStatus,
    /// When the listing was created.
    pub created_at: DateTime<Utc>,
}

impl Vehicle {
    /// Whether the vehicle can currently accept new bookings.
    #[must_use]
    pub const fn is_bookable(&self) -> bool {
        matches!(self.listing_status, ListingStatus::Listed)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn plates_normalize_case_and_separators() {
        assert_eq!(Plate::parse("wxy 1234").unwrap().as_str(), "WXY1234");
        assert_eq!(Plate::parse("WXY-1234").unwrap().as_str(), "WXY1234");
        assert_eq!(
            Plate::parse("wxy 1234").unwrap(),
            Plate::parse("WXY1234").unwrap()
        );
    }

    #[test]
    fn plates_reject_junk() {
        assert_eq!(Plate::parse("  - "), Err(PlateError::Empty));
        assert_eq!(Plate::parse("WXY_1234"), Err(PlateError::InvalidChar('_')));
        assert!(matches!(
            Plate::parse("ABCDEFGH1234567"),
            Err(PlateError::TooLong(_))
        ));
    }

    #[test]
    fn only_listed_vehicles_are_bookable() {
        for (status, bookable) in [
            (ListingStatus::Draft, false),
            (ListingStatus::Listed, true),
            (ListingStatus::Delisted, false),
        ] {
            let vehicle = Vehicle {
                id: VehicleId::new(),
                owner_id: UserId::new(),
                plate: Plate::parse("VGR 77").unwrap(),
                make: "Proton".to_string(),
                model: "Saga".to_string(),
                year: 2022,
                daily_rate: Money::from_ringgit(95),
                listing_status: status,
                created_at: Utc::now(),
            };
            assert_eq!(vehicle.is_bookable(), bookable);
        }
    }
}
