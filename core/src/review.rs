//! Reviews left by renters after completed rentals.

use crate::ids::{BookingId, ReviewId, UserId, VehicleId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error constructing a [`Rating`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("rating must be between 1 and 5, got {0}")]
pub struct RatingError(pub i16);

/// A star rating from 1 to 5.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Rating(i16);

impl Rating {
    /// Validates a raw rating value.
    ///
    /// # Errors
    ///
    /// Returns [`RatingError`] when `value` is outside `1..=5`.
    pub const fn new(value: i16) -> Result<Self, RatingError> {
        if matches!(value, 1..=5) {
            Ok(Self(value))
        } else {
            Err(RatingError(value))
        }
    }

    /// The rating value.
    #[must_use]
    pub const fn value(&self) -> i16 {
        self.0
    }
}

/// A renter's review of a vehicle, tied to one completed booking.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    /// Review id.
    pub id: ReviewId,
    /// The completed booking being reviewed. One review per booking.
    pub booking_id: BookingId,
    /// Reviewed vehicle.
    pub vehicle_id: VehicleId,
    /// Reviewing renter.
    pub renter_id: UserId,
    /// Star rating.
    pub rating: Rating,
    /// Free-text comment.
    pub comment: String,
    /// When the review was left.
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn ratings_are_clamped_to_one_through_five() {
        assert!(Rating::new(1).is_ok());
        assert!(Rating::new(5).is_ok());
        assert_eq!(Rating::new(0), Err(RatingError(0)));
        assert_eq!(Rating::new(6), Err(RatingError(6)));
        assert_eq!(Rating::new(3).unwrap().value(), 3);
    }
}
