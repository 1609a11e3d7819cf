//! Entity identifiers.
//!
//! UUID-backed newtypes so a `BookingId` can never be passed where a
//! `VehicleId` is expected.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

macro_rules! entity_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// Creates a new random identifier.
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Wraps an existing `Uuid`.
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the inner `Uuid`.
            #[must_use]
            pub const fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

entity_id! {
    /// Unique identifier for a user (renter, owner, or admin).
    UserId
}

entity_id! {
    /// Unique identifier for a vehicle listing.
    VehicleId
}

entity_id! {
    /// Unique identifier for a booking.
    BookingId
}

entity_id! {
    /// Unique identifier for a payment record.
    PaymentId
}

entity_id! {
    /// Unique identifier for a review.
    ReviewId
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn ids_round_trip_through_uuid() {
        let id = BookingId::new();
        assert_eq!(BookingId::from_uuid(*id.as_uuid()), id);
    }

    #[test]
    fn ids_display_as_uuid() {
        let uuid = Uuid::new_v4();
        assert_eq!(VehicleId::from_uuid(uuid).to_string(), uuid.to_string());
    }
}
