//! Traffic-violation records returned by JPJ lookups.

use crate::money::Money;
use crate::vehicle::Plate;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// An outstanding traffic summons for a vehicle.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// The plate the summons is registered against.
    pub plate: Plate,
    /// Offence description as reported by JPJ.
    pub offence: String,
    /// Where the offence was recorded.
    pub location: String,
    /// Date of the offence.
    pub issued_on: NaiveDate,
    /// Outstanding fine amount.
    pub amount: Money,
}
