//! Users and roles.

use crate::booking::UnknownVariant;
use crate::ids::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// What a user is allowed to do on the marketplace.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Rents vehicles.
    Renter,
    /// Lists vehicles for rent (and can rent too).
    Owner,
    /// Back-office staff.
    Admin,
}

impl Role {
    /// Database/API string form.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Renter => "renter",
            Self::Owner => "owner",
            Self::Admin => "admin",
        }
    }

    /// Whether the role grants back-office access.
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }

    /// Whether the role may create vehicle listings.
    #[must_use]
    pub const fn can_list_vehicles(&self) -> bool {
        matches!(self, Self::Owner | Self::Admin)
    }
}

impl FromStr for Role {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "renter" => Ok(Self::Renter),
            "owner" => Ok(Self::Owner),
            "admin" => Ok(Self::Admin),
            other => Err(UnknownVariant::new("role", other)),
        }
    }
}

/// A marketplace account.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// User id.
    pub id: UserId,
    /// Unique email address.
    pub email: String,
    /// Name shown on listings and reviews.
    pub display_name: String,
    /// Access role.
    pub role: Role,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_capabilities() {
        assert!(!Role::Renter.can_list_vehicles());
        assert!(Role::Owner.can_list_vehicles());
        assert!(Role::Admin.is_admin());
        assert!(!Role::Owner.is_admin());
    }
}
