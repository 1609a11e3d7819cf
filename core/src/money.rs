//! Money amounts in Malaysian sen.
//!
//! Stored as whole sen (1 ringgit = 100 sen) to avoid floating-point
//! arithmetic on currency.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A non-negative amount of money in sen.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(u64);

impl Money {
    /// Zero ringgit.
    pub const ZERO: Self = Self(0);

    /// Creates a `Money` value from sen.
    #[must_use]
    pub const fn from_sen(sen: u64) -> Self {
        Self(sen)
    }

    /// Creates a `Money` value from whole ringgit.
    ///
    /// # Panics
    ///
    /// Panics if `ringgit * 100` overflows `u64`. Use [`Self::checked_from_ringgit`]
    /// for a non-panicking conversion.
    #[must_use]
    #[allow(clippy::panic)]
    pub const fn from_ringgit(ringgit: u64) -> Self {
        match ringgit.checked_mul(100) {
            Some(sen) => Self(sen),
            None => panic!("Money::from_ringgit overflow"),
        }
    }

    /// Creates a `Money` value from whole ringgit with overflow checking.
    #[must_use]
    pub const fn checked_from_ringgit(ringgit: u64) -> Option<Self> {
        match ringgit.checked_mul(100) {
            Some(sen) => Some(Self(sen)),
            None => None,
        }
    }

    /// Returns the amount in sen.
    #[must_use]
    pub const fn sen(&self) -> u64 {
        self.0
    }

    /// Whether the amount is zero.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Adds two amounts with overflow checking.
    #[must_use]
    pub const fn checked_add(self, other: Self) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(sen) => Some(Self(sen)),
            None => None,
        }
    }

    /// Multiplies the amount by a count with overflow checking.
    ///
    /// Used to turn a daily rate into a rental total.
    #[must_use]
    pub const fn checked_multiply(self, count: u64) -> Option<Self> {
        match self.0.checked_mul(count) {
            Some(sen) => Some(Self(sen)),
            None => None,
        }
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RM{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn ringgit_is_hundred_sen() {
        assert_eq!(Money::from_ringgit(120), Money::from_sen(12_000));
    }

    #[test]
    fn display_formats_ringgit_and_sen() {
        assert_eq!(Money::from_sen(12_345).to_string(), "RM123.45");
        assert_eq!(Money::from_sen(5).to_string(), "RM0.05");
    }

    #[test]
    fn checked_multiply_detects_overflow() {
        assert_eq!(
            Money::from_sen(100).checked_multiply(3),
            Some(Money::from_sen(300))
        );
        assert!(Money::from_sen(u64::MAX).checked_multiply(2).is_none());
    }

    #[test]
    fn checked_add_detects_overflow() {
        let a = Money::from_sen(u64::MAX - 1);
        assert!(a.checked_add(Money::from_sen(2)).is_none());
        assert_eq!(a.checked_add(Money::from_sen(1)), Some(Money::from_sen(u64::MAX)));
    }
}
