//! Payment records.
//!
//! A [`Payment`] is the ledger entry for one successful gateway charge
//! against a booking. Charge attempts that fail at the gateway never produce
//! a record; they only flip the booking's payment status to `failed`.

use crate::booking::UnknownVariant;
use crate::ids::{BookingId, PaymentId};
use crate::money::Money;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// How the renter paid.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Credit or debit card.
    Card {
        /// Last four digits, for receipts.
        last_four: String,
    },
    /// FPX-style online bank transfer.
    BankTransfer {
        /// Bank reference string.
        reference: String,
    },
}

/// Ledger state of a captured payment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentState {
    /// Money captured.
    Captured,
    /// Money returned after cancellation.
    Refunded,
}

impl PaymentState {
    /// Database/API string form.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Captured => "captured",
            Self::Refunded => "refunded",
        }
    }
}

impl FromStr for PaymentState {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "captured" => Ok(Self::Captured),
            "refunded" => Ok(Self::Refunded),
            other => Err(UnknownVariant::new("payment state", other)),
        }
    }
}

/// A captured (and possibly refunded) charge for a booking.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    /// Payment id.
    pub id: PaymentId,
    /// Booking this payment settles.
    pub booking_id: BookingId,
    /// Amount captured.
    pub amount: Money,
    /// How the renter paid.
    pub method: PaymentMethod,
    /// Captured or refunded.
    pub state: PaymentState,
    /// Gateway-side transaction reference.
    pub transaction_id: String,
    /// When the charge was captured.
    pub created_at: DateTime<Utc>,
    /// When the refund was issued, if any.
    pub refunded_at: Option<DateTime<Utc>>,
}

impl Payment {
    /// Creates a freshly captured payment record.
    #[must_use]
    pub fn captured(
        booking_id: BookingId,
        amount: Money,
        method: PaymentMethod,
        transaction_id: String,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: PaymentId::new(),
            booking_id,
            amount,
            method,
            state: PaymentState::Captured,
            transaction_id,
            created_at: now,
            refunded_at: None,
        }
    }
}
