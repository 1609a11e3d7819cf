//! Payment ledger persistence.

use crate::bookings::{money_from_db, money_to_db};
use crate::error::StoreError;
use chrono::{DateTime, Utc};
use sewa_core::{BookingId, Payment, PaymentId, PaymentMethod, PaymentState};
use sqlx::PgPool;
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;

const PAYMENT_COLUMNS: &str =
    "id, booking_id, amount_sen, method, method_detail, state, transaction_id, created_at, refunded_at";

/// Repository for payments.
#[derive(Clone)]
pub struct PaymentStore {
    pool: Arc<PgPool>,
}

#[derive(sqlx::FromRow)]
struct PaymentRow {
    id: Uuid,
    booking_id: Uuid,
    amount_sen: i64,
    method: String,
    method_detail: String,
    state: String,
    transaction_id: String,
    created_at: DateTime<Utc>,
    refunded_at: Option<DateTime<Utc>>,
}

impl TryFrom<PaymentRow> for Payment {
    type Error = StoreError;

    fn try_from(row: PaymentRow) -> Result<Self, Self::Error> {
        let method = match row.method.as_str() {
            "card" => PaymentMethod::Card { last_four: row.method_detail },
            "bank_transfer" => PaymentMethod::BankTransfer { reference: row.method_detail },
            other => return Err(StoreError::Decode(format!("unknown payment method {other}"))),
        };
        Ok(Self {
            id: PaymentId::from_uuid(row.id),
            booking_id: BookingId::from_uuid(row.booking_id),
            amount: money_from_db(row.amount_sen)?,
            method,
            state: PaymentState::from_str(&row.state)
                .map_err(|e| StoreError::Decode(e.to_string()))?,
            transaction_id: row.transaction_id,
            created_at: row.created_at,
            refunded_at: row.refunded_at,
        })
    }
}

fn method_columns(method: &PaymentMethod) -> (&'static str, &str) {
    match method {
        PaymentMethod::Card { last_four } => ("card", last_four.as_str()),
        PaymentMethod::BankTransfer { reference } => ("bank_transfer", reference.as_str()),
    }
}

impl PaymentStore {
    /// Creates a store over the shared pool.
    #[must_use]
    pub const fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// Records a captured charge.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] on insert failure.
    pub async fn record(&self, payment: &Payment) -> Result<(), StoreError> {
        let (method, detail) = method_columns(&payment.method);
        sqlx::query(&format!(
            "INSERT INTO payments ({PAYMENT_COLUMNS})
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)"
        ))
        .bind(payment.id.as_uuid())
        .bind(payment.booking_id.as_uuid())
        .bind(money_to_db(payment.amount)?)
        .bind(method)
        .bind(detail)
        .bind(payment.state.as_str())
        .bind(&payment.transaction_id)
        .bind(payment.created_at)
        .bind(payment.refunded_at)
        .execute(self.pool.as_ref())
        .await?;
        Ok(())
    }

    /// The captured (not yet refunded) payment for a booking, if any.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] on query failure.
    pub async fn captured_for_booking(
        &self,
        booking_id: BookingId,
    ) -> Result<Option<Payment>, StoreError> {
        let row: Option<PaymentRow> = sqlx::query_as(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM payments
             WHERE booking_id = $1 AND state = 'captured'
             ORDER BY created_at DESC LIMIT 1"
        ))
        .bind(booking_id.as_uuid())
        .fetch_optional(self.pool.as_ref())
        .await?;
        row.map(Payment::try_from).transpose()
    }

    /// Marks a payment refunded.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Stale`] when the payment was not in `captured`
    /// state.
    pub async fn mark_refunded(
        &self,
        payment_id: PaymentId,
        now: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE payments SET state = 'refunded', refunded_at = $2
             WHERE id = $1 AND state = 'captured'",
        )
        .bind(payment_id.as_uuid())
        .bind(now)
        .execute(self.pool.as_ref())
        .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::Stale);
        }
        Ok(())
    }
}
