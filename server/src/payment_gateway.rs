//! Payment gateway seam.
//!
//! Abstraction over payment processors (FPX, card acquirers). Production
//! wiring would add a real integration; development and tests use
//! [`MockPaymentGateway`], which approves everything, or the test-only
//! declining gateway.

use async_trait::async_trait;
use sewa_core::{BookingId, Money, PaymentMethod};
use thiserror::Error;

/// Gateway-side failure modes.
#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    /// The charge was declined.
    #[error("payment declined: {reason}")]
    Declined {
        /// Decline reason from the processor.
        reason: String,
    },
    /// The gateway could not be reached or timed out.
    #[error("payment gateway unreachable: {0}")]
    Unavailable(String),
}

/// A successful charge.
#[derive(Debug, Clone)]
pub struct ChargeReceipt {
    /// Processor-side transaction reference.
    pub transaction_id: String,
    /// Amount captured.
    pub amount: Money,
}

/// Abstraction over the payment processor.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Captures a charge for a booking.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError`] when the charge is declined or the gateway
    /// is unreachable.
    async fn charge(
        &self,
        booking_id: BookingId,
        amount: Money,
        method: &PaymentMethod,
    ) -> Result<ChargeReceipt, GatewayError>;

    /// Refunds a previously captured transaction.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError`] when the refund fails.
    async fn refund(&self, transaction_id: &str, amount: Money) -> Result<(), GatewayError>;
}

/// Development gateway: approves every charge and refund.
#[derive(Clone, Copy, Debug, Default)]
pub struct MockPaymentGateway;

#[async_trait]
impl PaymentGateway for MockPaymentGateway {
    async fn charge(
        &self,
        booking_id: BookingId,
        amount: Money,
        _method: &PaymentMethod,
    ) -> Result<ChargeReceipt, GatewayError> {
        let transaction_id = format!("mock_txn_{}", uuid::Uuid::new_v4());
        tracing::info!(
            booking_id = %booking_id,
            amount = %amount,
            transaction_id = %transaction_id,
            "mock charge captured"
        );
        Ok(ChargeReceipt { transaction_id, amount })
    }

    async fn refund(&self, transaction_id: &str, amount: Money) -> Result<(), GatewayError> {
        tracing::info!(
            transaction_id = %transaction_id,
            amount = %amount,
            "mock refund issued"
        );
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod declining {
    //! A gateway that declines every charge, for failure-path tests.

    use super::{BookingId, ChargeReceipt, GatewayError, Money, PaymentGateway, async_trait};
    use sewa_core::PaymentMethod;

    /// Declines everything.
    #[derive(Clone, Copy, Debug, Default)]
    pub struct DecliningGateway;

    #[async_trait]
    impl PaymentGateway for DecliningGateway {
        async fn charge(
            &self,
            _booking_id: BookingId,
            _amount: Money,
            _method: &PaymentMethod,
        ) -> Result<ChargeReceipt, GatewayError> {
            Err(GatewayError::Declined { reason: "insufficient funds".to_string() })
        }

        async fn refund(&self, _transaction_id: &str, _amount: Money) -> Result<(), GatewayError> {
            Err(GatewayError::Unavailable("refunds disabled".to_string()))
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_gateway_captures_charges() {
        let gateway = MockPaymentGateway;
        let receipt = gateway
            .charge(
                BookingId::new(),
                Money::from_ringgit(600),
                &PaymentMethod::Card { last_four: "4242".to_string() },
            )
            .await
            .unwrap();
        assert!(receipt.transaction_id.starts_with("mock_txn_"));
        assert_eq!(receipt.amount, Money::from_ringgit(600));
    }
}
