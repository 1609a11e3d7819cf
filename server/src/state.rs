//! Shared application state.

use crate::config::Config;
use crate::jpj::JpjService;
use crate::notify::Notifier;
use crate::payment_gateway::PaymentGateway;
use sewa_core::Clock;
use sewa_postgres::{PgPool, Stores};
use std::sync::Arc;

/// Dependencies shared by every handler.
#[derive(Clone)]
pub struct AppState {
    /// Repositories over the shared pool.
    pub stores: Stores,
    /// Raw pool handle, for the readiness probe.
    pub pool: PgPool,
    /// Time source.
    pub clock: Arc<dyn Clock>,
    /// Payment processor seam.
    pub gateway: Arc<dyn PaymentGateway>,
    /// Notification seam.
    pub notifier: Arc<dyn Notifier>,
    /// Cached JPJ lookups.
    pub jpj: Arc<JpjService>,
    /// How long a booking may sit pending payment (surfaced to clients).
    pub pending_timeout: chrono::Duration,
}

impl AppState {
    /// Assembles the application state.
    #[must_use]
    pub fn new(
        config: &Config,
        pool: PgPool,
        clock: Arc<dyn Clock>,
        gateway: Arc<dyn PaymentGateway>,
        notifier: Arc<dyn Notifier>,
        jpj: Arc<JpjService>,
    ) -> Self {
        Self {
            stores: Stores::new(pool.clone()),
            pool,
            clock,
            gateway,
            notifier,
            jpj,
            pending_timeout: config.reaper.pending_timeout,
        }
    }
}
