//! PostgreSQL persistence for the Sewa marketplace.
//!
//! One repository struct per aggregate, all sharing a single connection
//! pool. Queries are plain `sqlx::query_as` with binds, so the crate builds
//! without a live database; schema migrations are embedded and applied at
//! startup via [`pool::run_migrations`].
//!
//! The booking invariant (no overlapping active bookings per vehicle) is
//! enforced in [`bookings::BookingStore::create`] and backstopped by the
//! `bookings_no_overlap` exclusion constraint; see the module docs in
//! [`bookings`].

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod bookings;
pub mod error;
pub mod payments;
pub mod pool;
pub mod reports;
pub mod reviews;
pub mod users;
pub mod vehicles;

pub use bookings::BookingStore;
pub use error::StoreError;
pub use payments::PaymentStore;
pub use pool::{PostgresConfig, connect, ping, run_migrations};
pub use reports::{DailyBookings, MarketSummary, ReportStore};
pub use reviews::{RatingSummary, ReviewStore};
pub use users::UserStore;
pub use vehicles::VehicleStore;

// Re-exported so the server crate does not need its own sqlx dependency.
pub use sqlx::PgPool;

use std::sync::Arc;

/// All repositories bundled over one pool.
#[derive(Clone)]
pub struct Stores {
    /// Booking repository (overlap guard, reaper sweep).
    pub bookings: BookingStore,
    /// Vehicle repository (listings, availability search).
    pub vehicles: VehicleStore,
    /// User repository (accounts, API tokens).
    pub users: UserStore,
    /// Payment ledger.
    pub payments: PaymentStore,
    /// Review repository.
    pub reviews: ReviewStore,
    /// Reporting aggregates.
    pub reports: ReportStore,
}

impl Stores {
    /// Builds every repository over the shared pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        let pool = Arc::new(pool);
        Self {
            bookings: BookingStore::new(Arc::clone(&pool)),
            vehicles: VehicleStore::new(Arc::clone(&pool)),
            users: UserStore::new(Arc::clone(&pool)),
            payments: PaymentStore::new(Arc::clone(&pool)),
            reviews: ReviewStore::new(Arc::clone(&pool)),
            reports: ReportStore::new(pool),
        }
    }
}
