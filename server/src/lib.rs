//! Sewa: car-rental marketplace back office.
//!
//! HTTP server tying the domain model (`sewa-core`) and the storage layer
//! (`sewa-postgres`) together:
//!
//! - [`api`]: axum handlers for users, fleet, bookings, payments, reviews,
//!   JPJ violation lookups, and admin reports
//! - [`reaper`]: background task cancelling bookings stuck pending payment
//! - [`payment_gateway`] / [`notify`] / [`jpj`]: seams to the outside
//!   world, each a trait with a development implementation
//! - [`config`]: environment-driven configuration
//! - [`metrics`]: Prometheus business metrics
//!
//! The binary lives in `main.rs`; everything is exported here so
//! integration tests can assemble the same pieces.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod api;
pub mod auth;
pub mod config;
pub mod jpj;
pub mod metrics;
pub mod notify;
pub mod payment_gateway;
pub mod reaper;
pub mod state;

pub use config::Config;
pub use state::AppState;
