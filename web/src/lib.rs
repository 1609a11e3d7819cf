//! Web plumbing shared by Sewa's HTTP handlers.
//!
//! Provides [`error::AppError`], the single error type every handler
//! returns, and [`middleware::request_id_layer`] for per-request tracing
//! spans.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod middleware;

pub use error::AppError;
