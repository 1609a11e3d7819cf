//! Storage error type.

use thiserror::Error;

/// Errors surfaced by the store layer.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The requested period intersects an active booking for the vehicle.
    ///
    /// Raised by the transactional guard, or by PostgreSQL's exclusion
    /// constraint when two writers race past it.
    #[error("vehicle already has an active booking overlapping the requested period")]
    OverlapConflict,

    /// An entity referenced by id does not exist.
    #[error("{entity} {id} not found")]
    NotFound {
        /// Entity kind, e.g. `"vehicle"`.
        entity: &'static str,
        /// The missing id.
        id: String,
    },

    /// A uniqueness or state conflict (duplicate email, double review,
    /// concurrent status change).
    #[error("{0}")]
    Conflict(String),

    /// A row changed under us between read and guarded update.
    #[error("record was modified concurrently")]
    Stale,

    /// A stored value no longer parses into its domain type.
    #[error("corrupt row: {0}")]
    Decode(String),

    /// A domain value does not fit the storage column.
    #[error("value out of range for storage: {0}")]
    OutOfRange(String),

    /// Schema migration failure at startup.
    #[error("migration failed: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    /// Any other database failure.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl StoreError {
    /// SQLSTATE for an exclusion-constraint violation.
    const EXCLUSION_VIOLATION: &'static str = "23P01";
    /// SQLSTATE for a unique-constraint violation.
    const UNIQUE_VIOLATION: &'static str = "23505";

    /// Maps a raced insert against the `bookings_no_overlap` constraint to
    /// [`StoreError::OverlapConflict`].
    pub(crate) fn from_booking_insert(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db) = &err {
            if db.code().as_deref() == Some(Self::EXCLUSION_VIOLATION) {
                return Self::OverlapConflict;
            }
        }
        Self::Database(err)
    }

    /// Maps a unique violation to [`StoreError::Conflict`] with `message`.
    pub(crate) fn from_unique(err: sqlx::Error, message: &str) -> Self {
        if let sqlx::Error::Database(db) = &err {
            if db.code().as_deref() == Some(Self::UNIQUE_VIOLATION) {
                return Self::Conflict(message.to_string());
            }
        }
        Self::Database(err)
    }
}
