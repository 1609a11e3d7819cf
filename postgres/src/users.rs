//! User accounts and API tokens.

use crate::error::StoreError;
use chrono::{DateTime, Utc};
use sewa_core::{Role, User, UserId};
use sqlx::PgPool;
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;

const USER_COLUMNS: &str = "id, email, display_name, role, created_at";

/// Repository for users.
#[derive(Clone)]
pub struct UserStore {
    pool: Arc<PgPool>,
}

#[derive(sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    email: String,
    display_name: String,
    role: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = StoreError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: UserId::from_uuid(row.id),
            email: row.email,
            display_name: row.display_name,
            role: Role::from_str(&row.role).map_err(|e| StoreError::Decode(e.to_string()))?,
            created_at: row.created_at,
        })
    }
}

impl UserStore {
    /// Creates a store over the shared pool.
    #[must_use]
    pub const fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// Inserts a new account with its API token.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Conflict`] when the email is already taken.
    pub async fn create(&self, user: &User, api_token: &str) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO users (id, email, display_name, role, api_token, created_at)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(user.id.as_uuid())
        .bind(&user.email)
        .bind(&user.display_name)
        .bind(user.role.as_str())
        .bind(api_token)
        .bind(user.created_at)
        .execute(self.pool.as_ref())
        .await
        .map_err(|e| StoreError::from_unique(e, "email already registered"))?;
        Ok(())
    }

    /// Fetches a user by id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] on query failure.
    pub async fn get(&self, id: UserId) -> Result<Option<User>, StoreError> {
        let row: Option<UserRow> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
                .bind(id.as_uuid())
                .fetch_optional(self.pool.as_ref())
                .await?;
        row.map(User::try_from).transpose()
    }

    /// Resolves a bearer token to its account. `None` means the token is
    /// unknown; the caller turns that into a 401.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] on query failure.
    pub async fn find_by_token(&self, api_token: &str) -> Result<Option<User>, StoreError> {
        let row: Option<UserRow> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE api_token = $1"))
                .bind(api_token)
                .fetch_optional(self.pool.as_ref())
                .await?;
        row.map(User::try_from).transpose()
    }
}
