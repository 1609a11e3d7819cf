//! Account endpoints.

use crate::auth::{AuthUser, generate_token};
use crate::state::AppState;
use axum::{Json, extract::State, http::StatusCode};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sewa_core::{Role, User, UserId};
use sewa_web::AppError;
use uuid::Uuid;

/// Registration request.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    /// Unique email address.
    pub email: String,
    /// Name shown on listings and reviews.
    pub display_name: String,
    /// `renter` or `owner`. Admin accounts are provisioned out of band.
    pub role: Role,
}

/// Registration response. The token is shown exactly once.
#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    /// The created account.
    pub user: UserResponse,
    /// Opaque bearer token for subsequent requests.
    pub api_token: String,
}

/// Public view of an account.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    /// User id.
    pub id: Uuid,
    /// Email address.
    pub email: String,
    /// Display name.
    pub display_name: String,
    /// Access role.
    pub role: Role,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: *user.id.as_uuid(),
            email: user.email,
            display_name: user.display_name,
            role: user.role,
            created_at: user.created_at,
        }
    }
}

/// `POST /api/users/register`: open endpoint.
pub async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), AppError> {
    if request.role.is_admin() {
        return Err(AppError::validation("admin accounts cannot self-register"));
    }
    let email = request.email.trim().to_ascii_lowercase();
    if !email.contains('@') {
        return Err(AppError::validation("invalid email address"));
    }
    let display_name = request.display_name.trim();
    if display_name.is_empty() {
        return Err(AppError::validation("display name must not be empty"));
    }

    let user = User {
        id: UserId::new(),
        email,
        display_name: display_name.to_string(),
        role: request.role,
        created_at: state.clock.now(),
    };
    let api_token = generate_token();
    state
        .stores
        .users
        .create(&user, &api_token)
        .await
        .map_err(super::store_error)?;

    tracing::info!(user_id = %user.id, role = user.role.as_str(), "user registered");
    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse { user: user.into(), api_token }),
    ))
}

/// `GET /api/users/me`.
pub async fn me(AuthUser(user): AuthUser) -> Json<UserResponse> {
    Json(user.into())
}
