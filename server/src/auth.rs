//! Bearer-token authentication.
//!
//! Registration hands out an opaque API token; requests present it as
//! `Authorization: Bearer <token>`. The [`AuthUser`] extractor resolves the
//! token to its account, so handlers that take an `AuthUser` are
//! authenticated by construction. Role and ownership checks stay in the
//! handlers, next to the operations they protect.

use crate::state::AppState;
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use rand::RngCore;
use sewa_core::User;
use sewa_web::AppError;

/// Length of generated API tokens in random bytes (hex doubles it).
const TOKEN_BYTES: usize = 32;

/// Generates a fresh opaque API token.
#[must_use]
pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    bytes.iter().map(|byte| format!("{byte:02x}")).collect()
}

fn bearer_token(parts: &Parts) -> Result<&str, AppError> {
    let header = parts
        .headers
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::unauthorized("missing authorization header"))?;
    let token = header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::unauthorized("expected 'Bearer <token>'"))?;
    if token.is_empty() {
        return Err(AppError::unauthorized("empty bearer token"));
    }
    Ok(token)
}

/// The authenticated account behind the request.
#[derive(Debug, Clone)]
pub struct AuthUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        let user = state
            .stores
            .users
            .find_by_token(token)
            .await
            .map_err(|e| AppError::internal("token lookup failed").with_source(e.into()))?
            .ok_or_else(|| AppError::unauthorized("unknown token"))?;
        Ok(Self(user))
    }
}

/// Same as [`AuthUser`] but rejects non-admin accounts with 403.
#[derive(Debug, Clone)]
pub struct AdminUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let AuthUser(user) = AuthUser::from_request_parts(parts, state).await?;
        if !user.role.is_admin() {
            return Err(AppError::forbidden("admin access required"));
        }
        Ok(Self(user))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn tokens_are_long_hex_and_unique() {
        let a = generate_token();
        let b = generate_token();
        assert_eq!(a.len(), TOKEN_BYTES * 2);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }
}
