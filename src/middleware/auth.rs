use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::User,
    state::AppState,
};

/// Cookie carrying the session token for browser clients
pub const SESSION_COOKIE: &str = "session";

/// The signed-in user, resolved from the session token
///
/// Handlers that take this extractor reject requests without a valid session
/// with 401 before any handler code runs.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// Session token from `Authorization: Bearer <token>` or the session cookie
pub fn session_token(parts: &Parts) -> Option<Uuid> {
    let bearer = parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim);

    let cookie = || {
        parts
            .headers
            .get_all(header::COOKIE)
            .iter()
            .filter_map(|h| h.to_str().ok())
            .flat_map(|h| h.split(';'))
            .filter_map(|pair| pair.trim().split_once('='))
            .find(|(name, _)| *name == SESSION_COOKIE)
            .map(|(_, value)| value.trim())
    };

    bearer
        .or_else(cookie)
        .and_then(|token| Uuid::parse_str(token).ok())
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> AppResult<Self> {
        let token = session_token(parts).ok_or(AppError::Unauthorized)?;

        let user_id = state
            .store
            .resolve_session(token)
            .await?
            .ok_or(AppError::Unauthorized)?;

        let user = state
            .store
            .get_user(user_id)
            .await?
            .ok_or(AppError::Unauthorized)?;

        tracing::debug!(user_id = %user.id, "Resolved session");
        Ok(CurrentUser(user))
    }
}
