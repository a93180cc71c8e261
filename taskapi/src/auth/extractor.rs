use axum::{extract::FromRequestParts, http::request::Parts};

use super::tokens;
use crate::entities::user;
use crate::errors::ApiError;
use crate::state::AppState;

/// The user behind the request's bearer token.
///
/// Rejects with 401 when the header is missing or the token is unknown.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user: user::Model,
    pub token_id: i32,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = tokens::bearer(&parts.headers).ok_or_else(ApiError::unauthenticated)?;

        let (access, user) = tokens::resolve(&state.db, token)
            .await?
            .ok_or_else(ApiError::unauthenticated)?;

        tracing::debug!(user_id = user.id, token_id = access.id, "authenticated request");
        Ok(Self {
            user,
            token_id: access.id,
        })
    }
}
