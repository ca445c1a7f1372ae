use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::{error::AppError, state::SharedState};

/// Proof that the request carries the configured moderator token.
pub struct Moderator;

impl FromRequestParts<SharedState> for Moderator {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        let Some(expected) = state.config().moderator_token.as_deref() else {
            return Err(AppError::Unauthorized(
                "app settings are read-only on this server".into(),
            ));
        };

        let presented = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim);

        match presented {
            Some(token) if token == expected => Ok(Moderator),
            Some(_) => Err(AppError::Unauthorized("invalid moderator token".into())),
            None => Err(AppError::Unauthorized("moderator token required".into())),
        }
    }
}
