use std::collections::HashMap;

use axum::{
    extract::{FromRequestParts, Path},
    http::{HeaderMap, request::Parts},
};

use crate::{
    dto::validation::validate_identifier, error::AppError, services::caller::CallerContext,
    state::SharedState,
};

/// Header carrying the logged-in user, when there is one.
pub const USER_ID_HEADER: &str = "x-user-id";
/// Header carrying the community the game post belongs to.
pub const COMMUNITY_ID_HEADER: &str = "x-community-id";

/// Caller context built from the platform headers and the `postId` path segment.
pub struct Caller(pub CallerContext);

impl FromRequestParts<SharedState> for Caller {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        let post_id = Path::<HashMap<String, String>>::from_request_parts(parts, state)
            .await
            .ok()
            .and_then(|Path(mut params)| params.remove("postId"));
        let user_id = header(&parts.headers, USER_ID_HEADER)?;
        let community_id = header(&parts.headers, COMMUNITY_ID_HEADER)?
            .unwrap_or_else(|| state.config().default_community_id.clone());

        if let Some(post_id) = post_id.as_deref() {
            check("postId", post_id)?;
        }

        Ok(Caller(CallerContext {
            post_id,
            community_id,
            user_id,
        }))
    }
}

fn header(headers: &HeaderMap, name: &str) -> Result<Option<String>, AppError> {
    let Some(value) = headers.get(name) else {
        return Ok(None);
    };
    let value = value
        .to_str()
        .map_err(|_| AppError::BadRequest(format!("{name} is not valid ASCII")))?
        .trim();
    if value.is_empty() {
        return Ok(None);
    }
    check(name, value)?;
    Ok(Some(value.to_owned()))
}

fn check(name: &str, value: &str) -> Result<(), AppError> {
    validate_identifier(value).map_err(|_| AppError::BadRequest(format!("invalid {name}")))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::http::Request;

    use super::*;
    use crate::{
        config::AppConfig,
        platform::{identity::DirectoryResolver, notification::NotificationQueue},
        state::{AppState, SseHub},
    };

    fn state() -> SharedState {
        let (queue, _rx) = NotificationQueue::channel();
        AppState::new(
            AppConfig::default(),
            Arc::new(DirectoryResolver::new()),
            queue,
            SseHub::new(4),
        )
    }

    async fn extract(request: Request<()>) -> Result<CallerContext, AppError> {
        let (mut parts, ()) = request.into_parts();
        Caller::from_request_parts(&mut parts, &state())
            .await
            .map(|Caller(ctx)| ctx)
    }

    #[tokio::test]
    async fn headers_fill_the_context() {
        let request = Request::builder()
            .uri("/settings")
            .header(USER_ID_HEADER, "t2_user")
            .header(COMMUNITY_ID_HEADER, "t5_birds")
            .body(())
            .unwrap();

        let ctx = extract(request).await.unwrap();
        assert_eq!(ctx.user_id.as_deref(), Some("t2_user"));
        assert_eq!(ctx.community_id, "t5_birds");
        assert_eq!(ctx.post_id, None);
    }

    #[tokio::test]
    async fn missing_headers_mean_anonymous_default_community() {
        let request = Request::builder()
            .uri("/settings")
            .header(USER_ID_HEADER, "  ")
            .body(())
            .unwrap();

        let ctx = extract(request).await.unwrap();
        assert_eq!(ctx.user_id, None);
        assert_eq!(ctx.community_id, "default");
    }

    #[tokio::test]
    async fn malformed_identifiers_are_rejected() {
        let request = Request::builder()
            .uri("/settings")
            .header(USER_ID_HEADER, "not a user")
            .body(())
            .unwrap();

        assert!(matches!(extract(request).await, Err(AppError::BadRequest(_))));
    }
}
