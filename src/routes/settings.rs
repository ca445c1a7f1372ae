use axum::{Json, Router, extract::State, routing::get};
use axum_valid::Valid;

use crate::{
    dto::settings::AppSettingsDto, error::AppError, routes::moderator::Moderator,
    services::community_service, state::SharedState,
};

/// Installation settings endpoints.
pub fn router() -> Router<SharedState> {
    Router::new().route("/settings", get(get_settings).put(put_settings))
}

#[utoipa::path(
    get,
    path = "/settings",
    tag = "settings",
    responses(
        (status = 200, description = "Current settings", body = AppSettingsDto),
        (status = 404, description = "Nothing stored and no defaults configured")
    )
)]
/// Return the installation settings.
pub async fn get_settings(
    State(state): State<SharedState>,
) -> Result<Json<AppSettingsDto>, AppError> {
    let settings = community_service::app_settings(&state).await?;
    Ok(Json(settings))
}

#[utoipa::path(
    put,
    path = "/settings",
    tag = "settings",
    request_body = AppSettingsDto,
    security(("moderator_token" = [])),
    responses(
        (status = 200, description = "Settings saved", body = AppSettingsDto),
        (status = 400, description = "Invalid settings"),
        (status = 401, description = "Missing or wrong moderator token")
    )
)]
/// Replace the installation settings. Moderators only.
pub async fn put_settings(
    State(state): State<SharedState>,
    _moderator: Moderator,
    Valid(Json(payload)): Valid<Json<AppSettingsDto>>,
) -> Result<Json<AppSettingsDto>, AppError> {
    let settings = community_service::update_app_settings(&state, payload).await?;
    Ok(Json(settings))
}
