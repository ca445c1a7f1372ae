use axum::{Json, Router, extract::State, routing::post};
use axum_valid::Valid;

use crate::{
    dto::messages::{InboundMessage, OutboundMessage},
    error::AppError,
    routes::caller::Caller,
    services::message_service,
    state::SharedState,
};

/// Message bridge used by the game client.
pub fn router() -> Router<SharedState> {
    Router::new().route("/posts/{postId}/messages", post(handle_message))
}

#[utoipa::path(
    post,
    path = "/posts/{postId}/messages",
    tag = "messages",
    params(("postId" = String, Path, description = "Game post")),
    request_body = InboundMessage,
    responses(
        (status = 200, description = "Reply to the message", body = OutboundMessage),
        (status = 400, description = "Invalid payload"),
        (status = 422, description = "Unknown message type")
    )
)]
/// Answer a typed client message.
pub async fn handle_message(
    State(state): State<SharedState>,
    Caller(ctx): Caller,
    Valid(Json(message)): Valid<Json<InboundMessage>>,
) -> Result<Json<OutboundMessage>, AppError> {
    let reply = message_service::handle_message(&state, &ctx, message).await?;
    Ok(Json(reply))
}
