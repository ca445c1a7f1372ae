use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, post},
};
use axum_valid::Valid;

use crate::{
    dto::leaderboard::{
        CommunityAggregate, LeaderboardEntry, LeaderboardQuery, OnlinePlayersResponse,
        PlayerStats, SaveScoreRequest,
    },
    error::AppError,
    routes::caller::Caller,
    services::community_service,
    state::SharedState,
};

/// Per-post score, ranking and presence endpoints.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/posts/{postId}/stats/me", get(own_stats))
        .route("/posts/{postId}/stats/{userId}", get(player_stats))
        .route("/posts/{postId}/scores", post(save_score))
        .route("/posts/{postId}/leaderboard", get(leaderboard))
        .route("/posts/{postId}/community", get(community_stats))
        .route("/posts/{postId}/presence", post(presence))
}

#[utoipa::path(
    get,
    path = "/posts/{postId}/stats/me",
    tag = "leaderboard",
    params(("postId" = String, Path, description = "Game post")),
    responses(
        (status = 200, description = "Caller's stats on the post", body = PlayerStats),
        (status = 404, description = "No user identity on the request")
    )
)]
/// Return the caller's highscore and attempts.
pub async fn own_stats(
    State(state): State<SharedState>,
    Caller(ctx): Caller,
) -> Result<Json<PlayerStats>, AppError> {
    let stats = community_service::own_stats(&state, &ctx).await?;
    Ok(Json(stats))
}

#[utoipa::path(
    get,
    path = "/posts/{postId}/stats/{userId}",
    tag = "leaderboard",
    params(
        ("postId" = String, Path, description = "Game post"),
        ("userId" = String, Path, description = "Player to look up")
    ),
    responses((status = 200, description = "Player's stats on the post", body = PlayerStats))
)]
/// Return any player's highscore and attempts.
pub async fn player_stats(
    State(state): State<SharedState>,
    Caller(ctx): Caller,
    Path((_post_id, user_id)): Path<(String, String)>,
) -> Result<Json<PlayerStats>, AppError> {
    let stats = community_service::stats_of(&state, &ctx, &user_id).await?;
    Ok(Json(stats))
}

#[utoipa::path(
    post,
    path = "/posts/{postId}/scores",
    tag = "leaderboard",
    params(("postId" = String, Path, description = "Game post")),
    request_body = SaveScoreRequest,
    responses(
        (status = 200, description = "Community counters after the save", body = CommunityAggregate),
        (status = 400, description = "Score out of range")
    )
)]
/// Record a finished run.
pub async fn save_score(
    State(state): State<SharedState>,
    Caller(ctx): Caller,
    Valid(Json(payload)): Valid<Json<SaveScoreRequest>>,
) -> Result<Json<CommunityAggregate>, AppError> {
    let aggregate = community_service::save_score(&state, &ctx, payload).await?;
    Ok(Json(aggregate))
}

#[utoipa::path(
    get,
    path = "/posts/{postId}/leaderboard",
    tag = "leaderboard",
    params(("postId" = String, Path, description = "Game post"), LeaderboardQuery),
    responses((status = 200, description = "Best players, best first", body = [LeaderboardEntry]))
)]
/// Return the best players of the post.
pub async fn leaderboard(
    State(state): State<SharedState>,
    Caller(ctx): Caller,
    Valid(Query(query)): Valid<Query<LeaderboardQuery>>,
) -> Result<Json<Vec<LeaderboardEntry>>, AppError> {
    let entries = community_service::leaderboard(&state, &ctx, query).await?;
    Ok(Json(entries))
}

#[utoipa::path(
    get,
    path = "/posts/{postId}/community",
    tag = "leaderboard",
    params(("postId" = String, Path, description = "Game post")),
    responses((status = 200, description = "Community counters and leader", body = CommunityAggregate))
)]
/// Return the community counters together with the post's leader.
pub async fn community_stats(
    State(state): State<SharedState>,
    Caller(ctx): Caller,
) -> Result<Json<CommunityAggregate>, AppError> {
    let aggregate = community_service::community_stats(&state, &ctx).await?;
    Ok(Json(aggregate))
}

#[utoipa::path(
    post,
    path = "/posts/{postId}/presence",
    tag = "leaderboard",
    params(("postId" = String, Path, description = "Game post")),
    responses((status = 200, description = "Players currently online", body = OnlinePlayersResponse))
)]
/// Heartbeat marking the caller online.
pub async fn presence(
    State(state): State<SharedState>,
    Caller(ctx): Caller,
) -> Result<Json<OnlinePlayersResponse>, AppError> {
    let response = community_service::record_presence(&state, &ctx).await?;
    Ok(Json(response))
}
