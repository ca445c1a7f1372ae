use futures::TryStreamExt;

use crate::{
    dao::models::AppSettingsEntity,
    dto::{
        leaderboard::{
            CommunityAggregate, LeaderboardEntry, LeaderboardQuery, OnlinePlayersResponse,
            PlayerStats, SaveScoreRequest,
        },
        settings::AppSettingsDto,
    },
    error::ServiceError,
    services::{caller::CallerContext, sse_events},
    state::SharedState,
};

/// Stats of the caller on their post.
pub async fn own_stats(state: &SharedState, ctx: &CallerContext) -> Result<PlayerStats, ServiceError> {
    state
        .leaderboard()
        .await?
        .player_stats(ctx)
        .await?
        .ok_or_else(|| ServiceError::NotFound("no user identity on this request".into()))
}

/// Stats of `user_id` on the caller's post.
pub async fn stats_of(
    state: &SharedState,
    ctx: &CallerContext,
    user_id: &str,
) -> Result<PlayerStats, ServiceError> {
    state
        .leaderboard()
        .await?
        .player_stats_by_user_id(ctx, user_id)
        .await?
        .ok_or_else(|| ServiceError::InvalidInput("user id must not be empty".into()))
}

/// Record a finished run and let subscribers know about the new community counters.
pub async fn save_score(
    state: &SharedState,
    ctx: &CallerContext,
    request: SaveScoreRequest,
) -> Result<CommunityAggregate, ServiceError> {
    let aggregate = state
        .leaderboard()
        .await?
        .save_score(ctx, request.highscore, request.score)
        .await?;

    if ctx.user_id.is_some() {
        sse_events::broadcast_community_stats(
            state.public_sse(),
            &ctx.community_id,
            aggregate.clone(),
        );
    }

    Ok(aggregate)
}

/// Best players of the caller's post.
pub async fn leaderboard(
    state: &SharedState,
    ctx: &CallerContext,
    query: LeaderboardQuery,
) -> Result<Vec<LeaderboardEntry>, ServiceError> {
    let limit = query
        .limit
        .unwrap_or(state.config().leaderboard.top_players_limit);
    state
        .leaderboard()
        .await?
        .top_players(ctx, limit, query.attempts)
        .try_collect()
        .await
}

pub async fn community_stats(
    state: &SharedState,
    ctx: &CallerContext,
) -> Result<CommunityAggregate, ServiceError> {
    state.leaderboard().await?.community_stats(ctx).await
}

/// Mark the caller online and broadcast the new head count.
pub async fn record_presence(
    state: &SharedState,
    ctx: &CallerContext,
) -> Result<OnlinePlayersResponse, ServiceError> {
    let count = state
        .leaderboard()
        .await?
        .community_online_players(ctx)
        .await?;
    sse_events::broadcast_online_players(state.public_sse(), &ctx.community_id, count);
    Ok(OnlinePlayersResponse { count })
}

pub async fn app_settings(state: &SharedState) -> Result<AppSettingsDto, ServiceError> {
    let settings = state.leaderboard().await?.app_settings().await?;
    Ok(settings.into())
}

/// Store new installation settings and return them as saved.
pub async fn update_app_settings(
    state: &SharedState,
    settings: AppSettingsDto,
) -> Result<AppSettingsDto, ServiceError> {
    let entity = AppSettingsEntity::from(settings);
    state
        .leaderboard()
        .await?
        .update_app_settings(&entity)
        .await?;
    Ok(entity.into())
}
