//! Request/response bridge for the game client.

use futures::TryStreamExt;
use tracing::debug;

use crate::{
    dto::{
        leaderboard::PlayerStats,
        messages::{GameOverData, InboundMessage, OutboundMessage},
        settings::WorldSetting,
    },
    error::ServiceError,
    services::{caller::CallerContext, sse_events},
    state::SharedState,
};

/// Answer one client message.
pub async fn handle_message(
    state: &SharedState,
    ctx: &CallerContext,
    message: InboundMessage,
) -> Result<OutboundMessage, ServiceError> {
    let service = state.leaderboard().await?;

    match message {
        InboundMessage::SaveStats { data } => {
            let game_over = save_stats(state, ctx, data.personal.highscore).await?;
            Ok(OutboundMessage::GameOver(game_over))
        }
        InboundMessage::GetBestPlayer => {
            let aggregate = service.community_stats(ctx).await?;
            Ok(OutboundMessage::UpdateBestPlayer(aggregate))
        }
        InboundMessage::GetBestPlayers => {
            let limit = state.config().leaderboard.top_players_limit;
            let entries = service
                .top_players(ctx, limit, false)
                .try_collect()
                .await?;
            Ok(OutboundMessage::UpdateBestPlayers(entries))
        }
        InboundMessage::RequestAppSettings => {
            let settings = service.app_settings().await?;
            Ok(OutboundMessage::ChangeWorld(WorldSetting::from(settings)))
        }
    }
}

/// Save a finished run, keeping the better of the stored and the new score on the leaderboard.
async fn save_stats(
    state: &SharedState,
    ctx: &CallerContext,
    new_score: u64,
) -> Result<GameOverData, ServiceError> {
    let service = state.leaderboard().await?;
    let current = service.player_stats(ctx).await?.unwrap_or_default();
    let PlayerStats {
        highscore,
        attempts,
    } = current;

    let is_new_high_score = new_score > highscore;
    let best = new_score.max(highscore);
    let aggregate = service.save_score(ctx, best, new_score).await?;

    if ctx.user_id.is_some() {
        sse_events::broadcast_community_stats(state.public_sse(), &ctx.community_id, aggregate);
    } else {
        debug!(post_id = ?ctx.post_id, "anonymous run; nothing recorded");
    }

    Ok(GameOverData {
        is_new_high_score,
        new_score,
        highscore: best,
        attempts: attempts + 1,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::kv_store::memory::MemoryKvStore,
        dto::messages::{PersonalScore, SaveStatsData},
        platform::{identity::DirectoryResolver, notification::NotificationQueue},
        state::{AppState, SseHub},
    };

    const POST: &str = "t3_post";
    const COMMUNITY: &str = "t5_birds";

    async fn state() -> SharedState {
        let (queue, _rx) = NotificationQueue::channel();
        let identity = [("u", "ursula"), ("v", "victor")]
            .into_iter()
            .collect::<DirectoryResolver>();
        let state = AppState::new(AppConfig::default(), Arc::new(identity), queue, SseHub::new(16));
        state.install_store(Arc::new(MemoryKvStore::new())).await;
        state
    }

    fn save(highscore: u64) -> InboundMessage {
        InboundMessage::SaveStats {
            data: SaveStatsData {
                personal: PersonalScore { highscore },
            },
        }
    }

    async fn game_over(state: &SharedState, ctx: &CallerContext, score: u64) -> GameOverData {
        match handle_message(state, ctx, save(score)).await.unwrap() {
            OutboundMessage::GameOver(data) => data,
            other => panic!("unexpected response: {other:?}"),
        }
    }

    #[tokio::test]
    async fn save_stats_keeps_the_best_score() {
        let state = state().await;
        let ctx = CallerContext::user(POST, COMMUNITY, "u");

        let first = game_over(&state, &ctx, 10).await;
        assert_eq!(
            first,
            GameOverData {
                is_new_high_score: true,
                new_score: 10,
                highscore: 10,
                attempts: 1,
            }
        );

        let second = game_over(&state, &ctx, 4).await;
        assert_eq!(
            second,
            GameOverData {
                is_new_high_score: false,
                new_score: 4,
                highscore: 10,
                attempts: 2,
            }
        );

        match handle_message(&state, &ctx, InboundMessage::GetBestPlayer)
            .await
            .unwrap()
        {
            OutboundMessage::UpdateBestPlayer(aggregate) => {
                assert_eq!(aggregate.community_score, 14);
                assert_eq!(aggregate.community_attempts, 2);
                assert_eq!(aggregate.top_player, "ursula");
            }
            other => panic!("unexpected response: {other:?}"),
        }
    }

    #[tokio::test]
    async fn anonymous_run_is_reported_but_not_recorded() {
        let state = state().await;
        let ctx = CallerContext::anonymous(POST, COMMUNITY);
        let mut events = state.public_sse().subscribe();

        let data = game_over(&state, &ctx, 7).await;
        assert!(data.is_new_high_score);
        assert_eq!(data.attempts, 1);
        assert!(events.try_recv().is_err());

        match handle_message(&state, &ctx, InboundMessage::GetBestPlayers)
            .await
            .unwrap()
        {
            OutboundMessage::UpdateBestPlayers(entries) => assert!(entries.is_empty()),
            other => panic!("unexpected response: {other:?}"),
        }
    }

    #[tokio::test]
    async fn best_players_are_ranked() {
        let state = state().await;
        game_over(&state, &CallerContext::user(POST, COMMUNITY, "u"), 3).await;
        game_over(&state, &CallerContext::user(POST, COMMUNITY, "v"), 8).await;

        let response = handle_message(
            &state,
            &CallerContext::anonymous(POST, COMMUNITY),
            InboundMessage::GetBestPlayers,
        )
        .await
        .unwrap();
        match response {
            OutboundMessage::UpdateBestPlayers(entries) => {
                let names = entries
                    .iter()
                    .map(|entry| entry.user_name.as_str())
                    .collect::<Vec<_>>();
                assert_eq!(names, ["victor", "ursula"]);
                assert!(entries.iter().all(|entry| entry.attempts.is_none()));
            }
            other => panic!("unexpected response: {other:?}"),
        }
    }

    #[tokio::test]
    async fn world_comes_from_settings() {
        let state = state().await;

        let response = handle_message(
            &state,
            &CallerContext::anonymous(POST, COMMUNITY),
            InboundMessage::RequestAppSettings,
        )
        .await
        .unwrap();
        match response {
            OutboundMessage::ChangeWorld(world) => assert_eq!(world.world, "day"),
            other => panic!("unexpected response: {other:?}"),
        }
    }
}
