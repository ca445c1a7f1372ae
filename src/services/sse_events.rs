use serde::Serialize;
use tracing::warn;

use crate::{
    dto::{
        leaderboard::CommunityAggregate,
        sse::{
            CommunityStatsEvent, HighscoreSharedEvent, OnlinePlayersEvent, ServerEvent,
            SystemStatus,
        },
    },
    platform::notification::{HighscoreNotice, NotificationMode},
    state::SseHub,
};

const EVENT_SYSTEM_STATUS: &str = "system_status";
const EVENT_COMMUNITY_STATS: &str = "community_stats";
const EVENT_ONLINE_PLAYERS: &str = "online_players";
const EVENT_HIGHSCORE_SHARED: &str = "highscore_shared";

const HIGHSCORE_COMMENTED_MESSAGE: &str = "Your fantastic highscore was shared as a comment!";
const HIGHSCORE_SCHEDULED_MESSAGE: &str = "Your fantastic highscore will be announced shortly!";

/// Broadcast that the backend entered or left degraded mode.
pub fn broadcast_system_status(hub: &SseHub, degraded: bool) {
    send_public_event(hub, EVENT_SYSTEM_STATUS, &SystemStatus { degraded });
}

/// Broadcast the counters of a community after a run was saved.
pub fn broadcast_community_stats(hub: &SseHub, community_id: &str, stats: CommunityAggregate) {
    let payload = CommunityStatsEvent {
        community_id: community_id.to_owned(),
        stats,
    };
    send_public_event(hub, EVENT_COMMUNITY_STATS, &payload);
}

/// Broadcast how many players of a community are online.
pub fn broadcast_online_players(hub: &SseHub, community_id: &str, count: u64) {
    let payload = OnlinePlayersEvent {
        community_id: community_id.to_owned(),
        count,
    };
    send_public_event(hub, EVENT_ONLINE_PLAYERS, &payload);
}

/// Broadcast that a highscore notice reached the platform.
///
/// Nothing is sent in [`NotificationMode::Log`], where notices never leave the server.
pub fn broadcast_highscore_shared(hub: &SseHub, mode: NotificationMode, notice: &HighscoreNotice) {
    let message = match mode {
        NotificationMode::Comment => HIGHSCORE_COMMENTED_MESSAGE,
        NotificationMode::Job => HIGHSCORE_SCHEDULED_MESSAGE,
        NotificationMode::Log => return,
    };
    let payload = HighscoreSharedEvent {
        user_name: notice.user_name.clone(),
        post_id: notice.post_id.clone(),
        score: notice.score,
        message: message.to_owned(),
    };
    send_public_event(hub, EVENT_HIGHSCORE_SHARED, &payload);
}

fn send_public_event(hub: &SseHub, event: &str, payload: &impl Serialize) {
    match ServerEvent::json(Some(event.to_string()), payload) {
        Ok(event) => hub.broadcast(event),
        Err(err) => warn!(event, error = %err, "failed to serialize public SSE payload"),
    }
}
