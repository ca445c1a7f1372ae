use serde::{Deserialize, Serialize};
use serde_with::skip_serializing_none;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::dao::models::PlayerRecord;

/// Name reported for the leader when the leaderboard is empty or the leader is unknown.
pub const PLACEHOLDER_TOP_PLAYER: &str = "???";
/// Name reported for leaderboard entries whose user cannot be resolved.
pub const ANONYMOUS_PLAYER: &str = "Anonymous";
/// Largest page the leaderboard route accepts.
pub const MAX_LEADERBOARD_LIMIT: usize = 100;

/// Personal statistics of a player on a post.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct PlayerStats {
    pub highscore: u64,
    pub attempts: u64,
}

impl From<PlayerRecord> for PlayerStats {
    fn from(record: PlayerRecord) -> Self {
        Self {
            highscore: record
                .highscore
                .filter(|score| score.is_finite() && *score > 0.0)
                .map(|score| score as u64)
                .unwrap_or_default(),
            attempts: record.attempts.unwrap_or_default(),
        }
    }
}

/// One ranked row of a post leaderboard.
#[skip_serializing_none]
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub user_id: String,
    pub user_name: String,
    pub score: f64,
    /// Only filled when attempts were requested.
    pub attempts: Option<u64>,
}

/// Community-wide counters together with the post's leader.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CommunityAggregate {
    pub community_score: i64,
    pub community_attempts: u64,
    pub top_player: String,
}

impl CommunityAggregate {
    /// Aggregate returned to callers without an identity.
    pub fn placeholder() -> Self {
        Self {
            community_score: 0,
            community_attempts: 0,
            top_player: PLACEHOLDER_TOP_PLAYER.to_owned(),
        }
    }
}

/// Payload recording the end of a run.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SaveScoreRequest {
    /// Value stored as the player's leaderboard score (overwrites the previous one).
    #[validate(range(max = 1_000_000_000))]
    pub highscore: u64,
    /// Points added to the community score.
    #[validate(range(max = 1_000_000_000))]
    pub score: u64,
}

/// Query accepted by the leaderboard route.
#[derive(Debug, Deserialize, IntoParams, Validate)]
#[into_params(parameter_in = Query)]
pub struct LeaderboardQuery {
    /// Number of ranks to return (defaults to the configured limit).
    #[validate(range(max = 100))]
    pub limit: Option<usize>,
    /// Include each player's attempt count.
    #[serde(default)]
    pub attempts: bool,
}

/// Number of players seen recently in the community.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct OnlinePlayersResponse {
    pub count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_and_negative_values_coerce_to_zero() {
        assert_eq!(PlayerStats::from(PlayerRecord::default()), PlayerStats::default());
        let stats = PlayerStats::from(PlayerRecord {
            highscore: Some(-3.0),
            attempts: Some(2),
        });
        assert_eq!(stats, PlayerStats { highscore: 0, attempts: 2 });
    }

    #[test]
    fn attempts_are_omitted_when_not_requested() {
        let entry = LeaderboardEntry {
            user_id: "t2_u".into(),
            user_name: "birdy".into(),
            score: 50.0,
            attempts: None,
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["userId"], "t2_u");
        assert_eq!(json["userName"], "birdy");
        assert!(json.get("attempts").is_none());
    }

    #[test]
    fn oversized_limit_is_rejected() {
        let query = LeaderboardQuery {
            limit: Some(MAX_LEADERBOARD_LIMIT + 1),
            attempts: false,
        };
        assert!(query.validate().is_err());
    }
}
