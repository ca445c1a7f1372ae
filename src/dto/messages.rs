//! Typed messages exchanged with the game client.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::dto::{
    leaderboard::{CommunityAggregate, LeaderboardEntry},
    settings::WorldSetting,
};

/// Largest score a single run may report.
pub const MAX_RUN_SCORE: u64 = 1_000_000_000;

#[derive(Debug, Deserialize, ToSchema)]
/// Requests sent by the game client.
#[serde(tag = "type", rename_all = "camelCase")]
pub enum InboundMessage {
    /// A run just ended.
    SaveStats { data: SaveStatsData },
    /// Ask for the community aggregate including the current leader.
    GetBestPlayer,
    /// Ask for the leaderboard.
    GetBestPlayers,
    /// Ask which world to render.
    RequestAppSettings,
}

/// Payload of [`InboundMessage::SaveStats`].
#[derive(Debug, Deserialize, ToSchema)]
pub struct SaveStatsData {
    pub personal: PersonalScore,
}

/// Score reached during the run that just ended.
#[derive(Debug, Deserialize, ToSchema)]
pub struct PersonalScore {
    pub highscore: u64,
}

impl Validate for InboundMessage {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if let InboundMessage::SaveStats { data } = self {
            if data.personal.highscore > MAX_RUN_SCORE {
                let mut err = ValidationError::new("score_range");
                err.message = Some(format!("Score must not exceed {MAX_RUN_SCORE}").into());
                errors.add("highscore", err);
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// Responses sent back to the game client, mirroring the request tag.
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum OutboundMessage {
    GameOver(GameOverData),
    UpdateBestPlayer(CommunityAggregate),
    UpdateBestPlayers(Vec<LeaderboardEntry>),
    ChangeWorld(WorldSetting),
}

/// Outcome of a saved run as shown on the game-over screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GameOverData {
    pub is_new_high_score: bool,
    pub new_score: u64,
    pub highscore: u64,
    pub attempts: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn save_stats_is_parsed_from_the_client_shape() {
        let message: InboundMessage = serde_json::from_str(
            r#"{"type": "saveStats", "data": {"personal": {"highscore": 17}}}"#,
        )
        .unwrap();
        match message {
            InboundMessage::SaveStats { data } => assert_eq!(data.personal.highscore, 17),
            other => panic!("unexpected message: {other:?}"),
        }
    }

    #[test]
    fn empty_payload_requests_are_accepted() {
        let message: InboundMessage =
            serde_json::from_str(r#"{"type": "getBestPlayers", "data": {}}"#).unwrap();
        assert!(matches!(message, InboundMessage::GetBestPlayers));

        let message: InboundMessage =
            serde_json::from_str(r#"{"type": "requestAppSettings"}"#).unwrap();
        assert!(matches!(message, InboundMessage::RequestAppSettings));
    }

    #[test]
    fn unknown_type_is_rejected() {
        assert!(serde_json::from_str::<InboundMessage>(r#"{"type": "startGame"}"#).is_err());
    }

    #[test]
    fn oversized_score_fails_validation() {
        let message: InboundMessage = serde_json::from_str(
            r#"{"type": "saveStats", "data": {"personal": {"highscore": 1000000001}}}"#,
        )
        .unwrap();
        assert!(message.validate().is_err());
    }

    #[test]
    fn responses_mirror_the_tag() {
        let json = serde_json::to_value(OutboundMessage::GameOver(GameOverData {
            is_new_high_score: true,
            new_score: 12,
            highscore: 12,
            attempts: 3,
        }))
        .unwrap();
        assert_eq!(json["type"], "gameOver");
        assert_eq!(json["data"]["isNewHighScore"], true);
        assert_eq!(json["data"]["attempts"], 3);
    }
}
