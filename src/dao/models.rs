use serde::{Deserialize, Serialize};

/// Member of a sorted set together with its score, as returned by rank queries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedMember {
    /// Sorted-set member (a user id for leaderboards).
    pub member: String,
    /// Score attached to the member.
    pub score: f64,
}

impl RankedMember {
    /// Build a ranked member from its parts.
    pub fn new(member: impl Into<String>, score: f64) -> Self {
        Self {
            member: member.into(),
            score,
        }
    }
}

/// Raw per-player view of a post, before missing values are coerced.
///
/// `None` means the store holds nothing for that field, which is different
/// from a stored zero.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PlayerRecord {
    /// Score of the player in the post's sorted set.
    pub highscore: Option<f64>,
    /// Number of saved runs in the post's attempts hash.
    pub attempts: Option<u64>,
}

impl PlayerRecord {
    /// True when the player has never saved a score on the post.
    pub fn is_new_player(&self) -> bool {
        self.highscore.is_none() && self.attempts.is_none()
    }
}

/// Installation settings persisted by moderators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSettingsEntity {
    /// Selected world (background theme).
    pub world_select: String,
    /// Selected player sprite, encoded as its frame index.
    pub player_select: String,
    /// Selected pipe sprite, encoded as its frame index.
    pub pipe_select: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stored_zero_is_not_a_new_player() {
        let never = PlayerRecord::default();
        let zero = PlayerRecord {
            highscore: Some(0.0),
            attempts: Some(1),
        };
        assert!(never.is_new_player());
        assert!(!zero.is_new_player());
    }
}
