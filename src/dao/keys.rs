//! Key layout shared by every store backend.
//!
//! | Key                                | Type       | Field / member   |
//! |------------------------------------|------------|------------------|
//! | `post:<post>:highscores`           | sorted set | user id          |
//! | `post:<post>:attempts`             | hash       | user id          |
//! | `community:<community>:score`      | hash       | community id     |
//! | `community:<community>:attempts`   | hash       | community id     |
//! | presence hash (configurable name)  | hash       | user id          |
//! | `app:settings`                     | string     | -                |

/// Default name of the hash tracking when each player was last seen.
pub const DEFAULT_PRESENCE_KEY: &str = "online_players";
/// String key holding the JSON encoded installation settings.
pub const APP_SETTINGS_KEY: &str = "app:settings";

/// Sorted set ranking every player of a post by highscore.
pub fn post_highscores(post_id: &str) -> String {
    format!("post:{post_id}:highscores")
}

/// Hash counting how many runs each player made on a post.
pub fn post_attempts(post_id: &str) -> String {
    format!("post:{post_id}:attempts")
}

/// Hash holding the cumulative score of a community under its own id.
pub fn community_score(community_id: &str) -> String {
    format!("community:{community_id}:score")
}

/// Hash holding the cumulative attempts of a community under its own id.
pub fn community_attempts(community_id: &str) -> String {
    format!("community:{community_id}:attempts")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_follow_the_documented_layout() {
        assert_eq!(post_highscores("t3_abc"), "post:t3_abc:highscores");
        assert_eq!(post_attempts("t3_abc"), "post:t3_abc:attempts");
        assert_eq!(community_score("t5_xyz"), "community:t5_xyz:score");
        assert_eq!(community_attempts("t5_xyz"), "community:t5_xyz:attempts");
    }
}
