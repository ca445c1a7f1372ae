//! Application-level configuration loading: leaderboard tuning, notification mode and defaults.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use indexmap::IndexMap;
use serde::Deserialize;
use tracing::{info, warn};

use crate::{
    dao::{keys::DEFAULT_PRESENCE_KEY, models::AppSettingsEntity},
    platform::notification::NotificationMode,
};

/// Default location on disk where the server looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "REDDIBIRDS_BACK_CONFIG_PATH";
const MODERATOR_TOKEN_ENV: &str = "REDDIBIRDS_MODERATOR_TOKEN";
/// Community used when a request does not carry one.
const DEFAULT_COMMUNITY_ID: &str = "default";
const DEFAULT_PRESENCE_TTL_MS: u64 = 30_000;
const DEFAULT_TOP_PLAYERS_LIMIT: usize = 10;

/// Condition under which a saved score announces a new highscore.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HighscoreTrigger {
    /// A different player now holds rank 0.
    #[default]
    LeaderChange,
    /// The run's score is above the previous leader's highscore.
    ScoreBeatsLeader,
}

/// Tuning knobs of the leaderboard service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaderboardSettings {
    /// Presence entries older than this are pruned.
    pub presence_ttl: Duration,
    /// Name of the hash tracking when each player was last seen.
    pub presence_key: String,
    /// Default number of entries returned by the leaderboard.
    pub top_players_limit: usize,
    pub trigger: HighscoreTrigger,
}

impl Default for LeaderboardSettings {
    fn default() -> Self {
        Self {
            presence_ttl: Duration::from_millis(DEFAULT_PRESENCE_TTL_MS),
            presence_key: DEFAULT_PRESENCE_KEY.to_owned(),
            top_players_limit: DEFAULT_TOP_PLAYERS_LIMIT,
            trigger: HighscoreTrigger::default(),
        }
    }
}

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    pub leaderboard: LeaderboardSettings,
    pub notification_mode: NotificationMode,
    pub default_community_id: String,
    /// Settings served until a moderator stores their own.
    pub default_app_settings: AppSettingsEntity,
    /// Known user names, used when no platform API is configured.
    pub users: IndexMap<String, String>,
    /// Bearer token moderators present to change the app settings. Unset disables changes.
    pub moderator_token: Option<String>,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults.
    ///
    /// `REDDIBIRDS_MODERATOR_TOKEN` overrides the moderator token from the file.
    pub fn load() -> Self {
        let mut config = Self::load_file();
        if let Some(token) = env::var(MODERATOR_TOKEN_ENV).ok().filter(|token| !token.is_empty()) {
            config.moderator_token = Some(token);
        }
        if config.moderator_token.is_none() {
            warn!("no moderator token configured; app settings are read-only");
        }
        config
    }

    fn load_file() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match Self::from_json(&contents) {
                Ok(app_config) => {
                    info!(
                        path = %path.display(),
                        users = app_config.users.len(),
                        "loaded configuration"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Parse a JSON document, filling every omitted field with its default.
    pub fn from_json(contents: &str) -> serde_json::Result<Self> {
        serde_json::from_str::<RawConfig>(contents).map(Into::into)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        RawConfig::default().into()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    presence_ttl_ms: Option<u64>,
    presence_key: Option<String>,
    top_players_limit: Option<usize>,
    highscore_trigger: HighscoreTrigger,
    notification_mode: NotificationMode,
    default_community_id: Option<String>,
    app_settings: Option<AppSettingsEntity>,
    users: IndexMap<String, String>,
    moderator_token: Option<String>,
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let defaults = LeaderboardSettings::default();
        let leaderboard = LeaderboardSettings {
            presence_ttl: value
                .presence_ttl_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.presence_ttl),
            presence_key: value
                .presence_key
                .filter(|key| !key.is_empty())
                .unwrap_or(defaults.presence_key),
            top_players_limit: value
                .top_players_limit
                .unwrap_or(defaults.top_players_limit),
            trigger: value.highscore_trigger,
        };

        Self {
            leaderboard,
            notification_mode: value.notification_mode,
            default_community_id: value
                .default_community_id
                .filter(|id| !id.is_empty())
                .unwrap_or_else(|| DEFAULT_COMMUNITY_ID.to_owned()),
            default_app_settings: value.app_settings.unwrap_or_else(default_app_settings),
            users: value.users,
            moderator_token: value.moderator_token.filter(|token| !token.is_empty()),
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Built-in world shipped with the binary.
fn default_app_settings() -> AppSettingsEntity {
    AppSettingsEntity {
        world_select: "day".to_owned(),
        player_select: "0".to_owned(),
        pipe_select: "0".to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_yields_defaults() {
        let config = AppConfig::from_json("{}").unwrap();
        assert_eq!(config.leaderboard, LeaderboardSettings::default());
        assert_eq!(config.notification_mode, NotificationMode::Comment);
        assert_eq!(config.default_community_id, "default");
        assert_eq!(config.default_app_settings.world_select, "day");
        assert!(config.users.is_empty());
        assert_eq!(config.moderator_token, None);
    }

    #[test]
    fn explicit_values_override_defaults() {
        let config = AppConfig::from_json(
            r#"{
                "presence_ttl_ms": 5000,
                "presence_key": "presence:birds",
                "top_players_limit": 3,
                "highscore_trigger": "score_beats_leader",
                "notification_mode": "job",
                "default_community_id": "t5_birds",
                "app_settings": {"worldSelect": "night", "playerSelect": "2", "pipeSelect": "1"},
                "users": {"t2_a": "alice", "t2_b": "bob"},
                "moderator_token": "s3cret"
            }"#,
        )
        .unwrap();

        assert_eq!(config.leaderboard.presence_ttl, Duration::from_secs(5));
        assert_eq!(config.leaderboard.presence_key, "presence:birds");
        assert_eq!(config.leaderboard.top_players_limit, 3);
        assert_eq!(config.leaderboard.trigger, HighscoreTrigger::ScoreBeatsLeader);
        assert_eq!(config.notification_mode, NotificationMode::Job);
        assert_eq!(config.default_community_id, "t5_birds");
        assert_eq!(config.default_app_settings.world_select, "night");
        assert_eq!(
            config.users.keys().collect::<Vec<_>>(),
            vec!["t2_a", "t2_b"]
        );
        assert_eq!(config.moderator_token.as_deref(), Some("s3cret"));
    }

    #[test]
    fn empty_strings_fall_back_to_defaults() {
        let config =
            AppConfig::from_json(r#"{"presence_key": "", "default_community_id": ""}"#).unwrap();
        assert_eq!(config.leaderboard.presence_key, DEFAULT_PRESENCE_KEY);
        assert_eq!(config.default_community_id, DEFAULT_COMMUNITY_ID);
    }

    #[test]
    fn unknown_mode_is_a_parse_error() {
        assert!(AppConfig::from_json(r#"{"notification_mode": "carrier_pigeon"}"#).is_err());
    }
}
