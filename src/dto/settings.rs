use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{dao::models::AppSettingsEntity, dto::validation::validate_frame};

/// Installation settings as exchanged with moderators.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AppSettingsDto {
    #[validate(length(min = 1, max = 32))]
    pub world_select: String,
    #[validate(custom(function = "validate_frame"))]
    pub player_select: String,
    #[validate(custom(function = "validate_frame"))]
    pub pipe_select: String,
}

impl From<AppSettingsEntity> for AppSettingsDto {
    fn from(entity: AppSettingsEntity) -> Self {
        Self {
            world_select: entity.world_select,
            player_select: entity.player_select,
            pipe_select: entity.pipe_select,
        }
    }
}

impl From<AppSettingsDto> for AppSettingsEntity {
    fn from(dto: AppSettingsDto) -> Self {
        Self {
            world_select: dto.world_select,
            player_select: dto.player_select,
            pipe_select: dto.pipe_select,
        }
    }
}

/// World the game client should render.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WorldSetting {
    pub world: String,
    pub player_frame: u32,
    pub pipe_frame: u32,
}

impl From<AppSettingsEntity> for WorldSetting {
    fn from(settings: AppSettingsEntity) -> Self {
        Self {
            player_frame: settings.player_select.parse().unwrap_or_default(),
            pipe_frame: settings.pipe_select.parse().unwrap_or_default(),
            world: settings.world_select,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn world_setting_parses_frames_and_tolerates_garbage() {
        let world: WorldSetting = AppSettingsEntity {
            world_select: "night".into(),
            player_select: "3".into(),
            pipe_select: "pipe".into(),
        }
        .into();
        assert_eq!(
            world,
            WorldSetting {
                world: "night".into(),
                player_frame: 3,
                pipe_frame: 0,
            }
        );
    }

    #[test]
    fn settings_payload_is_validated() {
        let dto = AppSettingsDto {
            world_select: String::new(),
            player_select: "x".into(),
            pipe_select: "1".into(),
        };
        let errors = dto.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("world_select"));
        assert!(fields.contains_key("player_select"));
        assert!(!fields.contains_key("pipe_select"));
    }
}
