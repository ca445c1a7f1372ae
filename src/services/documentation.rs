use utoipa::{
    Modify, OpenApi,
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
};

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for ReddiBirds Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::sse::public_stream,
        crate::routes::leaderboard::own_stats,
        crate::routes::leaderboard::player_stats,
        crate::routes::leaderboard::save_score,
        crate::routes::leaderboard::leaderboard,
        crate::routes::leaderboard::community_stats,
        crate::routes::leaderboard::presence,
        crate::routes::messages::handle_message,
        crate::routes::settings::get_settings,
        crate::routes::settings::put_settings,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::leaderboard::PlayerStats,
            crate::dto::leaderboard::LeaderboardEntry,
            crate::dto::leaderboard::CommunityAggregate,
            crate::dto::leaderboard::SaveScoreRequest,
            crate::dto::leaderboard::OnlinePlayersResponse,
            crate::dto::messages::InboundMessage,
            crate::dto::messages::OutboundMessage,
            crate::dto::settings::AppSettingsDto,
            crate::dto::settings::WorldSetting,
            crate::dto::sse::Handshake,
            crate::dto::sse::SystemStatus,
            crate::dto::sse::CommunityStatsEvent,
            crate::dto::sse::OnlinePlayersEvent,
            crate::dto::sse::HighscoreSharedEvent,
        )
    ),
    modifiers(&ModeratorAuth),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "sse", description = "Server-sent events streams"),
        (name = "leaderboard", description = "Scores, rankings and presence per game post"),
        (name = "messages", description = "Typed request/response bridge for the game client"),
        (name = "settings", description = "Installation settings"),
    )
)]
pub struct ApiDoc;

/// Registers the bearer scheme guarding moderator routes.
struct ModeratorAuth;

impl Modify for ModeratorAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "moderator_token",
            SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_route() {
        let doc = ApiDoc::openapi();
        for path in [
            "/healthcheck",
            "/sse/public",
            "/posts/{postId}/stats/me",
            "/posts/{postId}/scores",
            "/posts/{postId}/messages",
            "/settings",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("moderator_token"));
    }
}
