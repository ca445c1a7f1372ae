use axum::Router;

use crate::state::SharedState;

pub mod caller;
pub mod docs;
pub mod health;
pub mod leaderboard;
pub mod messages;
pub mod moderator;
pub mod settings;
pub mod sse;

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    let api_router = health::router()
        .merge(sse::router())
        .merge(leaderboard::router())
        .merge(messages::router())
        .merge(settings::router());

    let docs_router = docs::router(state.clone());

    api_router.merge(docs_router).with_state(state)
}
