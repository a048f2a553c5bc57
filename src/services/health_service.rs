use tracing::debug;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Respond with a static health payload once the game lock can be taken.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    let sessions = state.read_game(|game| game.registry().len()).await;
    debug!(sessions, "health probe");
    HealthResponse::ok()
}
