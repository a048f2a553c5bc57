use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use validator::Validate;

use crate::{
    dto::scoreboard::{
        FinalScoreboard, ScoreAdjustmentRequest, ScoreUpdateResponse, ScoreboardView,
        StatsResponse,
    },
    error::AppError,
    services::score_service,
    state::SharedState,
};

/// Read-only endpoints open to everyone.
pub fn public_router() -> Router<SharedState> {
    Router::new().route("/stats", get(stats))
}

/// Score management reserved to the admin allow-list.
pub fn admin_router() -> Router<SharedState> {
    Router::new()
        .route("/rooms/{room_id}/scores", post(adjust_score))
        .route("/rooms/{room_id}/scoreboard", get(scoreboard))
        .route("/rooms/{room_id}/finish", post(finish))
}

/// Session-wide counters.
#[utoipa::path(
    get,
    path = "/stats",
    tag = "scores",
    responses((status = 200, description = "Rounds played and closest margin", body = StatsResponse))
)]
pub async fn stats(State(state): State<SharedState>) -> Json<StatsResponse> {
    Json(score_service::stats(&state).await)
}

/// Add or remove points for a participant of the room.
#[utoipa::path(
    post,
    path = "/rooms/{room_id}/scores",
    tag = "scores",
    params(
        ("X-Actor-Id" = i64, Header, description = "Participant id on the admin allow-list"),
        ("room_id" = i64, Path, description = "Chat room identifier")
    ),
    request_body = ScoreAdjustmentRequest,
    responses(
        (status = 200, description = "Score updated", body = ScoreUpdateResponse),
        (status = 400, description = "Delta out of range"),
        (status = 401, description = "Actor is not an admin")
    )
)]
pub async fn adjust_score(
    State(state): State<SharedState>,
    Path(room_id): Path<i64>,
    Json(payload): Json<ScoreAdjustmentRequest>,
) -> Result<Json<ScoreUpdateResponse>, AppError> {
    payload.validate()?;
    Ok(Json(
        score_service::adjust_score(&state, room_id, payload).await,
    ))
}

/// Show the scoreboard with the latest change lines.
#[utoipa::path(
    get,
    path = "/rooms/{room_id}/scoreboard",
    tag = "scores",
    params(
        ("X-Actor-Id" = i64, Header, description = "Participant id on the admin allow-list"),
        ("room_id" = i64, Path, description = "Chat room identifier")
    ),
    responses(
        (status = 200, description = "Current ranking", body = ScoreboardView),
        (status = 401, description = "Actor is not an admin")
    )
)]
pub async fn scoreboard(
    State(state): State<SharedState>,
    Path(room_id): Path<i64>,
) -> Json<ScoreboardView> {
    Json(score_service::show_scoreboard(&state, room_id).await)
}

/// Publish the final standings of the room.
#[utoipa::path(
    post,
    path = "/rooms/{room_id}/finish",
    tag = "scores",
    params(
        ("X-Actor-Id" = i64, Header, description = "Participant id on the admin allow-list"),
        ("room_id" = i64, Path, description = "Chat room identifier")
    ),
    responses(
        (status = 200, description = "Final standings", body = FinalScoreboard),
        (status = 401, description = "Actor is not an admin")
    )
)]
pub async fn finish(
    State(state): State<SharedState>,
    Path(room_id): Path<i64>,
) -> Json<FinalScoreboard> {
    Json(score_service::finish(&state, room_id).await)
}
