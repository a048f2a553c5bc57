use axum::{
    Json, Router,
    extract::{Path, State},
    routing::post,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::{
        command::{CallbackRequest, CallbackResponse},
        round::{BuzzRequest, BuzzResponse, LockSummary, ResetSummary, SessionOpened},
        sse::RoundReopenedEvent,
    },
    error::AppError,
    services::{callback_service, round_service},
    state::SharedState,
};

/// Endpoints open to every participant.
pub fn public_router() -> Router<SharedState> {
    Router::new()
        .route(
            "/rooms/{room_id}/sessions/{session_id}/buzz",
            post(buzz),
        )
        .route(
            "/rooms/{room_id}/sessions/{session_id}/callback",
            post(callback),
        )
}

/// Endpoints reserved to the admin allow-list.
pub fn admin_router() -> Router<SharedState> {
    Router::new()
        .route("/rooms/{room_id}/sessions", post(open_session))
        .route(
            "/rooms/{room_id}/sessions/{session_id}/lock",
            post(lock_round),
        )
        .route(
            "/rooms/{room_id}/sessions/{session_id}/unlock",
            post(unlock_round),
        )
        .route(
            "/rooms/{room_id}/sessions/{session_id}/reset",
            post(reset_game),
        )
}

/// Open a buzzer session; it becomes the newest of its room.
#[utoipa::path(
    post,
    path = "/rooms/{room_id}/sessions",
    tag = "rounds",
    params(
        ("X-Actor-Id" = i64, Header, description = "Participant id on the admin allow-list"),
        ("room_id" = i64, Path, description = "Chat room identifier")
    ),
    responses(
        (status = 200, description = "Session opened", body = SessionOpened),
        (status = 401, description = "Actor is not an admin")
    )
)]
pub async fn open_session(
    State(state): State<SharedState>,
    Path(room_id): Path<i64>,
) -> Json<SessionOpened> {
    Json(round_service::open_session(&state, room_id).await)
}

/// Press the buzzer. Late, repeated and too-fast presses answer `accepted: false`.
#[utoipa::path(
    post,
    path = "/rooms/{room_id}/sessions/{session_id}/buzz",
    tag = "rounds",
    params(
        ("room_id" = i64, Path, description = "Chat room identifier"),
        ("session_id" = Uuid, Path, description = "Buzzer session identifier")
    ),
    request_body = BuzzRequest,
    responses(
        (status = 200, description = "Buzz accepted or ignored", body = BuzzResponse),
        (status = 400, description = "Invalid display name")
    )
)]
pub async fn buzz(
    State(state): State<SharedState>,
    Path((room_id, session_id)): Path<(i64, Uuid)>,
    Json(payload): Json<BuzzRequest>,
) -> Result<Json<BuzzResponse>, AppError> {
    payload.validate()?;
    Ok(Json(
        round_service::buzz(&state, room_id, session_id, payload).await,
    ))
}

/// Lock the round and credit its fastest participant.
#[utoipa::path(
    post,
    path = "/rooms/{room_id}/sessions/{session_id}/lock",
    tag = "rounds",
    params(
        ("X-Actor-Id" = i64, Header, description = "Participant id on the admin allow-list"),
        ("room_id" = i64, Path, description = "Chat room identifier"),
        ("session_id" = Uuid, Path, description = "Buzzer session identifier")
    ),
    responses(
        (status = 200, description = "Round locked", body = LockSummary),
        (status = 401, description = "Actor is not an admin"),
        (status = 409, description = "Round already locked")
    )
)]
pub async fn lock_round(
    State(state): State<SharedState>,
    Path((room_id, session_id)): Path<(i64, Uuid)>,
) -> Result<Json<LockSummary>, AppError> {
    Ok(Json(round_service::lock(&state, room_id, session_id).await?))
}

/// Clear the buzz order and reopen the round.
#[utoipa::path(
    post,
    path = "/rooms/{room_id}/sessions/{session_id}/unlock",
    tag = "rounds",
    params(
        ("X-Actor-Id" = i64, Header, description = "Participant id on the admin allow-list"),
        ("room_id" = i64, Path, description = "Chat room identifier"),
        ("session_id" = Uuid, Path, description = "Buzzer session identifier")
    ),
    responses(
        (status = 200, description = "Round reopened", body = RoundReopenedEvent),
        (status = 401, description = "Actor is not an admin")
    )
)]
pub async fn unlock_round(
    State(state): State<SharedState>,
    Path((room_id, session_id)): Path<(i64, Uuid)>,
) -> Json<RoundReopenedEvent> {
    Json(round_service::unlock(&state, room_id, session_id).await)
}

/// Show the streak leaderboard and start over.
#[utoipa::path(
    post,
    path = "/rooms/{room_id}/sessions/{session_id}/reset",
    tag = "rounds",
    params(
        ("X-Actor-Id" = i64, Header, description = "Participant id on the admin allow-list"),
        ("room_id" = i64, Path, description = "Chat room identifier"),
        ("session_id" = Uuid, Path, description = "Buzzer session identifier")
    ),
    responses(
        (status = 200, description = "Streaks cleared", body = ResetSummary),
        (status = 401, description = "Actor is not an admin")
    )
)]
pub async fn reset_game(
    State(state): State<SharedState>,
    Path((room_id, session_id)): Path<(i64, Uuid)>,
) -> Json<ResetSummary> {
    Json(round_service::reset(&state, room_id, session_id).await)
}

/// Run the command carried by a button payload.
#[utoipa::path(
    post,
    path = "/rooms/{room_id}/sessions/{session_id}/callback",
    tag = "rounds",
    params(
        ("room_id" = i64, Path, description = "Chat room identifier"),
        ("session_id" = Uuid, Path, description = "Buzzer session identifier")
    ),
    request_body = CallbackRequest,
    responses(
        (status = 200, description = "Command result tagged by `kind`"),
        (status = 400, description = "Unknown or malformed payload"),
        (status = 401, description = "Command reserved to admins"),
        (status = 409, description = "Round already locked")
    )
)]
pub async fn callback(
    State(state): State<SharedState>,
    Path((room_id, session_id)): Path<(i64, Uuid)>,
    Json(payload): Json<CallbackRequest>,
) -> Result<Json<CallbackResponse>, AppError> {
    payload.validate()?;
    Ok(Json(
        callback_service::dispatch(&state, room_id, session_id, payload).await?,
    ))
}
