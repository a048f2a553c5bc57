use axum::{
    Router,
    body::Body,
    extract::State,
    http::Request,
    middleware::{self, Next},
    response::Response,
};
use tracing::warn;

use crate::{
    error::AppError,
    state::{ParticipantId, SharedState},
};

pub mod docs;
pub mod health;
pub mod rounds;
pub mod scores;
pub mod sse;

/// Header naming the participant performing an admin request.
const ACTOR_HEADER: &str = "x-actor-id";

/// Compose all route trees, wiring in shared state and documentation routes.
pub fn router(state: SharedState) -> Router<()> {
    let public_router = health::router()
        .merge(sse::router())
        .merge(rounds::public_router())
        .merge(scores::public_router());

    let admin_router = rounds::admin_router()
        .merge(scores::admin_router())
        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin));

    let docs_router = docs::router(state.clone());

    public_router
        .merge(admin_router)
        .merge(docs_router)
        .with_state(state)
}

/// Reject requests whose `X-Actor-Id` is not on the admin allow-list.
async fn require_admin(
    State(state): State<SharedState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let provided = req
        .headers()
        .get(ACTOR_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("missing actor header `X-Actor-Id`".into()))?;

    let actor_id: ParticipantId = provided
        .trim()
        .parse()
        .map_err(|_| AppError::Unauthorized("malformed actor id".into()))?;

    if state.config().is_admin(actor_id) {
        Ok(next.run(req).await)
    } else {
        warn!(actor_id, path = %req.uri().path(), "refused non-admin actor");
        Err(AppError::Unauthorized("actor is not an admin".into()))
    }
}
