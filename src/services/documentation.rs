use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for Buzzinga Back.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::sse::render_stream,
        crate::routes::rounds::open_session,
        crate::routes::rounds::buzz,
        crate::routes::rounds::lock_round,
        crate::routes::rounds::unlock_round,
        crate::routes::rounds::reset_game,
        crate::routes::rounds::callback,
        crate::routes::scores::stats,
        crate::routes::scores::adjust_score,
        crate::routes::scores::scoreboard,
        crate::routes::scores::finish,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::sse::Handshake,
            crate::dto::sse::RoundExpiredEvent,
            crate::dto::command::CallbackRequest,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "sse", description = "Server-sent rendering instructions"),
        (name = "rounds", description = "Buzzer sessions and round control"),
        (name = "scores", description = "Scoreboard and session stats"),
    )
)]
pub struct ApiDoc;
