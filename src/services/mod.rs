/// Typed callback decoding and dispatch.
pub mod callback_service;
/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Rendering instructions broadcast to SSE subscribers.
pub mod render_events;
/// Buzzer session lifecycle and auto-expiry.
pub mod round_service;
/// Scores, final standings and session stats.
pub mod score_service;
/// Server-Sent Events streaming.
pub mod sse_service;
