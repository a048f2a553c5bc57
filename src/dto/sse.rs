use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::dto::round::{BuzzLine, FastestSummary};

#[derive(Clone, Debug)]
/// Dispatched payload carried across SSE channels.
pub struct ServerEvent {
    pub event: Option<String>,
    pub data: String,
}

impl ServerEvent {
    /// Convenience wrapper that serialises `payload` into the SSE data field.
    pub fn json<E, T>(event: E, payload: &T) -> serde_json::Result<Self>
    where
        E: Into<Option<String>>,
        T: Serialize,
    {
        Ok(Self {
            event: event.into(),
            data: serde_json::to_string(payload)?,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// Initial metadata sent to an SSE client when it connects.
pub struct Handshake {
    /// Human-readable message confirming the subscription.
    pub message: String,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
/// Broadcast when a round is reopened by an operator.
pub struct RoundReopenedEvent {
    pub room_id: i64,
    pub session_id: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when the auto-expiry closed a cycle: who took part, in order.
pub struct RoundExpiredEvent {
    pub room_id: i64,
    pub session_id: Uuid,
    pub participants: Vec<BuzzLine>,
    pub fastest: FastestSummary,
}
