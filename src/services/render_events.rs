use serde::Serialize;
use tracing::{debug, warn};

use crate::{
    dto::{
        round::{BuzzBoard, LockSummary, ResetSummary, SessionOpened},
        scoreboard::{FinalScoreboard, ScoreboardView},
        sse::{RoundExpiredEvent, RoundReopenedEvent, ServerEvent},
    },
    state::SharedState,
};

const EVENT_SESSION_OPENED: &str = "session.opened";
const EVENT_ROUND_BUZZES: &str = "round.buzzes";
const EVENT_ROUND_LOCKED: &str = "round.locked";
const EVENT_ROUND_REOPENED: &str = "round.reopened";
const EVENT_ROUND_EXPIRED: &str = "round.expired";
const EVENT_SCOREBOARD: &str = "scoreboard";
const EVENT_SCOREBOARD_FINAL: &str = "scoreboard.final";
const EVENT_LEADERBOARD: &str = "leaderboard";

/// Announce a fresh buzzer session.
pub fn broadcast_session_opened(state: &SharedState, opened: &SessionOpened) {
    send_render_event(state, EVENT_SESSION_OPENED, opened);
}

/// Redraw the live buzz order of a session.
pub fn broadcast_buzzes(state: &SharedState, board: &BuzzBoard) {
    send_render_event(state, EVENT_ROUND_BUZZES, board);
}

/// Show the final order of a locked round with its fastest participant.
pub fn broadcast_locked(state: &SharedState, summary: &LockSummary) {
    send_render_event(state, EVENT_ROUND_LOCKED, summary);
}

/// Tell clients a round accepts buzzes again.
pub fn broadcast_reopened(state: &SharedState, event: &RoundReopenedEvent) {
    send_render_event(state, EVENT_ROUND_REOPENED, event);
}

/// Summarise the participants of a cycle closed by the auto-expiry.
pub fn broadcast_expired(state: &SharedState, event: &RoundExpiredEvent) {
    send_render_event(state, EVENT_ROUND_EXPIRED, event);
}

/// Draw the scoreboard of a room.
pub fn broadcast_scoreboard(state: &SharedState, view: &ScoreboardView) {
    send_render_event(state, EVENT_SCOREBOARD, view);
}

/// Draw the end-of-game standings.
pub fn broadcast_final_scoreboard(state: &SharedState, scoreboard: &FinalScoreboard) {
    send_render_event(state, EVENT_SCOREBOARD_FINAL, scoreboard);
}

/// Show the streak leaderboard produced by a reset.
pub fn broadcast_leaderboard(state: &SharedState, summary: &ResetSummary) {
    send_render_event(state, EVENT_LEADERBOARD, summary);
}

fn send_render_event(state: &SharedState, event: &str, payload: &impl Serialize) {
    match ServerEvent::json(Some(event.to_string()), payload) {
        Ok(message) => {
            let receivers = state.render_sse().broadcast(message);
            debug!(event, receivers, "render event sent");
        }
        Err(err) => warn!(event, error = %err, "failed to serialize render payload"),
    }
}
