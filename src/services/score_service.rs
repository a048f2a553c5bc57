use tracing::info;

use crate::{
    dto::scoreboard::{
        FinalScoreboard, ParticipantScore, ScoreAdjustmentRequest, ScoreUpdateResponse,
        ScoreboardView, StatsResponse,
    },
    services::render_events,
    state::{ParticipantId, RoomId, SharedState},
};

/// Apply a points delta and redraw the scoreboard in place.
pub async fn adjust_score(
    state: &SharedState,
    room_id: RoomId,
    request: ScoreAdjustmentRequest,
) -> ScoreUpdateResponse {
    let update = state
        .with_game(|game| game.adjust_score(room_id, request.participant_id, request.delta))
        .await;
    info!(
        room_id,
        participant_id = update.participant_id,
        delta = request.delta,
        total = update.total,
        "score updated"
    );

    let response = ScoreUpdateResponse::new(room_id, update);
    render_events::broadcast_scoreboard(state, &response.scoreboard);
    response
}

/// Draw a fresh scoreboard, consuming the pending change lines.
pub async fn show_scoreboard(state: &SharedState, room_id: RoomId) -> ScoreboardView {
    let snapshot = state.with_game(|game| game.scoreboard_view(room_id)).await;
    let view = ScoreboardView::new(room_id, snapshot);
    render_events::broadcast_scoreboard(state, &view);
    view
}

/// Return from a points menu to the scoreboard, keeping the change lines.
pub async fn back_to_scoreboard(state: &SharedState, room_id: RoomId) -> ScoreboardView {
    let snapshot = state.read_game(|game| game.scoreboard_peek(room_id)).await;
    let view = ScoreboardView::new(room_id, snapshot);
    render_events::broadcast_scoreboard(state, &view);
    view
}

/// Publish the end-of-game standings of a room.
pub async fn finish(state: &SharedState, room_id: RoomId) -> FinalScoreboard {
    let standings = state.read_game(|game| game.finalize(room_id)).await;
    info!(
        room_id,
        participants = standings.len(),
        leader = ?standings.first().map(|standing| standing.participant_id),
        "final scoreboard"
    );

    let scoreboard = FinalScoreboard::new(room_id, standings);
    render_events::broadcast_final_scoreboard(state, &scoreboard);
    scoreboard
}

/// Name and score of one participant, to pick an adjustment from.
pub async fn participant_menu(
    state: &SharedState,
    room_id: RoomId,
    participant_id: ParticipantId,
) -> ParticipantScore {
    let standing = state
        .read_game(|game| game.participant(room_id, participant_id))
        .await;
    ParticipantScore {
        room_id,
        participant_id: standing.participant_id,
        name: standing.name,
        score: standing.score,
    }
}

/// Process-wide counters.
pub async fn stats(state: &SharedState) -> StatsResponse {
    let (stats, sessions) = state
        .read_game(|game| (game.stats(), game.registry().len()))
        .await;
    StatsResponse::new(stats, sessions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::AppConfig, state::AppState};

    const ROOM: RoomId = -7;

    fn adjustment(participant_id: ParticipantId, delta: i64) -> ScoreAdjustmentRequest {
        ScoreAdjustmentRequest {
            participant_id,
            delta,
        }
    }

    #[tokio::test]
    async fn adjustments_accumulate_and_rank() {
        let state = AppState::new(AppConfig::default());
        adjust_score(&state, ROOM, adjustment(1, 200)).await;
        adjust_score(&state, ROOM, adjustment(2, 600)).await;
        let response = adjust_score(&state, ROOM, adjustment(1, -100)).await;

        assert_eq!(response.score, 100);
        let ranking: Vec<_> = response
            .scoreboard
            .ranking
            .iter()
            .map(|line| (line.position, line.participant_id, line.score))
            .collect();
        assert_eq!(ranking, vec![(1, 2, 600), (2, 1, 100)]);
        assert_eq!(response.scoreboard.change_log.len(), 3);
    }

    #[tokio::test]
    async fn back_keeps_change_lines_but_show_consumes_them() {
        let state = AppState::new(AppConfig::default());
        adjust_score(&state, ROOM, adjustment(1, 400)).await;

        assert_eq!(back_to_scoreboard(&state, ROOM).await.change_log, vec!["User 1 +400"]);
        assert_eq!(show_scoreboard(&state, ROOM).await.change_log, vec!["User 1 +400"]);
        assert!(show_scoreboard(&state, ROOM).await.change_log.is_empty());
    }

    #[tokio::test]
    async fn finish_ranks_every_room_participant() {
        let state = AppState::new(AppConfig::default());
        adjust_score(&state, ROOM, adjustment(3, -200)).await;
        adjust_score(&state, ROOM, adjustment(4, 300)).await;
        adjust_score(&state, ROOM + 1, adjustment(5, 900)).await;

        let scoreboard = finish(&state, ROOM).await;
        let ids: Vec<_> = scoreboard
            .ranking
            .iter()
            .map(|line| line.participant_id)
            .collect();
        assert_eq!(ids, vec![4, 3]);
    }

    #[tokio::test]
    async fn participant_menu_defaults_to_zero() {
        let state = AppState::new(AppConfig::default());
        let menu = participant_menu(&state, ROOM, 9).await;
        assert_eq!(menu.name, "User 9");
        assert_eq!(menu.score, 0);
    }

    #[tokio::test]
    async fn stats_start_empty() {
        let state = AppState::new(AppConfig::default());
        let snapshot = stats(&state).await;
        assert_eq!(snapshot.rounds_completed, 0);
        assert!(snapshot.closest_margin_secs.is_none());
        assert_eq!(snapshot.active_sessions, 0);
    }
}
