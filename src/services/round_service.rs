//! Buzzer session operations: open, buzz, lock, unlock, reset and auto-expiry.
//!
//! Timers are scheduled and cancelled inside the same critical section as the
//! mutation that arms or disarms them, so a cancel never hits a timer armed
//! after it.

use std::time::SystemTime;

use tokio::time::Instant;
use tracing::{debug, info};

use crate::{
    dto::{
        format_system_time,
        round::{
            BuzzBoard, BuzzRequest, BuzzResponse, FastestSummary, LockSummary, ResetSummary,
            SessionOpened, buzz_lines,
        },
        scoreboard::ScoreboardView,
        sse::{RoundExpiredEvent, RoundReopenedEvent},
    },
    error::ServiceError,
    services::render_events,
    state::{
        RoomId, SessionId, SharedState,
        orchestrator::{BuzzOutcome, ExpiryOutcome},
        round::{BuzzRejection, ExpiryTicket},
    },
};

/// Open a new session in `room_id`; it becomes the room's newest.
pub async fn open_session(state: &SharedState, room_id: RoomId) -> SessionOpened {
    let (session_id, superseded) = state.with_game(|game| game.open_session(room_id)).await;
    info!(
        room_id,
        session_id = %session_id,
        superseded = ?superseded,
        "buzzer session opened"
    );

    let opened = SessionOpened {
        room_id,
        session_id,
        superseded,
        opened_at: format_system_time(SystemTime::now()),
    };
    render_events::broadcast_session_opened(state, &opened);
    opened
}

/// Record a buzz. Rejections are answered to the participant, never raised.
pub async fn buzz(
    state: &SharedState,
    room_id: RoomId,
    session_id: SessionId,
    request: BuzzRequest,
) -> BuzzResponse {
    let now = Instant::now().into_std();
    let participant_id = request.participant_id;
    let display_name = request.display_name.trim();

    let result = state
        .with_game(|game| -> Result<BuzzOutcome, BuzzRejection> {
            let outcome = game.buzz(room_id, session_id, participant_id, display_name, now)?;
            if let Some(ticket) = outcome.expiry {
                schedule_expiry(state, session_id, ticket);
            }
            Ok(outcome)
        })
        .await;

    match result {
        Ok(outcome) => {
            if outcome.first {
                info!(room_id, session_id = %session_id, participant_id, "first buzz of the cycle");
            } else {
                debug!(
                    room_id,
                    session_id = %session_id,
                    participant_id,
                    position = outcome.buzzes.len(),
                    "buzz recorded"
                );
            }

            let board = BuzzBoard {
                room_id: outcome.room_id,
                session_id,
                locked: false,
                buzzes: buzz_lines(&outcome.buzzes, state.config().photo_finish_threshold()),
            };
            render_events::broadcast_buzzes(state, &board);
            BuzzResponse::accepted(outcome.first, board)
        }
        Err(BuzzRejection::Late) => {
            info!(session_id = %session_id, participant_id, "late buzz refused");
            BuzzResponse::rejected(BuzzRejection::Late.into())
        }
        Err(rejection) => {
            debug!(session_id = %session_id, participant_id, reason = %rejection, "buzz ignored");
            BuzzResponse::rejected(rejection.into())
        }
    }
}

/// Lock the round, credit its fastest participant and cancel the auto-expiry.
pub async fn lock(
    state: &SharedState,
    room_id: RoomId,
    session_id: SessionId,
) -> Result<LockSummary, ServiceError> {
    let outcome = state
        .with_game(|game| {
            let outcome = game.lock(room_id, session_id)?;
            state.timers().cancel(session_id);
            Ok::<_, ServiceError>(outcome)
        })
        .await?;

    let fastest: Option<FastestSummary> = outcome.fastest.map(Into::into);
    match &fastest {
        Some(fastest) => info!(
            room_id = outcome.room_id,
            session_id = %session_id,
            fastest = fastest.participant_id,
            streak = fastest.streak,
            milestone = fastest.milestone,
            "round locked"
        ),
        None => info!(
            room_id = outcome.room_id,
            session_id = %session_id,
            "round locked without buzzes"
        ),
    }

    let summary = LockSummary {
        board: BuzzBoard {
            room_id: outcome.room_id,
            session_id,
            locked: true,
            buzzes: buzz_lines(&outcome.buzzes, state.config().photo_finish_threshold()),
        },
        fastest,
    };
    render_events::broadcast_locked(state, &summary);
    Ok(summary)
}

/// Clear the cycle and reopen the round.
pub async fn unlock(
    state: &SharedState,
    room_id: RoomId,
    session_id: SessionId,
) -> RoundReopenedEvent {
    let room_id = state
        .with_game(|game| {
            state.timers().cancel(session_id);
            game.unlock(room_id, session_id)
        })
        .await;
    info!(room_id, session_id = %session_id, "round reopened");

    let event = RoundReopenedEvent {
        room_id,
        session_id,
    };
    render_events::broadcast_reopened(state, &event);
    event
}

/// Show the streak leaderboard, then clear streaks, stats and the session's round.
pub async fn reset(state: &SharedState, room_id: RoomId, session_id: SessionId) -> ResetSummary {
    let leaderboard = state
        .with_game(|game| {
            state.timers().cancel(session_id);
            game.full_reset(room_id, session_id)
        })
        .await;
    info!(
        room_id,
        session_id = %session_id,
        leaders = leaderboard.len(),
        "game reset"
    );

    let summary = ResetSummary::new(room_id, session_id, leaderboard);
    render_events::broadcast_leaderboard(state, &summary);
    summary
}

fn schedule_expiry(state: &SharedState, session_id: SessionId, ticket: ExpiryTicket) {
    let delay = state.config().auto_expiry();
    let fire_state = state.clone();
    state.timers().schedule(session_id, ticket, delay, async move {
        handle_expiry(&fire_state, session_id, ticket).await;
    });
    debug!(session_id = %session_id, delay_secs = delay.as_secs(), "auto-expiry armed");
}

/// Close the cycle armed with `ticket`, unless a manual action got there first.
pub async fn handle_expiry(state: &SharedState, session_id: SessionId, ticket: ExpiryTicket) {
    state.timers().complete(session_id, ticket);
    let outcome = state.with_game(|game| game.expire(session_id, ticket)).await;

    match outcome {
        ExpiryOutcome::Skipped => debug!(session_id = %session_id, "auto-expiry skipped"),
        ExpiryOutcome::Expired {
            room_id,
            participants,
            fastest,
            scoreboard,
        } => {
            info!(
                room_id,
                session_id = %session_id,
                participants = participants.len(),
                fastest = fastest.participant_id,
                streak = fastest.streak,
                "round expired"
            );

            let event = RoundExpiredEvent {
                room_id,
                session_id,
                participants: buzz_lines(&participants, state.config().photo_finish_threshold()),
                fastest: fastest.into(),
            };
            render_events::broadcast_expired(state, &event);
            render_events::broadcast_scoreboard(state, &ScoreboardView::new(room_id, scoreboard));
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::{sync::broadcast, time::sleep};

    use super::*;
    use crate::{
        config::AppConfig,
        dto::{round::BuzzRejectionKind, sse::ServerEvent},
        state::AppState,
    };

    const ROOM: RoomId = -42;

    fn request(participant_id: i64, name: &str) -> BuzzRequest {
        BuzzRequest {
            participant_id,
            display_name: name.to_string(),
        }
    }

    fn drain(receiver: &mut broadcast::Receiver<ServerEvent>) -> Vec<String> {
        let mut names = Vec::new();
        while let Ok(event) = receiver.try_recv() {
            names.extend(event.event);
        }
        names
    }

    async fn rounds_completed(state: &SharedState) -> u64 {
        state.read_game(|game| game.stats().rounds_completed()).await
    }

    #[tokio::test(start_paused = true)]
    async fn first_buzz_expires_after_twenty_seconds() {
        let state = AppState::new(AppConfig::default());
        let session = open_session(&state, ROOM).await.session_id;
        let mut events = state.render_sse().subscribe();

        let first = buzz(&state, ROOM, session, request(1, "Ada")).await;
        assert!(first.accepted && first.first);
        sleep(Duration::from_millis(450)).await;
        let second = buzz(&state, ROOM, session, request(2, "Bob")).await;
        let board = second.board.unwrap();
        assert_eq!(board.buzzes[1].delta_secs, 0.45);
        assert!(board.buzzes[1].photo_finish);

        sleep(Duration::from_secs(19)).await;
        assert_eq!(rounds_completed(&state).await, 0);

        sleep(Duration::from_secs(2)).await;
        assert_eq!(rounds_completed(&state).await, 1);
        assert!(!state.timers().is_pending(session));
        assert_eq!(
            drain(&mut events),
            vec!["round.buzzes", "round.buzzes", "round.expired", "scoreboard"]
        );

        // the round reopened, so the same participant may buzz again
        let again = buzz(&state, ROOM, session, request(1, "Ada")).await;
        assert!(again.accepted && again.first);
    }

    #[tokio::test(start_paused = true)]
    async fn lock_cancels_the_expiry() {
        let state = AppState::new(AppConfig::default());
        let session = open_session(&state, ROOM).await.session_id;

        buzz(&state, ROOM, session, request(1, "Ada")).await;
        assert!(state.timers().is_pending(session));
        let summary = lock(&state, ROOM, session).await.unwrap();
        assert_eq!(summary.fastest.unwrap().streak, 1);
        assert!(!state.timers().is_pending(session));

        sleep(Duration::from_secs(30)).await;
        assert_eq!(rounds_completed(&state).await, 1);

        let late = buzz(&state, ROOM, session, request(2, "Bob")).await;
        assert_eq!(late.rejection, Some(BuzzRejectionKind::Late));
    }

    #[tokio::test(start_paused = true)]
    async fn locking_twice_is_a_conflict() {
        let state = AppState::new(AppConfig::default());
        let session = open_session(&state, ROOM).await.session_id;

        lock(&state, ROOM, session).await.unwrap();
        assert!(matches!(
            lock(&state, ROOM, session).await,
            Err(ServiceError::InvalidState(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn stale_timer_leaves_the_next_cycle_alone() {
        let state = AppState::new(AppConfig::default());
        let session = open_session(&state, ROOM).await.session_id;

        buzz(&state, ROOM, session, request(1, "Ada")).await;
        sleep(Duration::from_secs(5)).await;
        unlock(&state, ROOM, session).await;
        sleep(Duration::from_secs(5)).await;
        buzz(&state, ROOM, session, request(2, "Bob")).await;

        // the first cycle's deadline passes without effect
        sleep(Duration::from_secs(11)).await;
        assert_eq!(rounds_completed(&state).await, 0);

        sleep(Duration::from_secs(10)).await;
        assert_eq!(rounds_completed(&state).await, 1);
        assert_eq!(state.read_game(|game| game.streaks().get(2)).await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn superseded_session_does_not_auto_expire() {
        let state = AppState::new(AppConfig::default());
        let old = open_session(&state, ROOM).await.session_id;
        let opened = open_session(&state, ROOM).await;
        assert_eq!(opened.superseded, Some(old));

        buzz(&state, ROOM, old, request(1, "Ada")).await;
        assert!(!state.timers().is_pending(old));
        sleep(Duration::from_secs(30)).await;
        assert_eq!(rounds_completed(&state).await, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn reset_reports_leaders_and_clears_streaks() {
        let state = AppState::new(AppConfig::default());
        let session = open_session(&state, ROOM).await.session_id;
        for _ in 0..2 {
            buzz(&state, ROOM, session, request(7, "Cy")).await;
            lock(&state, ROOM, session).await.unwrap();
            unlock(&state, ROOM, session).await;
        }
        buzz(&state, ROOM, session, request(7, "Cy")).await;

        let summary = reset(&state, ROOM, session).await;
        assert_eq!(summary.leaderboard.len(), 1);
        assert_eq!(summary.leaderboard[0].name, "Cy");
        assert_eq!(summary.leaderboard[0].count, 2);
        assert!(!state.timers().is_pending(session));
        assert!(state.read_game(|game| game.streaks().is_empty()).await);
    }
}
