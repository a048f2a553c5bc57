//! DTOs describing buzzer sessions: buzz submissions and the rendered buzz order.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::validation::validate_display_name,
    state::{
        orchestrator::{Fastest, StreakStanding},
        round::{Buzz, BuzzRejection},
    },
};

/// Buzz submitted by a participant.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct BuzzRequest {
    pub participant_id: i64,
    #[validate(custom(function = "validate_display_name"))]
    pub display_name: String,
}

/// One line of the buzz order.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BuzzLine {
    /// 1-based arrival position.
    pub position: usize,
    pub participant_id: i64,
    pub name: String,
    /// Seconds behind the first buzz, millisecond precision.
    pub delta_secs: f64,
    /// Set for non-first buzzes that arrived within the photo-finish threshold.
    pub photo_finish: bool,
}

impl BuzzLine {
    /// Render the buzz found at `index` of the arrival order.
    pub fn from_buzz(index: usize, buzz: &Buzz, photo_finish_threshold: Duration) -> Self {
        Self {
            position: index + 1,
            participant_id: buzz.participant_id,
            name: buzz.display_name.clone(),
            delta_secs: buzz.delta_secs(),
            photo_finish: index > 0 && buzz.delta <= photo_finish_threshold,
        }
    }
}

/// Render a whole arrival order.
pub fn buzz_lines(buzzes: &[Buzz], photo_finish_threshold: Duration) -> Vec<BuzzLine> {
    buzzes
        .iter()
        .enumerate()
        .map(|(index, buzz)| BuzzLine::from_buzz(index, buzz, photo_finish_threshold))
        .collect()
}

/// Live buzz order of a session.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct BuzzBoard {
    pub room_id: i64,
    pub session_id: Uuid,
    pub locked: bool,
    pub buzzes: Vec<BuzzLine>,
}

/// Why a buzz was not recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum BuzzRejectionKind {
    /// The round is locked; the participant was too slow.
    Late,
    /// Pressed again within the debounce window.
    Cooldown,
    /// Already in this cycle's buzz order.
    Duplicate,
}

impl From<BuzzRejection> for BuzzRejectionKind {
    fn from(value: BuzzRejection) -> Self {
        match value {
            BuzzRejection::Late => Self::Late,
            BuzzRejection::Cooldown => Self::Cooldown,
            BuzzRejection::Duplicate => Self::Duplicate,
        }
    }
}

/// Answer returned to the participant who pressed the buzzer.
#[derive(Debug, Serialize, ToSchema)]
pub struct BuzzResponse {
    pub accepted: bool,
    /// Whether this buzz was the fastest of the cycle.
    pub first: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection: Option<BuzzRejectionKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub board: Option<BuzzBoard>,
}

impl BuzzResponse {
    /// Response for a recorded buzz.
    pub fn accepted(first: bool, board: BuzzBoard) -> Self {
        Self {
            accepted: true,
            first,
            rejection: None,
            board: Some(board),
        }
    }

    /// Response for an ignored buzz.
    pub fn rejected(kind: BuzzRejectionKind) -> Self {
        Self {
            accepted: false,
            first: false,
            rejection: Some(kind),
            board: None,
        }
    }
}

/// Fastest participant of a finished round.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct FastestSummary {
    pub participant_id: i64,
    pub name: String,
    /// Consecutive fastest rounds, this one included.
    pub streak: u32,
    /// Whether `streak` hit a milestone value.
    pub milestone: bool,
}

impl From<Fastest> for FastestSummary {
    fn from(value: Fastest) -> Self {
        Self {
            participant_id: value.participant_id,
            name: value.name,
            streak: value.streak,
            milestone: value.milestone,
        }
    }
}

/// Final order of a locked round.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LockSummary {
    pub board: BuzzBoard,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fastest: Option<FastestSummary>,
}

/// Notice emitted when a session opens.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SessionOpened {
    pub room_id: i64,
    pub session_id: Uuid,
    /// Previous newest session of the room, now frozen.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub superseded: Option<Uuid>,
    /// RFC 3339 timestamp.
    pub opened_at: String,
}

/// Streak leaderboard row.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LeaderboardEntry {
    pub position: usize,
    pub participant_id: i64,
    pub name: String,
    pub count: u32,
}

/// Leaderboard shown when the game is reset.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ResetSummary {
    pub room_id: i64,
    pub session_id: Uuid,
    pub leaderboard: Vec<LeaderboardEntry>,
}

impl ResetSummary {
    /// Number the standings from 1.
    pub fn new(room_id: i64, session_id: Uuid, standings: Vec<StreakStanding>) -> Self {
        let leaderboard = standings
            .into_iter()
            .enumerate()
            .map(|(index, standing)| LeaderboardEntry {
                position: index + 1,
                participant_id: standing.participant_id,
                name: standing.name,
                count: standing.count,
            })
            .collect();
        Self {
            room_id,
            session_id,
            leaderboard,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buzz(id: i64, millis: u64) -> Buzz {
        Buzz {
            participant_id: id,
            display_name: format!("p{id}"),
            delta: Duration::from_millis(millis),
        }
    }

    #[test]
    fn photo_finish_flags_close_followers_only() {
        let buzzes = [buzz(1, 0), buzz(2, 400), buzz(3, 1_000), buzz(4, 1_001)];
        let lines = buzz_lines(&buzzes, Duration::from_secs(1));

        let flags: Vec<_> = lines.iter().map(|line| line.photo_finish).collect();
        assert_eq!(flags, vec![false, true, true, false]);
        assert_eq!(lines[3].position, 4);
        assert_eq!(lines[1].delta_secs, 0.4);
    }

    #[test]
    fn rejected_response_skips_board() {
        let json = serde_json::to_value(BuzzResponse::rejected(BuzzRejectionKind::Late)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "accepted": false, "first": false, "rejection": "late" })
        );
    }
}
