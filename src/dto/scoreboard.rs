//! DTOs for per-room scores and session statistics.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::state::{
    orchestrator::{ScoreUpdate, ScoreboardSnapshot, Standing},
    streaks::SessionStats,
};

/// Request to adjust a participant's score by a delta.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ScoreAdjustmentRequest {
    pub participant_id: i64,
    /// Signed points to add, e.g. `-600` or `800`.
    #[validate(range(min = -1_000_000, max = 1_000_000))]
    pub delta: i64,
}

/// Ranked scoreboard row.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ScoreLine {
    pub position: usize,
    pub participant_id: i64,
    pub name: String,
    pub score: i64,
}

fn score_lines(standings: Vec<Standing>) -> Vec<ScoreLine> {
    standings
        .into_iter()
        .enumerate()
        .map(|(index, standing)| ScoreLine {
            position: index + 1,
            participant_id: standing.participant_id,
            name: standing.name,
            score: standing.score,
        })
        .collect()
}

/// Scoreboard with the recent change lines to show above it.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ScoreboardView {
    pub room_id: i64,
    /// Latest changes, newest first (e.g. `"Spidy -600"`).
    pub change_log: Vec<String>,
    pub ranking: Vec<ScoreLine>,
}

impl ScoreboardView {
    /// Render a snapshot for `room_id`.
    pub fn new(room_id: i64, snapshot: ScoreboardSnapshot) -> Self {
        Self {
            room_id,
            change_log: snapshot.change_log,
            ranking: score_lines(snapshot.ranking),
        }
    }
}

/// Result of a score adjustment, returning the updated tally.
#[derive(Debug, Serialize, ToSchema)]
pub struct ScoreUpdateResponse {
    pub participant_id: i64,
    pub name: String,
    pub score: i64,
    pub scoreboard: ScoreboardView,
}

impl ScoreUpdateResponse {
    /// Render an adjustment made in `room_id`.
    pub fn new(room_id: i64, update: ScoreUpdate) -> Self {
        Self {
            participant_id: update.participant_id,
            name: update.name,
            score: update.total,
            scoreboard: ScoreboardView::new(room_id, update.scoreboard),
        }
    }
}

/// End-of-game standings.
#[derive(Debug, Serialize, ToSchema)]
pub struct FinalScoreboard {
    pub room_id: i64,
    pub ranking: Vec<ScoreLine>,
}

impl FinalScoreboard {
    /// Render final standings for `room_id`.
    pub fn new(room_id: i64, standings: Vec<Standing>) -> Self {
        Self {
            room_id,
            ranking: score_lines(standings),
        }
    }
}

/// Current score of one participant, shown before picking an adjustment.
#[derive(Debug, Serialize, ToSchema)]
pub struct ParticipantScore {
    pub room_id: i64,
    pub participant_id: i64,
    pub name: String,
    pub score: i64,
}

/// Session-wide counters.
#[derive(Debug, Serialize, ToSchema)]
pub struct StatsResponse {
    pub rounds_completed: u64,
    /// Tightest positive gap between two buzzes, in seconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub closest_margin_secs: Option<f64>,
    pub active_sessions: usize,
}

impl StatsResponse {
    /// Render stats alongside the number of tracked sessions.
    pub fn new(stats: SessionStats, active_sessions: usize) -> Self {
        Self {
            rounds_completed: stats.rounds_completed(),
            closest_margin_secs: stats.closest_margin().map(|margin| margin.as_secs_f64()),
            active_sessions,
        }
    }
}
