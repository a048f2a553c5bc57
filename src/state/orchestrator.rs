//! Composition of the round, streak, stats and scoreboard stores.
//!
//! Every inbound game event goes through [`Orchestrator`], which is the only
//! place allowed to touch more than one store per event. Methods are
//! synchronous and return plain outcomes; scheduling and broadcasting happen
//! in the service layer once the mutation is committed.

use std::time::{Duration, Instant};

use crate::state::{
    ParticipantId, RoomId, SessionId,
    participants::ParticipantDirectory,
    registry::RoundRegistry,
    round::{Buzz, BuzzRejection, ExpiryTicket, RoundError},
    scoreboard::Scoreboard,
    streaks::{SessionStats, StreakTracker},
};

/// Name shown on the streak leaderboard for participants never seen buzzing.
const UNKNOWN_PARTICIPANT: &str = "Unknown";

/// Tunables for round bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundRules {
    /// Minimum gap between two presses of the same participant.
    pub cooldown: Duration,
    /// Streak values that deserve a milestone notice (exact match).
    pub streak_milestones: Vec<u32>,
    /// Change lines kept per room.
    pub change_log_capacity: usize,
    /// Entries returned by the streak leaderboard.
    pub leaderboard_size: usize,
}

impl Default for RoundRules {
    fn default() -> Self {
        Self {
            cooldown: Duration::from_millis(300),
            streak_milestones: vec![3, 5, 10],
            change_log_capacity: 3,
            leaderboard_size: 3,
        }
    }
}

/// Accepted buzz, with the list to render.
#[derive(Debug, Clone, PartialEq)]
pub struct BuzzOutcome {
    /// Room of the session.
    pub room_id: RoomId,
    /// Buzzes of the cycle in arrival order.
    pub buzzes: Vec<Buzz>,
    /// Whether this buzz opened the cycle.
    pub first: bool,
    /// Set when this buzz armed the auto-expiry.
    pub expiry: Option<ExpiryTicket>,
}

/// Fastest participant of a finished cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fastest {
    /// Participant credited with the round.
    pub participant_id: ParticipantId,
    /// Name used when buzzing.
    pub name: String,
    /// Streak after crediting.
    pub streak: u32,
    /// Whether `streak` is one of the milestone values.
    pub milestone: bool,
}

/// Final standings of a locked round.
#[derive(Debug, Clone, PartialEq)]
pub struct LockOutcome {
    /// Room of the session.
    pub room_id: RoomId,
    /// Buzzes in arrival order.
    pub buzzes: Vec<Buzz>,
    /// Fastest participant, when anybody buzzed.
    pub fastest: Option<Fastest>,
}

/// Result of a timer firing.
#[derive(Debug, Clone, PartialEq)]
pub enum ExpiryOutcome {
    /// Nothing to expire: no buzz, or a manual action got there first.
    Skipped,
    /// The cycle was closed and the round reopened.
    Expired {
        /// Room of the session.
        room_id: RoomId,
        /// Buzzes of the closed cycle.
        participants: Vec<Buzz>,
        /// Fastest participant of the closed cycle.
        fastest: Fastest,
        /// Fresh scoreboard for the room.
        scoreboard: ScoreboardSnapshot,
    },
}

/// Scoreboard row with a resolved name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Standing {
    /// Participant on the board.
    pub participant_id: ParticipantId,
    /// Resolved display name.
    pub name: String,
    /// Current score.
    pub score: i64,
}

/// Scoreboard ranking together with the change lines to show above it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreboardSnapshot {
    /// Recent changes, newest first.
    pub change_log: Vec<String>,
    /// Ranking, highest score first.
    pub ranking: Vec<Standing>,
}

/// Outcome of a score adjustment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreUpdate {
    /// Adjusted participant.
    pub participant_id: ParticipantId,
    /// Resolved display name.
    pub name: String,
    /// Score after the adjustment.
    pub total: i64,
    /// Scoreboard to redraw in place.
    pub scoreboard: ScoreboardSnapshot,
}

/// Streak leaderboard row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreakStanding {
    /// Participant holding the streak.
    pub participant_id: ParticipantId,
    /// Resolved display name.
    pub name: String,
    /// Fastest rounds credited.
    pub count: u32,
}

/// Owner of every in-memory game store.
#[derive(Debug)]
pub struct Orchestrator {
    rules: RoundRules,
    registry: RoundRegistry,
    streaks: StreakTracker,
    stats: SessionStats,
    scoreboard: Scoreboard,
    participants: ParticipantDirectory,
}

impl Orchestrator {
    /// Build empty stores following `rules`.
    pub fn new(rules: RoundRules) -> Self {
        Self {
            registry: RoundRegistry::new(rules.cooldown),
            streaks: StreakTracker::new(),
            stats: SessionStats::new(),
            scoreboard: Scoreboard::new(rules.change_log_capacity),
            participants: ParticipantDirectory::new(),
            rules,
        }
    }

    /// Session registry.
    pub fn registry(&self) -> &RoundRegistry {
        &self.registry
    }

    /// Global streak counters.
    pub fn streaks(&self) -> &StreakTracker {
        &self.streaks
    }

    /// Global session stats.
    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    /// Open a new session in `room_id`, returning it and the session it supersedes.
    pub fn open_session(&mut self, room_id: RoomId) -> (SessionId, Option<SessionId>) {
        self.registry.open(room_id)
    }

    /// Record a buzz. The first buzz of a cycle arms the auto-expiry when the
    /// session is the newest of its room.
    pub fn buzz(
        &mut self,
        room_id: RoomId,
        session_id: SessionId,
        participant_id: ParticipantId,
        display_name: &str,
        now: Instant,
    ) -> Result<BuzzOutcome, BuzzRejection> {
        let newest = self.registry.is_newest(room_id, session_id);
        let round = self.registry.get_or_create(room_id, session_id);
        let accepted = round.submit_buzz(participant_id, display_name, now)?;

        let expiry = (accepted.first && newest).then(|| round.arm_expiry());
        let round_room = round.room_id();
        let buzzes = round.buzzes().to_vec();

        if !accepted.first {
            self.stats.offer_margin(accepted.delta);
        }
        self.participants.remember(participant_id, display_name);
        self.scoreboard.register(round_room, participant_id);

        Ok(BuzzOutcome {
            room_id: round_room,
            buzzes,
            first: accepted.first,
            expiry,
        })
    }

    /// Lock the round and credit its fastest participant.
    pub fn lock(
        &mut self,
        room_id: RoomId,
        session_id: SessionId,
    ) -> Result<LockOutcome, RoundError> {
        let round = self.registry.get_or_create(room_id, session_id);
        round.lock()?;
        let round_room = round.room_id();
        let buzzes = round.buzzes().to_vec();

        let fastest = buzzes.first().map(|buzz| self.credit_round(buzz));

        Ok(LockOutcome {
            room_id: round_room,
            buzzes,
            fastest,
        })
    }

    /// Clear the cycle and reopen the round.
    pub fn unlock(&mut self, room_id: RoomId, session_id: SessionId) -> RoomId {
        let round = self.registry.get_or_create(room_id, session_id);
        round.unlock();
        round.room_id()
    }

    /// Handle the auto-expiry timer of `session_id`.
    pub fn expire(&mut self, session_id: SessionId, ticket: ExpiryTicket) -> ExpiryOutcome {
        let Some(round) = self.registry.get_mut(session_id) else {
            return ExpiryOutcome::Skipped;
        };
        let room_id = round.room_id();
        let Some(participants) = round.take_expired(ticket) else {
            return ExpiryOutcome::Skipped;
        };
        let Some(first) = participants.first() else {
            return ExpiryOutcome::Skipped;
        };

        let fastest = self.credit_round(first);
        let scoreboard = self.scoreboard_view(room_id);

        ExpiryOutcome::Expired {
            room_id,
            participants,
            fastest,
            scoreboard,
        }
    }

    /// Return the streak leaderboard, then clear streaks and stats and give
    /// the session a fresh round.
    pub fn full_reset(&mut self, room_id: RoomId, session_id: SessionId) -> Vec<StreakStanding> {
        let leaderboard = self
            .streaks
            .top_n(self.rules.leaderboard_size)
            .into_iter()
            .map(|(participant_id, count)| StreakStanding {
                participant_id,
                name: self
                    .participants
                    .name(participant_id)
                    .unwrap_or(UNKNOWN_PARTICIPANT)
                    .to_string(),
                count,
            })
            .collect();

        self.streaks.reset();
        self.stats.reset();
        self.registry.reset(room_id, session_id);

        leaderboard
    }

    /// Apply `delta` points to a participant of `room_id`.
    pub fn adjust_score(
        &mut self,
        room_id: RoomId,
        participant_id: ParticipantId,
        delta: i64,
    ) -> ScoreUpdate {
        let name = self.participants.label(participant_id);
        let adjustment = self.scoreboard.adjust(room_id, participant_id, delta, &name);

        ScoreUpdate {
            participant_id,
            name,
            total: adjustment.total,
            scoreboard: ScoreboardSnapshot {
                change_log: self.scoreboard.change_log(room_id),
                ranking: self.standings(adjustment.ranking),
            },
        }
    }

    /// Scoreboard for a fresh rendering. Pending change lines are consumed.
    pub fn scoreboard_view(&mut self, room_id: RoomId) -> ScoreboardSnapshot {
        let change_log = self.scoreboard.consume_change_log(room_id);
        ScoreboardSnapshot {
            change_log,
            ranking: self.standings(self.scoreboard.ranking(room_id)),
        }
    }

    /// Scoreboard for redrawing an existing view. Change lines are kept.
    pub fn scoreboard_peek(&self, room_id: RoomId) -> ScoreboardSnapshot {
        ScoreboardSnapshot {
            change_log: self.scoreboard.change_log(room_id),
            ranking: self.standings(self.scoreboard.ranking(room_id)),
        }
    }

    /// End-of-game standings.
    pub fn finalize(&self, room_id: RoomId) -> Vec<Standing> {
        self.standings(self.scoreboard.finalize(room_id))
    }

    /// Name and current score of one participant.
    pub fn participant(&self, room_id: RoomId, participant_id: ParticipantId) -> Standing {
        Standing {
            participant_id,
            name: self.participants.label(participant_id),
            score: self
                .scoreboard
                .score(room_id, participant_id)
                .unwrap_or(0),
        }
    }

    fn credit_round(&mut self, fastest: &Buzz) -> Fastest {
        let streak = self.streaks.credit_fastest(fastest.participant_id);
        self.stats.record_round();
        Fastest {
            participant_id: fastest.participant_id,
            name: fastest.display_name.clone(),
            streak,
            milestone: self.rules.streak_milestones.contains(&streak),
        }
    }

    fn standings(&self, ranking: Vec<(ParticipantId, i64)>) -> Vec<Standing> {
        ranking
            .into_iter()
            .map(|(participant_id, score)| Standing {
                participant_id,
                name: self.participants.label(participant_id),
                score,
            })
            .collect()
    }
}
