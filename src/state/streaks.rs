use std::time::Duration;

use indexmap::IndexMap;

use crate::state::ParticipantId;

/// Consecutive-fastest counters shared by every room.
#[derive(Debug, Clone, Default)]
pub struct StreakTracker {
    streaks: IndexMap<ParticipantId, u32>,
}

impl StreakTracker {
    /// Create an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit `participant_id` with one more fastest round and return the new count.
    pub fn credit_fastest(&mut self, participant_id: ParticipantId) -> u32 {
        let streak = self.streaks.entry(participant_id).or_insert(0);
        *streak += 1;
        *streak
    }

    /// Current count for `participant_id`.
    pub fn get(&self, participant_id: ParticipantId) -> u32 {
        self.streaks.get(&participant_id).copied().unwrap_or(0)
    }

    /// The `n` highest counts, descending. Equal counts keep first-appearance order.
    pub fn top_n(&self, n: usize) -> Vec<(ParticipantId, u32)> {
        let mut ranked: Vec<_> = self.streaks.iter().map(|(id, count)| (*id, *count)).collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked.truncate(n);
        ranked
    }

    /// Whether no streak has been credited since the last reset.
    pub fn is_empty(&self) -> bool {
        self.streaks.is_empty()
    }

    /// Forget every streak.
    pub fn reset(&mut self) {
        self.streaks.clear();
    }
}

/// Aggregate counters across all rounds since the last full reset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    rounds_completed: u64,
    closest_margin: Option<Duration>,
}

impl SessionStats {
    /// Create zeroed stats.
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one more finished round.
    pub fn record_round(&mut self) {
        self.rounds_completed += 1;
    }

    /// Keep `margin` if it is positive and tighter than the best seen so far.
    pub fn offer_margin(&mut self, margin: Duration) {
        if margin.is_zero() {
            return;
        }
        match self.closest_margin {
            Some(best) if best <= margin => {}
            _ => self.closest_margin = Some(margin),
        }
    }

    /// Rounds finished since the last reset.
    pub fn rounds_completed(&self) -> u64 {
        self.rounds_completed
    }

    /// Tightest positive gap between two buzzes, if any.
    pub fn closest_margin(&self) -> Option<Duration> {
        self.closest_margin
    }

    /// Zero every counter.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
