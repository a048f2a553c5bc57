use std::collections::{HashMap, VecDeque};

use indexmap::IndexMap;

use crate::state::{ParticipantId, RoomId};

/// Outcome of a score adjustment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Adjustment {
    /// Score after the adjustment.
    pub total: i64,
    /// Room ranking after the adjustment.
    pub ranking: Vec<(ParticipantId, i64)>,
}

#[derive(Debug, Default)]
struct RoomScores {
    scores: IndexMap<ParticipantId, i64>,
    changes: VecDeque<String>,
}

/// Per-room scores with a short log of the latest changes.
///
/// Rankings sort by descending score; equal scores keep the order in which
/// participants first appeared on the board.
#[derive(Debug)]
pub struct Scoreboard {
    rooms: HashMap<RoomId, RoomScores>,
    change_capacity: usize,
}

impl Scoreboard {
    /// Create an empty scoreboard keeping at most `change_capacity` change lines per room.
    pub fn new(change_capacity: usize) -> Self {
        Self {
            rooms: HashMap::new(),
            change_capacity,
        }
    }

    /// Put `participant_id` on the board with zero points if it is not there yet.
    pub fn register(&mut self, room_id: RoomId, participant_id: ParticipantId) {
        self.rooms
            .entry(room_id)
            .or_default()
            .scores
            .entry(participant_id)
            .or_insert(0);
    }

    /// Add `delta` to the participant's score and log `"{label} {delta:+}"`.
    pub fn adjust(
        &mut self,
        room_id: RoomId,
        participant_id: ParticipantId,
        delta: i64,
        label: &str,
    ) -> Adjustment {
        let room = self.rooms.entry(room_id).or_default();
        let score = room.scores.entry(participant_id).or_insert(0);
        *score += delta;
        let total = *score;

        room.changes.push_front(format!("{label} {delta:+}"));
        room.changes.truncate(self.change_capacity);

        Adjustment {
            total,
            ranking: self.ranking(room_id),
        }
    }

    /// Current score of a participant, if they are on the board.
    pub fn score(&self, room_id: RoomId, participant_id: ParticipantId) -> Option<i64> {
        self.rooms
            .get(&room_id)
            .and_then(|room| room.scores.get(&participant_id).copied())
    }

    /// Room ranking, highest score first.
    pub fn ranking(&self, room_id: RoomId) -> Vec<(ParticipantId, i64)> {
        let Some(room) = self.rooms.get(&room_id) else {
            return Vec::new();
        };
        let mut ranked: Vec<_> = room.scores.iter().map(|(id, score)| (*id, *score)).collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked
    }

    /// Final standings for end-of-game display.
    pub fn finalize(&self, room_id: RoomId) -> Vec<(ParticipantId, i64)> {
        self.ranking(room_id)
    }

    /// Pending change lines, newest first, without clearing them.
    pub fn change_log(&self, room_id: RoomId) -> Vec<String> {
        self.rooms
            .get(&room_id)
            .map(|room| room.changes.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Pending change lines, newest first. The log is emptied.
    pub fn consume_change_log(&mut self, room_id: RoomId) -> Vec<String> {
        self.rooms
            .get_mut(&room_id)
            .map(|room| room.changes.drain(..).collect())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ROOM: RoomId = -42;

    #[test]
    fn adjustments_accumulate_from_zero() {
        let mut board = Scoreboard::new(3);
        board.adjust(ROOM, 1, 200, "Ada");
        board.adjust(ROOM, 1, -100, "Ada");
        let outcome = board.adjust(ROOM, 1, 800, "Ada");

        assert_eq!(outcome.total, 900);
        assert_eq!(outcome.ranking, vec![(1, 900)]);
        assert_eq!(board.change_log(ROOM), vec!["Ada +800", "Ada -100", "Ada +200"]);
    }

    #[test]
    fn change_log_evicts_oldest_entries() {
        let mut board = Scoreboard::new(3);
        board.adjust(ROOM, 1, 100, "Ada");
        board.adjust(ROOM, 2, -600, "Spidy");
        board.adjust(ROOM, 1, 300, "Ada");
        board.adjust(ROOM, 3, 1000, "Linus");

        assert_eq!(
            board.change_log(ROOM),
            vec!["Linus +1000", "Ada +300", "Spidy -600"]
        );
    }

    #[test]
    fn consuming_the_change_log_clears_it() {
        let mut board = Scoreboard::new(3);
        board.adjust(ROOM, 1, 100, "Ada");

        assert_eq!(board.consume_change_log(ROOM), vec!["Ada +100"]);
        assert!(board.consume_change_log(ROOM).is_empty());
        assert_eq!(board.score(ROOM, 1), Some(100));
    }

    #[test]
    fn ranking_sorts_descending_with_first_seen_ties() {
        let mut board = Scoreboard::new(3);
        board.register(ROOM, 5);
        board.adjust(ROOM, 7, 300, "b");
        board.adjust(ROOM, 9, 300, "c");
        board.adjust(ROOM, 5, -50, "a");

        assert_eq!(board.ranking(ROOM), vec![(7, 300), (9, 300), (5, -50)]);
        assert_eq!(board.finalize(ROOM), board.ranking(ROOM));
    }

    #[test]
    fn register_does_not_touch_existing_scores() {
        let mut board = Scoreboard::new(3);
        board.adjust(ROOM, 1, 400, "Ada");
        board.register(ROOM, 1);
        board.register(ROOM, 2);

        assert_eq!(board.ranking(ROOM), vec![(1, 400), (2, 0)]);
        assert_eq!(board.change_log(ROOM).len(), 1);
    }

    #[test]
    fn rooms_are_independent() {
        let mut board = Scoreboard::new(3);
        board.adjust(1, 1, 100, "Ada");

        assert!(board.ranking(2).is_empty());
        assert!(board.change_log(2).is_empty());
        assert_eq!(board.score(2, 1), None);
    }
}
