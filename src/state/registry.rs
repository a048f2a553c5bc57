//! Session registry mapping opaque session identifiers to their [`Round`].
//!
//! Sessions outlive the process on the chat side, so a session id that is
//! not known here is healed by creating a fresh round in its place instead
//! of being reported as an error.

use std::{collections::HashMap, time::Duration};

use tracing::info;
use uuid::Uuid;

use crate::state::{RoomId, SessionId, round::Round};

/// Rounds keyed by session, plus the newest session of each room.
#[derive(Debug)]
pub struct RoundRegistry {
    rounds: HashMap<SessionId, Round>,
    newest: HashMap<RoomId, SessionId>,
    cooldown: Duration,
}

impl RoundRegistry {
    /// Create an empty registry whose rounds debounce with `cooldown`.
    pub fn new(cooldown: Duration) -> Self {
        Self {
            rounds: HashMap::new(),
            newest: HashMap::new(),
            cooldown,
        }
    }

    /// Open a fresh session in `room_id` and make it the room's newest.
    ///
    /// Returns the new identifier and the session it supersedes, if any.
    pub fn open(&mut self, room_id: RoomId) -> (SessionId, Option<SessionId>) {
        let session_id = Uuid::new_v4();
        self.rounds
            .insert(session_id, Round::new(room_id, self.cooldown));
        let superseded = self.mark_newest(room_id, session_id);
        (session_id, superseded)
    }

    /// Borrow the round of `session_id`, creating an open one when it is unknown.
    pub fn get_or_create(&mut self, room_id: RoomId, session_id: SessionId) -> &mut Round {
        let cooldown = self.cooldown;
        self.rounds.entry(session_id).or_insert_with(|| {
            info!(%session_id, room_id, "reinitializing unknown buzzer session");
            Round::new(room_id, cooldown)
        })
    }

    /// Borrow the round of `session_id` if it exists.
    pub fn get(&self, session_id: SessionId) -> Option<&Round> {
        self.rounds.get(&session_id)
    }

    /// Mutably borrow the round of `session_id` if it exists.
    pub fn get_mut(&mut self, session_id: SessionId) -> Option<&mut Round> {
        self.rounds.get_mut(&session_id)
    }

    /// Reopen the round of `session_id` on a new cycle, creating it when unknown.
    pub fn reset(&mut self, room_id: RoomId, session_id: SessionId) -> &mut Round {
        let round = self.get_or_create(room_id, session_id);
        round.reset();
        round
    }

    /// Make `session_id` the only session of `room_id` allowed to arm auto-expiry.
    pub fn mark_newest(&mut self, room_id: RoomId, session_id: SessionId) -> Option<SessionId> {
        self.newest
            .insert(room_id, session_id)
            .filter(|previous| *previous != session_id)
    }

    /// Whether `session_id` is the newest session of `room_id`.
    pub fn is_newest(&self, room_id: RoomId, session_id: SessionId) -> bool {
        self.newest.get(&room_id) == Some(&session_id)
    }

    /// Number of tracked sessions.
    pub fn len(&self) -> usize {
        self.rounds.len()
    }

    /// Whether no session is tracked.
    pub fn is_empty(&self) -> bool {
        self.rounds.is_empty()
    }
}
