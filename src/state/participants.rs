use std::collections::HashMap;

use crate::state::ParticipantId;

/// Last known display name of every participant that buzzed.
#[derive(Debug, Default)]
pub struct ParticipantDirectory {
    names: HashMap<ParticipantId, String>,
}

impl ParticipantDirectory {
    /// Create an empty directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Remember the latest display name of `participant_id`.
    pub fn remember(&mut self, participant_id: ParticipantId, name: &str) {
        self.names.insert(participant_id, name.to_string());
    }

    /// Known name of `participant_id`.
    pub fn name(&self, participant_id: ParticipantId) -> Option<&str> {
        self.names.get(&participant_id).map(String::as_str)
    }

    /// Name used on scoreboards, `User {id}` when unknown.
    pub fn label(&self, participant_id: ParticipantId) -> String {
        self.name(participant_id)
            .map(str::to_string)
            .unwrap_or_else(|| format!("User {participant_id}"))
    }
}
