//! Button payloads sent back by chat clients, decoded into typed commands.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;
use validator::Validate;

use crate::dto::{
    round::{BuzzResponse, LockSummary, ResetSummary},
    scoreboard::{FinalScoreboard, ParticipantScore, ScoreUpdateResponse, ScoreboardView},
    sse::RoundReopenedEvent,
    validation::validate_display_name,
};

/// Raw button press forwarded by the chat adapter.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CallbackRequest {
    /// Participant who pressed the button.
    pub participant_id: i64,
    #[validate(custom(function = "validate_display_name"))]
    pub display_name: String,
    /// Compact payload such as `buzz` or `score_points_42_-600`.
    #[validate(length(min = 1, max = 64))]
    pub data: String,
}

/// Command carried by a button payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallbackCommand {
    Buzz,
    Lock,
    Unlock,
    Reset,
    Finish,
    /// Return from a points menu to the scoreboard.
    ScoreBack,
    /// Open the points menu of one participant.
    ScoreUser { participant_id: i64 },
    /// Apply a points delta to one participant.
    ScorePoints { participant_id: i64, points: i64 },
}

impl CallbackCommand {
    /// Everything except buzzing is reserved to the admin allow-list.
    pub fn requires_admin(self) -> bool {
        !matches!(self, Self::Buzz)
    }
}

/// Payload that does not match any known command.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("unknown callback payload `{0}`")]
    Unknown(String),
    #[error("malformed `{verb}` payload `{payload}`")]
    Malformed { verb: &'static str, payload: String },
}

const SCORE_USER_PREFIX: &str = "score_user_";
const SCORE_POINTS_PREFIX: &str = "score_points_";

impl FromStr for CallbackCommand {
    type Err = DecodeError;

    fn from_str(payload: &str) -> Result<Self, Self::Err> {
        match payload {
            "buzz" => return Ok(Self::Buzz),
            "lock" => return Ok(Self::Lock),
            "unlock" => return Ok(Self::Unlock),
            "reset" => return Ok(Self::Reset),
            "finish" => return Ok(Self::Finish),
            "score_back" => return Ok(Self::ScoreBack),
            _ => {}
        }

        if let Some(rest) = payload.strip_prefix(SCORE_POINTS_PREFIX) {
            let malformed = || DecodeError::Malformed {
                verb: "score_points",
                payload: payload.to_string(),
            };
            let (participant, points) = rest.split_once('_').ok_or_else(malformed)?;
            return Ok(Self::ScorePoints {
                participant_id: participant.parse().map_err(|_| malformed())?,
                points: points.parse().map_err(|_| malformed())?,
            });
        }

        if let Some(rest) = payload.strip_prefix(SCORE_USER_PREFIX) {
            let participant_id = rest.parse().map_err(|_| DecodeError::Malformed {
                verb: "score_user",
                payload: payload.to_string(),
            })?;
            return Ok(Self::ScoreUser { participant_id });
        }

        Err(DecodeError::Unknown(payload.to_string()))
    }
}

/// Result of a dispatched callback, tagged with the command that produced it.
#[derive(Debug, Serialize)]
#[serde(tag = "kind", content = "result", rename_all = "snake_case")]
pub enum CallbackResponse {
    Buzz(BuzzResponse),
    Locked(LockSummary),
    Reopened(RoundReopenedEvent),
    Reset(ResetSummary),
    Finished(FinalScoreboard),
    Scoreboard(ScoreboardView),
    ParticipantMenu(ParticipantScore),
    ScoreUpdated(ScoreUpdateResponse),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_every_verb() {
        let cases = [
            ("buzz", CallbackCommand::Buzz),
            ("lock", CallbackCommand::Lock),
            ("unlock", CallbackCommand::Unlock),
            ("reset", CallbackCommand::Reset),
            ("finish", CallbackCommand::Finish),
            ("score_back", CallbackCommand::ScoreBack),
            (
                "score_user_42",
                CallbackCommand::ScoreUser { participant_id: 42 },
            ),
            (
                "score_points_42_-600",
                CallbackCommand::ScorePoints {
                    participant_id: 42,
                    points: -600,
                },
            ),
            (
                "score_points_7_1000",
                CallbackCommand::ScorePoints {
                    participant_id: 7,
                    points: 1_000,
                },
            ),
        ];

        for (payload, expected) in cases {
            assert_eq!(payload.parse::<CallbackCommand>(), Ok(expected), "{payload}");
        }
    }

    #[test]
    fn rejects_malformed_payloads() {
        for payload in [
            "",
            "BUZZ",
            "buzz ",
            "score",
            "score_user_",
            "score_user_abc",
            "score_user_1_2",
            "score_points_1",
            "score_points_1_",
            "score_points_x_100",
            "score_points_1_100_5",
            "score_points_1_1.5",
        ] {
            assert!(payload.parse::<CallbackCommand>().is_err(), "{payload:?}");
        }
    }

    #[test]
    fn unknown_and_malformed_are_distinguished() {
        assert_eq!(
            "dance".parse::<CallbackCommand>(),
            Err(DecodeError::Unknown("dance".into()))
        );
        assert!(matches!(
            "score_user_me".parse::<CallbackCommand>(),
            Err(DecodeError::Malformed {
                verb: "score_user",
                ..
            })
        ));
    }

    #[test]
    fn only_buzz_is_public() {
        assert!(!CallbackCommand::Buzz.requires_admin());
        assert!(CallbackCommand::Lock.requires_admin());
        assert!(CallbackCommand::ScoreUser { participant_id: 1 }.requires_admin());
    }
}
