use tracing::{debug, warn};
use validator::Validate;

use crate::{
    dto::{
        command::{CallbackCommand, CallbackRequest, CallbackResponse},
        round::BuzzRequest,
        scoreboard::ScoreAdjustmentRequest,
    },
    error::ServiceError,
    services::{round_service, score_service},
    state::{RoomId, SessionId, SharedState},
};

/// Decode a button payload and run the command it names.
///
/// Decoding and the admin check both happen before any state is touched.
pub async fn dispatch(
    state: &SharedState,
    room_id: RoomId,
    session_id: SessionId,
    request: CallbackRequest,
) -> Result<CallbackResponse, ServiceError> {
    let command: CallbackCommand = request.data.parse()?;
    let actor_id = request.participant_id;

    if command.requires_admin() && !state.config().is_admin(actor_id) {
        warn!(actor_id, ?command, "callback refused for non-admin");
        return Err(ServiceError::Unauthorized(
            "only admins may use this button".into(),
        ));
    }
    debug!(room_id, session_id = %session_id, actor_id, ?command, "dispatching callback");

    let response = match command {
        CallbackCommand::Buzz => {
            let buzz = BuzzRequest {
                participant_id: actor_id,
                display_name: request.display_name,
            };
            CallbackResponse::Buzz(round_service::buzz(state, room_id, session_id, buzz).await)
        }
        CallbackCommand::Lock => {
            CallbackResponse::Locked(round_service::lock(state, room_id, session_id).await?)
        }
        CallbackCommand::Unlock => {
            CallbackResponse::Reopened(round_service::unlock(state, room_id, session_id).await)
        }
        CallbackCommand::Reset => {
            CallbackResponse::Reset(round_service::reset(state, room_id, session_id).await)
        }
        CallbackCommand::Finish => {
            CallbackResponse::Finished(score_service::finish(state, room_id).await)
        }
        CallbackCommand::ScoreBack => {
            CallbackResponse::Scoreboard(score_service::back_to_scoreboard(state, room_id).await)
        }
        CallbackCommand::ScoreUser { participant_id } => CallbackResponse::ParticipantMenu(
            score_service::participant_menu(state, room_id, participant_id).await,
        ),
        CallbackCommand::ScorePoints {
            participant_id,
            points,
        } => {
            let adjustment = ScoreAdjustmentRequest {
                participant_id,
                delta: points,
            };
            adjustment
                .validate()
                .map_err(|err| ServiceError::InvalidInput(err.to_string()))?;
            CallbackResponse::ScoreUpdated(
                score_service::adjust_score(state, room_id, adjustment).await,
            )
        }
    };

    Ok(response)
}
