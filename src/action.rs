//! Agent actions: the external command surface over a live call.
//!
//! Actions arrive as tagged JSON, are applied to the call's state machine,
//! and answer with the updated state or a refusal message. Refusals (a
//! denied transition, an unknown call) are ordinary responses, not errors:
//! the caller shows the message and the call carries on.

use serde::{Deserialize, Serialize};

use crate::extract::CapturedInfoUpdate;
use crate::journey::{Destination, Segment};
use crate::machine::CallState;
use crate::session::SessionManager;

/// A command from the agent's console.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AgentAction {
    /// Mark the current station complete and move to the next one.
    ConfirmStation,
    /// Pin the segment the agent heard, overriding the classifier.
    SelectSegment { segment: Segment },
    /// Record the qualification outcome, with any supporting notes.
    SetQualified {
        qualified: bool,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        notes: Vec<String>,
    },
    /// Record the destination the agent chose.
    SelectDestination { destination: Destination },
    /// Correct or fill in captured details.
    UpdateInfo { update: CapturedInfoUpdate },
    /// Skip straight to routing for a caller who knows what they want.
    FastTrack,
}

/// Outcome of applying an action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ActionResponse {
    Ok { state: CallState },
    Error { message: String },
}

impl ActionResponse {
    pub fn is_ok(&self) -> bool {
        matches!(self, ActionResponse::Ok { .. })
    }
}

/// Apply one action to a live call. The updated snapshot is persisted best
/// effort; a storage failure is logged, never surfaced to the agent.
pub async fn apply_action(
    manager: &SessionManager,
    call_id: &str,
    action: AgentAction,
) -> ActionResponse {
    let Some(machine) = manager.get_session(call_id) else {
        return ActionResponse::Error {
            message: format!("No active call with id {call_id}"),
        };
    };

    let result = {
        let mut machine = machine.lock().await;
        match action {
            AgentAction::ConfirmStation => match machine.confirm_station() {
                Ok(_) => Ok(machine.state().clone()),
                Err(denied) => Err(denied.to_string()),
            },
            AgentAction::SelectSegment { segment } => {
                machine.confirm_segment(segment);
                Ok(machine.state().clone())
            }
            AgentAction::SetQualified { qualified, notes } => {
                machine.set_qualified(qualified, &notes);
                Ok(machine.state().clone())
            }
            AgentAction::SelectDestination { destination } => {
                machine.select_destination(destination);
                Ok(machine.state().clone())
            }
            AgentAction::UpdateInfo { update } => {
                machine.update_captured_info(&update);
                Ok(machine.state().clone())
            }
            AgentAction::FastTrack => match machine.fast_track_to_destination() {
                Ok(_) => Ok(machine.state().clone()),
                Err(denied) => Err(denied.to_string()),
            },
        }
    };

    match result {
        Ok(state) => {
            if let Err(e) = manager.persist_session(call_id).await {
                log::warn!("snapshot after action on call {call_id} failed: {e}");
            }
            ActionResponse::Ok { state }
        }
        Err(message) => ActionResponse::Error { message },
    }
}
