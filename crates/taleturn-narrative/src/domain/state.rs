//! Turn lifecycle state.

use serde::Serialize;
use taleturn_core::action::ActionId;
use uuid::Uuid;

/// Where the controller is in its turn lifecycle.
///
/// No state is terminal: `Idle -> Running`, `Running -> Idle | Failed`, and a
/// cancelled turn returns to whatever state preceded it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TurnState {
    /// No turn in flight; the action set reflects the latest completed turn.
    #[default]
    Idle,
    /// A turn is in flight. Offered actions are stale and must not be shown.
    Running {
        /// The in-flight turn.
        turn_id: Uuid,
        /// The action that started it.
        action: Option<ActionId>,
    },
    /// The last turn failed with a backend error.
    Failed {
        /// The input to retry with.
        action: Option<ActionId>,
    },
}

impl TurnState {
    #[must_use]
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running { .. })
    }

    #[must_use]
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    /// The action retained for retry, if the last turn failed.
    #[must_use]
    pub fn retry_action(&self) -> Option<Option<&ActionId>> {
        match self {
            Self::Failed { action } => Some(action.as_ref()),
            _ => None,
        }
    }
}
