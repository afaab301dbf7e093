//! Commands for turn advancement.

use taleturn_core::action::ActionId;
use uuid::Uuid;

/// Command to advance the session by one turn.
#[derive(Debug, Clone)]
pub struct AdvanceTurn {
    /// Identifies the turn; stamped on every event it produces.
    pub turn_id: Uuid,
    /// The chosen action, or `None` for an action-less turn.
    pub action: Option<ActionId>,
}

impl AdvanceTurn {
    /// Creates a command with a fresh, time-ordered turn id.
    #[must_use]
    pub fn new(action: Option<ActionId>) -> Self {
        Self {
            turn_id: Uuid::now_v7(),
            action,
        }
    }
}
