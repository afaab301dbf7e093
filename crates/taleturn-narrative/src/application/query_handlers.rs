//! Query handlers for a driven session.
//!
//! Renderers read a [`SessionView`] rather than poking at the controller and
//! driver separately, so every field comes from one consistent moment.

use serde::Serialize;
use taleturn_core::action::{ActionId, ActionSet};
use taleturn_core::event::NarrationEvent;
use taleturn_core::progress::ProgressReport;

use crate::application::driver::SessionDriver;
use crate::domain::state::TurnState;

/// Read-only view of a session for rendering.
#[derive(Debug, Serialize)]
pub struct SessionView {
    /// Lifecycle state; renderers hide the action picker unless idle.
    pub turn: TurnState,
    /// The whole narration timeline.
    pub events: Vec<NarrationEvent>,
    /// Actions the user may pick right now.
    pub actions: ActionSet,
    /// The action most recently sent, kept for retry.
    pub last_action: Option<ActionId>,
    /// The error banner, if one is showing.
    pub error: Option<String>,
    /// Latest progress of the running turn.
    pub progress: Option<ProgressReport>,
}

/// Builds the current view of the session run by `driver`.
#[must_use]
pub fn get_session_view(driver: &SessionDriver) -> SessionView {
    let controller = driver.controller();
    SessionView {
        turn: controller.state(),
        events: controller.events(),
        actions: controller.offered_actions(),
        last_action: driver.last_action(),
        error: driver.error(),
        progress: driver.progress(),
    }
}
