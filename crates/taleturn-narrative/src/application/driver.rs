//! The session driver.
//!
//! Turns user intent into controller calls: starts the session, advances on
//! action selection, retries failed turns, and keeps the display-side state
//! (error banner, latest progress) that renderers read.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use taleturn_core::action::ActionId;
use taleturn_core::error::TurnError;
use taleturn_core::progress::{ProgressReport, ProgressSink};
use tracing::{debug, info, instrument, warn};

use crate::application::controller::TurnController;

/// How a driver-issued turn ended, when it did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The turn completed and the log grew.
    Completed,
    /// The turn was aborted; nothing changed and nothing is shown.
    Cancelled,
    /// `start` found nothing to do: the session has already begun.
    Skipped,
}

#[derive(Debug, Default)]
struct Display {
    last_action: Option<ActionId>,
    error: Option<String>,
    progress: Option<ProgressReport>,
    /// Bumped by every issued turn; a settling turn only touches the
    /// display if no newer turn has been issued since.
    issued: u64,
}

/// What the display showed before a turn was issued.
struct Shown {
    ticket: u64,
    last_action: Option<ActionId>,
    error: Option<String>,
}

/// Drives one session on top of a [`TurnController`].
#[derive(Debug)]
pub struct SessionDriver {
    controller: Arc<TurnController>,
    display: Mutex<Display>,
}

impl SessionDriver {
    /// Creates a driver for `controller`.
    #[must_use]
    pub fn new(controller: Arc<TurnController>) -> Self {
        Self {
            controller,
            display: Mutex::new(Display::default()),
        }
    }

    /// The controller this driver issues turns to.
    #[must_use]
    pub fn controller(&self) -> &TurnController {
        &self.controller
    }

    /// Starts the session.
    ///
    /// Issues the initial action-less turn if no turn has ever completed and
    /// none is in flight; otherwise does nothing. Call [`teardown`] if the
    /// session goes away before the returned future settles.
    ///
    /// [`teardown`]: Self::teardown
    ///
    /// # Errors
    ///
    /// Returns `TurnError::Backend` if the initial turn fails.
    #[instrument(skip(self))]
    pub async fn start(&self) -> Result<TurnOutcome, TurnError> {
        if !self.controller.is_pristine() || self.controller.state().is_running() {
            debug!("session already started");
            return Ok(TurnOutcome::Skipped);
        }
        self.run_turn(None).await
    }

    /// Lifecycle cleanup: aborts any in-flight turn.
    pub fn teardown(&self) {
        info!("tearing down session");
        self.controller.abort();
    }

    /// Advances the session with the action the user picked.
    ///
    /// # Errors
    ///
    /// Returns `TurnError::Backend` on generation failure (also shown as the
    /// error banner), or a misuse error if `action` is not on offer.
    #[instrument(skip_all, fields(action = %action))]
    pub async fn select_action(&self, action: ActionId) -> Result<TurnOutcome, TurnError> {
        self.run_turn(Some(action)).await
    }

    /// Re-issues the last failed turn with exactly the same input.
    ///
    /// # Errors
    ///
    /// Returns `TurnError::NothingToRetry` unless the last turn failed, and
    /// otherwise the same errors as [`select_action`](Self::select_action).
    #[instrument(skip(self))]
    pub async fn retry(&self) -> Result<TurnOutcome, TurnError> {
        let state = self.controller.state();
        let Some(action) = state.retry_action().map(Option::<&ActionId>::cloned) else {
            return Err(TurnError::NothingToRetry);
        };
        self.run_turn(action).await
    }

    /// Clears the error banner without retrying.
    pub fn dismiss_error(&self) {
        self.display().error = None;
    }

    /// The user-facing error message, if one is showing.
    #[must_use]
    pub fn error(&self) -> Option<String> {
        self.display().error.clone()
    }

    /// The action of the turn the display currently reflects.
    #[must_use]
    pub fn last_action(&self) -> Option<ActionId> {
        self.display().last_action.clone()
    }

    /// The latest progress report of the running turn.
    #[must_use]
    pub fn progress(&self) -> Option<ProgressReport> {
        self.display().progress.clone()
    }

    fn display(&self) -> MutexGuard<'_, Display> {
        self.display.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn run_turn(&self, action: Option<ActionId>) -> Result<TurnOutcome, TurnError> {
        let shown = {
            let mut display = self.display();
            display.issued += 1;
            display.progress = None;
            Shown {
                ticket: display.issued,
                last_action: std::mem::replace(&mut display.last_action, action.clone()),
                error: display.error.take(),
            }
        };

        let result = self.controller.advance(action, self).await;

        let mut display = self.display();
        let newest = display.issued == shown.ticket;
        if newest {
            display.progress = None;
        }
        match result {
            Ok(()) => Ok(TurnOutcome::Completed),
            Err(err) if err.is_cancellation() => {
                debug!("turn cancelled; nothing to show");
                if newest {
                    restore(&mut display, shown);
                }
                Ok(TurnOutcome::Cancelled)
            }
            Err(err) if err.is_misuse() => {
                warn!(error = %err, "driver issued an invalid turn");
                if newest {
                    restore(&mut display, shown);
                }
                Err(err)
            }
            Err(err) => {
                display.error = Some(err.user_message());
                Err(err)
            }
        }
    }
}

/// A turn that changed nothing leaves the display as it found it.
fn restore(display: &mut Display, shown: Shown) {
    display.last_action = shown.last_action;
    display.error = shown.error;
}

impl ProgressSink for SessionDriver {
    fn report(&self, progress: &ProgressReport) {
        self.display().progress = Some(progress.clone());
    }
}
