//! The turn controller.
//!
//! Runs exactly one generation per `advance` call: validates the chosen
//! action, hands a snapshot of the log to the backend, relays its progress,
//! and commits or discards the result. At most one generation is outstanding
//! at any time, and the log is never rolled back.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use taleturn_core::action::{ActionId, ActionSet};
use taleturn_core::backend::{Generation, GenerationBackend, GenerationRequest};
use taleturn_core::clock::Clock;
use taleturn_core::error::{GenerationError, TurnError};
use taleturn_core::event::{EventMetadata, NarrationEvent};
use taleturn_core::log::SessionLog;
use taleturn_core::progress::{ProgressReport, ProgressSink};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, trace, warn};
use uuid::Uuid;

use crate::domain::commands::AdvanceTurn;
use crate::domain::state::TurnState;

#[derive(Debug)]
struct Session {
    log: SessionLog,
    state: TurnState,
    in_flight: Option<CancellationToken>,
}

/// Orchestrates turn advancement for one session.
pub struct TurnController {
    backend: Arc<dyn GenerationBackend>,
    clock: Arc<dyn Clock>,
    session: Mutex<Session>,
    /// Held for the whole backend call; serialises generations.
    flight: tokio::sync::Mutex<()>,
    /// Ticket of the most recent `advance` call. Callers queued on `flight`
    /// behind a newer call give up without running.
    issued: AtomicU64,
    state_tx: watch::Sender<TurnState>,
}

impl fmt::Debug for TurnController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TurnController")
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

impl TurnController {
    /// Creates a controller for a session that has not started.
    #[must_use]
    pub fn new(backend: Arc<dyn GenerationBackend>, clock: Arc<dyn Clock>) -> Self {
        Self::with_log(backend, clock, SessionLog::new())
    }

    /// Creates a controller that continues from an existing log.
    #[must_use]
    pub fn with_log(
        backend: Arc<dyn GenerationBackend>,
        clock: Arc<dyn Clock>,
        log: SessionLog,
    ) -> Self {
        let (state_tx, _) = watch::channel(TurnState::Idle);
        Self {
            backend,
            clock,
            session: Mutex::new(Session {
                log,
                state: TurnState::Idle,
                in_flight: None,
            }),
            flight: tokio::sync::Mutex::new(()),
            issued: AtomicU64::new(0),
            state_tx,
        }
    }

    /// Returns the current turn state.
    #[must_use]
    pub fn state(&self) -> TurnState {
        self.session().state.clone()
    }

    /// Subscribes to turn state transitions.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<TurnState> {
        self.state_tx.subscribe()
    }

    /// Returns a snapshot of the narration log.
    #[must_use]
    pub fn events(&self) -> Vec<NarrationEvent> {
        self.session().log.events().to_vec()
    }

    /// Returns a snapshot of the whole session log.
    #[must_use]
    pub fn log(&self) -> SessionLog {
        self.session().log.clone()
    }

    /// Actions the user may pick right now.
    ///
    /// Empty while a turn is running or after a failure, so that stale
    /// actions are never offered against a log they don't match.
    #[must_use]
    pub fn offered_actions(&self) -> ActionSet {
        let session = self.session();
        if session.state.is_idle() {
            session.log.actions().clone()
        } else {
            ActionSet::empty()
        }
    }

    /// Returns `true` if no turn has ever completed.
    #[must_use]
    pub fn is_pristine(&self) -> bool {
        self.session().log.is_pristine()
    }

    /// Signals cancellation to the in-flight turn, if any.
    ///
    /// Does not wait for the turn to settle. Calling it while idle, or more
    /// than once for the same turn, has no further effect.
    pub fn abort(&self) {
        let session = self.session();
        if let Some(token) = session.in_flight.as_ref().filter(|t| !t.is_cancelled()) {
            info!("aborting in-flight turn");
            token.cancel();
        }
    }

    /// Advances the session by one turn.
    ///
    /// Any turn still outstanding from an earlier call is aborted and awaited
    /// first, so two generations never overlap. Earlier calls still waiting
    /// for their turn are superseded and settle as `Cancelled` without
    /// contacting the backend.
    ///
    /// # Errors
    ///
    /// - `TurnError::Cancelled` if the turn was aborted; state returns to what
    ///   it was before the call.
    /// - `TurnError::Backend` if generation failed; state becomes `Failed`
    ///   and remembers `action` for retry.
    /// - `TurnError::ActionNotOffered` / `TurnError::ActionRequired` if
    ///   `action` does not fit the current action set. The backend is not
    ///   contacted.
    #[instrument(skip(self, progress), fields(turn_id = tracing::field::Empty))]
    pub async fn advance(
        &self,
        action: Option<ActionId>,
        progress: &dyn ProgressSink,
    ) -> Result<(), TurnError> {
        let ticket = self.issued.fetch_add(1, Ordering::SeqCst) + 1;
        self.abort();
        let _gate = self.flight.lock().await;
        if self.issued.load(Ordering::SeqCst) != ticket {
            debug!("superseded by a newer turn before starting");
            return Err(TurnError::Cancelled);
        }

        let command = AdvanceTurn::new(action);
        tracing::Span::current().record("turn_id", tracing::field::display(command.turn_id));

        let (request, flight) = self.begin(&command).inspect_err(|err| {
            warn!(error = %err, "rejected turn without contacting the backend");
        })?;

        let relay = ProgressRelay {
            sink: progress,
            turn_id: command.turn_id,
        };
        let outcome = self.backend.generate(request, &relay, &flight.token).await;

        self.settle(command, flight, outcome)
    }

    fn session(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn transition(&self, session: &mut Session, next: TurnState) {
        session.state = next.clone();
        self.state_tx.send_replace(next);
    }

    fn begin(&self, command: &AdvanceTurn) -> Result<(GenerationRequest, InFlight<'_>), TurnError> {
        let mut session = self.session();
        check_action(session.log.actions(), command.action.as_ref())?;

        let token = CancellationToken::new();
        let previous = session.state.clone();
        session.in_flight = Some(token.clone());
        self.transition(
            &mut session,
            TurnState::Running {
                turn_id: command.turn_id,
                action: command.action.clone(),
            },
        );

        let request = GenerationRequest {
            turn_id: command.turn_id,
            log: session.log.events().to_vec(),
            action: command.action.clone(),
        };
        info!(log_len = request.log.len(), "turn started");

        Ok((
            request,
            InFlight {
                controller: self,
                token,
                previous: Some(previous),
            },
        ))
    }

    fn settle(
        &self,
        command: AdvanceTurn,
        flight: InFlight<'_>,
        outcome: Result<Generation, GenerationError>,
    ) -> Result<(), TurnError> {
        let (token, previous) = flight.land();
        let mut session = self.session();
        session.in_flight = None;

        if token.is_cancelled() || matches!(outcome, Err(GenerationError::Cancelled)) {
            info!("turn cancelled");
            self.transition(&mut session, previous);
            return Err(TurnError::Cancelled);
        }

        let stamped = outcome.and_then(|generation| {
            self.stamp(session.log.next_sequence_number(), command.turn_id, generation)
        });
        match stamped {
            Ok((events, actions)) => {
                info!(
                    appended = events.len(),
                    offered = actions.len(),
                    "turn completed"
                );
                session.log.commit_turn(events, actions);
                self.transition(&mut session, TurnState::Idle);
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "turn failed");
                self.transition(
                    &mut session,
                    TurnState::Failed {
                        action: command.action,
                    },
                );
                Err(TurnError::Backend(err))
            }
        }
    }

    /// Wraps generated payloads in event envelopes and validates the actions.
    fn stamp(
        &self,
        first_sequence_number: i64,
        turn_id: Uuid,
        generation: Generation,
    ) -> Result<(Vec<NarrationEvent>, ActionSet), GenerationError> {
        let actions = ActionSet::new(generation.actions)
            .map_err(|e| GenerationError::Validation(e.to_string()))?;
        let occurred_at = self.clock.now();
        let events = generation
            .narration
            .into_iter()
            .zip(first_sequence_number..)
            .map(|(payload, sequence_number)| NarrationEvent {
                metadata: EventMetadata {
                    event_id: Uuid::new_v4(),
                    sequence_number,
                    correlation_id: turn_id,
                    occurred_at,
                },
                payload,
            })
            .collect();
        Ok((events, actions))
    }
}

/// An action-less turn is accepted only when nothing is on offer.
fn check_action(offered: &ActionSet, action: Option<&ActionId>) -> Result<(), TurnError> {
    match action {
        Some(action) if !offered.contains(action) => {
            Err(TurnError::ActionNotOffered(action.clone()))
        }
        None if !offered.is_empty() => Err(TurnError::ActionRequired),
        _ => Ok(()),
    }
}

/// Bookkeeping for the running turn.
///
/// If the `advance` future is dropped mid-flight, the turn is cancelled and
/// the previous state restored.
struct InFlight<'a> {
    controller: &'a TurnController,
    token: CancellationToken,
    previous: Option<TurnState>,
}

impl InFlight<'_> {
    fn land(mut self) -> (CancellationToken, TurnState) {
        let previous = self.previous.take().unwrap_or_default();
        (self.token.clone(), previous)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if let Some(previous) = self.previous.take() {
            warn!("turn dropped before settling");
            self.token.cancel();
            let mut session = self.controller.session();
            session.in_flight = None;
            self.controller.transition(&mut session, previous);
        }
    }
}

/// Forwards backend progress to the caller's sink, unbuffered.
struct ProgressRelay<'a> {
    sink: &'a dyn ProgressSink,
    turn_id: Uuid,
}

impl ProgressSink for ProgressRelay<'_> {
    fn report(&self, progress: &ProgressReport) {
        trace!(
            turn_id = %self.turn_id,
            title = %progress.title,
            token_count = progress.token_count,
            "progress"
        );
        self.sink.report(progress);
    }
}
