//! Routes for the narrative session.
//!
//! Turn-issuing endpoints validate up front, spawn the turn onto the runtime
//! and answer `202 Accepted`; clients poll `GET /api/v1/session` for the
//! outcome.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::{Json, Router, routing::get, routing::post};
use serde::{Deserialize, Serialize};
use taleturn_core::action::ActionId;
use taleturn_core::error::TurnError;
use taleturn_narrative::application::driver::{SessionDriver, TurnOutcome};
use taleturn_narrative::application::query_handlers::{self, SessionView};
use tracing::{info, instrument, warn};

use crate::error::ApiError;
use crate::state::AppState;

/// Request body for POST /actions.
#[derive(Debug, Deserialize)]
pub struct SelectActionRequest {
    /// One of the currently offered actions.
    pub action: ActionId,
}

/// Response body for accepted turns.
#[derive(Debug, Serialize)]
pub struct TurnAccepted {
    /// The action the turn was issued with.
    pub action: Option<ActionId>,
}

/// Spawns the opening turn of the session.
pub fn spawn_start(driver: Arc<SessionDriver>) {
    tokio::spawn(async move { log_outcome(driver.start().await) });
}

fn log_outcome(result: Result<TurnOutcome, TurnError>) {
    match result {
        Ok(outcome) => info!(?outcome, "turn settled"),
        Err(err) => warn!(error = %err, "turn failed"),
    }
}

/// GET /
async fn get_session(State(state): State<AppState>) -> Json<SessionView> {
    Json(query_handlers::get_session_view(&state.driver))
}

/// POST /actions
#[instrument(skip(state, request), fields(action = %request.action))]
async fn select_action(
    State(state): State<AppState>,
    Json(request): Json<SelectActionRequest>,
) -> Result<(StatusCode, Json<TurnAccepted>), ApiError> {
    let controller = state.driver.controller();
    if controller.state().is_running() {
        return Err(ApiError::TurnInProgress);
    }
    if !controller.offered_actions().contains(&request.action) {
        return Err(TurnError::ActionNotOffered(request.action).into());
    }

    let driver = Arc::clone(&state.driver);
    let action = request.action.clone();
    tokio::spawn(async move { log_outcome(driver.select_action(action).await) });

    Ok((
        StatusCode::ACCEPTED,
        Json(TurnAccepted {
            action: Some(request.action),
        }),
    ))
}

/// POST /retry
#[instrument(skip(state))]
async fn retry(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<TurnAccepted>), ApiError> {
    let turn = state.driver.controller().state();
    if turn.is_running() {
        return Err(ApiError::TurnInProgress);
    }
    let Some(action) = turn.retry_action().map(Option::<&ActionId>::cloned) else {
        return Err(TurnError::NothingToRetry.into());
    };

    let driver = Arc::clone(&state.driver);
    tokio::spawn(async move { log_outcome(driver.retry().await) });

    Ok((StatusCode::ACCEPTED, Json(TurnAccepted { action })))
}

/// POST /dismiss
async fn dismiss(State(state): State<AppState>) -> Json<SessionView> {
    state.driver.dismiss_error();
    Json(query_handlers::get_session_view(&state.driver))
}

/// POST /abort
#[instrument(skip(state))]
async fn abort(State(state): State<AppState>) -> StatusCode {
    state.driver.controller().abort();
    StatusCode::ACCEPTED
}

/// Returns the router for session endpoints.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(get_session))
        .route("/actions", post(select_action))
        .route("/retry", post(retry))
        .route("/dismiss", post(dismiss))
        .route("/abort", post(abort))
}
