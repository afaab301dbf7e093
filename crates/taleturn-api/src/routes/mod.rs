//! Route modules.

use axum::Router;

use crate::state::AppState;

pub mod health;
pub mod session;

/// Builds the full application router.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(health::router())
        .nest("/api/v1/session", session::router())
        .with_state(state)
}
