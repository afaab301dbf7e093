//! Shared application state.

use std::sync::Arc;

use taleturn_narrative::application::driver::SessionDriver;

/// Application state shared across all request handlers.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The one session this server hosts.
    pub driver: Arc<SessionDriver>,
}

impl AppState {
    /// Create new application state.
    #[must_use]
    pub fn new(driver: Arc<SessionDriver>) -> Self {
        Self { driver }
    }
}
