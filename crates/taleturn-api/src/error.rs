//! Taleturn API: error types.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use taleturn_core::error::{GenerationError, TurnError};
use thiserror::Error;

/// Startup and runtime errors for the API server.
#[derive(Debug, Error)]
pub enum AppError {
    /// A required environment variable is missing or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// The generation backend could not be constructed.
    #[error("backend error: {0}")]
    Backend(#[from] GenerationError),

    /// Network binding or I/O error.
    #[error("server error: {0}")]
    Server(#[from] std::io::Error),
}

/// JSON body returned for error responses.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Machine-readable error code.
    pub error: &'static str,
    /// Human-readable error message.
    pub message: String,
}

/// HTTP-layer error for session requests.
#[derive(Debug)]
pub enum ApiError {
    /// The driver or controller rejected the turn.
    Turn(TurnError),
    /// A turn is already running; the client must wait or abort it.
    TurnInProgress,
}

impl From<TurnError> for ApiError {
    fn from(err: TurnError) -> Self {
        Self::Turn(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code, message) = match &self {
            Self::TurnInProgress => (
                StatusCode::CONFLICT,
                "turn_in_progress",
                "a turn is already running".to_owned(),
            ),
            Self::Turn(err) => {
                let (status, code) = match err {
                    TurnError::ActionNotOffered(_) => {
                        (StatusCode::BAD_REQUEST, "action_not_offered")
                    }
                    TurnError::ActionRequired => (StatusCode::BAD_REQUEST, "action_required"),
                    TurnError::NothingToRetry => (StatusCode::CONFLICT, "nothing_to_retry"),
                    TurnError::Cancelled => (StatusCode::CONFLICT, "turn_cancelled"),
                    TurnError::Backend(_) => (StatusCode::BAD_GATEWAY, "generation_failed"),
                };
                (status, code, err.user_message())
            }
        };

        let body = ErrorBody {
            error: error_code,
            message,
        };

        (status, Json(body)).into_response()
    }
}
