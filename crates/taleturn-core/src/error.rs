//! Error types for generation backends and turn advancement.

use thiserror::Error;

use crate::action::ActionId;

/// Label shown to the user when a failure carries no message of its own.
pub const UNKNOWN_ERROR_MESSAGE: &str = "Unknown error";

/// Errors a generation backend settles with.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    /// The backend observed its cancellation token and stopped.
    #[error("generation cancelled")]
    Cancelled,

    /// The backend could not reach, or was rejected by, its model server.
    #[error("{0}")]
    Transport(String),

    /// The model failed to produce a usable continuation.
    #[error("{0}")]
    Generation(String),

    /// The model's output did not satisfy the backend contract.
    #[error("{0}")]
    Validation(String),
}

impl GenerationError {
    /// Returns the message carried by the error, if it has a non-empty one.
    #[must_use]
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Cancelled => None,
            Self::Transport(message)
            | Self::Generation(message)
            | Self::Validation(message) => {
                Some(message.as_str()).filter(|m| !m.trim().is_empty())
            }
        }
    }
}

/// Errors returned by `TurnController::advance` and the session driver.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TurnError {
    /// The turn was aborted before it settled. Never shown to the user.
    #[error("turn cancelled")]
    Cancelled,

    /// The generation backend failed. Recoverable by retrying the same input.
    #[error("generation failed: {0}")]
    Backend(GenerationError),

    /// The requested action is not in the current action set.
    #[error("action `{0}` is not currently offered")]
    ActionNotOffered(ActionId),

    /// An action-less turn was requested while actions are on offer.
    #[error("an action must be chosen while actions are on offer")]
    ActionRequired,

    /// A retry was requested but the last turn did not fail.
    #[error("there is no failed turn to retry")]
    NothingToRetry,
}

impl TurnError {
    /// Returns `true` for the distinguished cancellation error.
    #[must_use]
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Returns `true` for caller mistakes that never reached the backend.
    #[must_use]
    pub fn is_misuse(&self) -> bool {
        matches!(
            self,
            Self::ActionNotOffered(_) | Self::ActionRequired | Self::NothingToRetry
        )
    }

    /// Text to surface to the user for this error.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Backend(err) => err
                .message()
                .map_or_else(|| UNKNOWN_ERROR_MESSAGE.to_owned(), str::to_owned),
            other => other.to_string(),
        }
    }
}

impl From<GenerationError> for TurnError {
    fn from(err: GenerationError) -> Self {
        match err {
            GenerationError::Cancelled => Self::Cancelled,
            other => Self::Backend(other),
        }
    }
}

/// Returns `true` if `error` is the distinguished cancellation error.
///
/// Every caller of `advance` uses this to decide whether a failure should be
/// surfaced to the user.
#[must_use]
pub fn is_cancellation(error: &TurnError) -> bool {
    error.is_cancellation()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_cancellation_only_matches_cancelled() {
        assert!(is_cancellation(&TurnError::Cancelled));
        assert!(!is_cancellation(&TurnError::Backend(
            GenerationError::Transport("connection refused".into())
        )));
        assert!(!is_cancellation(&TurnError::ActionRequired));
    }

    #[test]
    fn test_generation_cancelled_converts_to_turn_cancelled() {
        let err: TurnError = GenerationError::Cancelled.into();
        assert_eq!(err, TurnError::Cancelled);
    }

    #[test]
    fn test_user_message_uses_backend_text() {
        let err = TurnError::Backend(GenerationError::Transport("connection refused".into()));
        assert_eq!(err.user_message(), "connection refused");
    }

    #[test]
    fn test_user_message_falls_back_when_backend_message_is_blank() {
        let err = TurnError::Backend(GenerationError::Generation("  ".into()));
        assert_eq!(err.user_message(), UNKNOWN_ERROR_MESSAGE);
    }

    #[test]
    fn test_misuse_classification() {
        assert!(TurnError::ActionNotOffered(ActionId::from("fly")).is_misuse());
        assert!(TurnError::NothingToRetry.is_misuse());
        assert!(!TurnError::Cancelled.is_misuse());
    }
}
