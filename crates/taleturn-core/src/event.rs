//! Narration event abstractions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Metadata the controller attaches to every narration event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventMetadata {
    /// Unique event identifier.
    pub event_id: Uuid,
    /// Position in the session log, starting at 1.
    pub sequence_number: i64,
    /// The turn that produced this event.
    pub correlation_id: Uuid,
    /// Timestamp of event creation.
    pub occurred_at: DateTime<Utc>,
}

/// An immutable entry in the narration log.
///
/// The payload is whatever the generation backend produced; nothing in the
/// controller inspects it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NarrationEvent {
    /// Event metadata.
    pub metadata: EventMetadata,
    /// Backend-defined narration payload.
    pub payload: serde_json::Value,
}

impl NarrationEvent {
    #[must_use]
    pub fn metadata(&self) -> &EventMetadata {
        &self.metadata
    }

    #[must_use]
    pub fn payload(&self) -> &serde_json::Value {
        &self.payload
    }

    /// Returns the `text` field of the payload, if it carries one.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.payload.get("text").and_then(serde_json::Value::as_str)
    }
}
