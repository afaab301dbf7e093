//! The session log: narration timeline plus the current action set.

use serde::Serialize;

use crate::action::ActionSet;
use crate::event::NarrationEvent;

/// Append-only narration timeline and the actions currently on offer.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SessionLog {
    events: Vec<NarrationEvent>,
    actions: ActionSet,
}

impl SessionLog {
    /// Creates an empty log for a session that has not started.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Restores a log from previously recorded events and actions.
    #[must_use]
    pub fn from_parts(events: Vec<NarrationEvent>, actions: ActionSet) -> Self {
        Self { events, actions }
    }

    #[must_use]
    pub fn events(&self) -> &[NarrationEvent] {
        &self.events
    }

    #[must_use]
    pub fn actions(&self) -> &ActionSet {
        &self.actions
    }

    /// Returns `true` if no turn has ever completed.
    #[must_use]
    pub fn is_pristine(&self) -> bool {
        self.events.is_empty() && self.actions.is_empty()
    }

    /// Sequence number the next appended event will carry.
    #[allow(clippy::cast_possible_wrap)]
    #[must_use]
    pub fn next_sequence_number(&self) -> i64 {
        self.events.len() as i64 + 1
    }

    /// Applies a completed turn: appends `events` in order and replaces the
    /// action set wholesale.
    pub fn commit_turn(&mut self, events: Vec<NarrationEvent>, actions: ActionSet) {
        self.events.extend(events);
        self.actions = actions;
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use uuid::Uuid;

    use super::*;
    use crate::action::ActionId;
    use crate::event::EventMetadata;

    fn narration(sequence_number: i64, text: &str) -> NarrationEvent {
        NarrationEvent {
            metadata: EventMetadata {
                event_id: Uuid::new_v4(),
                sequence_number,
                correlation_id: Uuid::new_v4(),
                occurred_at: Utc::now(),
            },
            payload: serde_json::json!({ "text": text }),
        }
    }

    #[test]
    fn test_new_log_is_pristine() {
        let log = SessionLog::new();
        assert!(log.is_pristine());
        assert_eq!(log.next_sequence_number(), 1);
    }

    #[test]
    fn test_commit_turn_appends_and_replaces_actions() {
        // Arrange
        let mut log = SessionLog::new();
        log.commit_turn(
            vec![narration(1, "E1")],
            ActionSet::new(vec!["flee".into(), "fight".into()]).unwrap(),
        );

        // Act
        log.commit_turn(
            vec![narration(2, "E2"), narration(3, "E3")],
            ActionSet::new(vec!["rest".into()]).unwrap(),
        );

        // Assert
        let texts: Vec<_> = log.events().iter().filter_map(NarrationEvent::text).collect();
        assert_eq!(texts, ["E1", "E2", "E3"]);
        assert_eq!(log.actions().as_slice(), [ActionId::from("rest")]);
        assert_eq!(log.next_sequence_number(), 4);
        assert!(!log.is_pristine());
    }

    #[test]
    fn test_terminal_turn_leaves_log_non_pristine() {
        let mut log = SessionLog::new();
        log.commit_turn(vec![narration(1, "The end.")], ActionSet::empty());
        assert!(log.actions().is_empty());
        assert!(!log.is_pristine());
    }
}
