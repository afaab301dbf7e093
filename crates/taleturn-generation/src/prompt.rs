//! Builds the chat messages sent for a turn.
//!
//! Formatting only: no parsing, no networking.

use serde::Serialize;
use taleturn_core::backend::GenerationRequest;
use taleturn_core::event::NarrationEvent;

/// Instructions pinning the model to the reply format `parse` expects.
pub const SYSTEM_PROMPT: &str = "You are the narrator of an interactive story. \
Continue the story in the second person, a few vivid paragraphs at a time. \
Reply with exactly one JSON object and nothing else, shaped as \
{\"narration\": [\"paragraph\", ...], \"actions\": [\"short action\", ...]}. \
Offer two to four distinct actions the player could take next, each a few words long. \
When the story has reached its end, reply with an empty \"actions\" list.";

/// One chat message in OpenAI wire format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub role: &'static str,
    pub content: String,
}

impl ChatMessage {
    fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system",
            content: content.into(),
        }
    }

    fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user",
            content: content.into(),
        }
    }
}

/// Builds the messages for `request`, sending at most `history_window` of the
/// latest narration events as context.
#[must_use]
pub fn build_messages(request: &GenerationRequest, history_window: usize) -> Vec<ChatMessage> {
    let mut prompt = String::new();

    if request.is_first_turn() {
        prompt.push_str("Begin a new story and set the opening scene.\n");
    } else {
        let skip = request.log.len().saturating_sub(history_window);
        push_history_section(&mut prompt, &request.log[skip..]);
        push_player_action(&mut prompt, request);
    }

    vec![ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(prompt)]
}

fn push_history_section(prompt: &mut String, events: &[NarrationEvent]) {
    prompt.push_str("STORY SO FAR:\n");
    for event in events {
        match event.text() {
            Some(text) => prompt.push_str(text),
            None => prompt.push_str(&event.payload.to_string()),
        }
        prompt.push('\n');
    }
    prompt.push('\n');
}

fn push_player_action(prompt: &mut String, request: &GenerationRequest) {
    match &request.action {
        Some(action) => {
            prompt.push_str("PLAYER ACTION:\n");
            prompt.push_str(action.as_str());
            prompt.push('\n');
        }
        None => prompt.push_str("Continue the story.\n"),
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use taleturn_core::action::ActionId;
    use taleturn_core::event::EventMetadata;
    use uuid::Uuid;

    use super::*;

    fn event(sequence_number: i64, payload: serde_json::Value) -> NarrationEvent {
        NarrationEvent {
            metadata: EventMetadata {
                event_id: Uuid::new_v4(),
                sequence_number,
                correlation_id: Uuid::new_v4(),
                occurred_at: Utc::now(),
            },
            payload,
        }
    }

    #[test]
    fn test_first_turn_asks_for_opening_scene() {
        let request = GenerationRequest {
            turn_id: Uuid::new_v4(),
            log: Vec::new(),
            action: None,
        };

        let messages = build_messages(&request, 20);

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, "system");
        assert!(messages[1].content.contains("opening scene"));
    }

    #[test]
    fn test_history_is_windowed_and_action_appended() {
        // Arrange
        let log = vec![
            event(1, serde_json::json!({ "text": "You wake in a cellar." })),
            event(2, serde_json::json!({ "text": "A rat watches you." })),
            event(3, serde_json::json!({ "kind": "sound", "volume": 3 })),
        ];
        let request = GenerationRequest {
            turn_id: Uuid::new_v4(),
            log,
            action: Some(ActionId::from("fight")),
        };

        // Act
        let messages = build_messages(&request, 2);

        // Assert
        let prompt = &messages[1].content;
        assert!(!prompt.contains("cellar"));
        assert!(prompt.contains("A rat watches you."));
        assert!(prompt.contains("\"kind\":\"sound\""));
        assert!(prompt.ends_with("PLAYER ACTION:\nfight\n"));
    }
}
