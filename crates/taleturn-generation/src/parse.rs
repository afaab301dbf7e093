//! Turns model output into a [`Generation`].

use serde::Deserialize;
use taleturn_core::action::ActionId;
use taleturn_core::backend::Generation;
use taleturn_core::error::GenerationError;

#[derive(Debug, Deserialize)]
struct TurnReply {
    #[serde(default)]
    narration: Vec<serde_json::Value>,
    #[serde(default)]
    actions: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
    error: Option<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: Delta,
}

#[derive(Debug, Default, Deserialize)]
struct Delta {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    message: String,
}

/// Extracts the content delta from one streamed `data:` payload.
///
/// Returns `Ok(None)` for chunks that carry no text (role announcements,
/// finish markers).
///
/// # Errors
///
/// Returns `GenerationError::Generation` if the server streamed an error
/// object, and `GenerationError::Validation` if the payload is not JSON.
pub fn parse_delta(data: &str) -> Result<Option<String>, GenerationError> {
    let chunk: StreamChunk = serde_json::from_str(data)
        .map_err(|e| GenerationError::Validation(format!("malformed stream chunk: {e}")))?;
    if let Some(error) = chunk.error {
        return Err(GenerationError::Generation(error.message));
    }
    Ok(chunk
        .choices
        .into_iter()
        .filter_map(|choice| choice.delta.content)
        .reduce(|mut acc, part| {
            acc.push_str(&part);
            acc
        })
        .filter(|content| !content.is_empty()))
}

/// Extracts the `error.message` of a non-streaming error body, falling back
/// to the raw body.
#[must_use]
pub fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .map(String::from)
        })
        .unwrap_or_else(|| body.trim().to_owned())
}

/// Parses the model's finished reply.
///
/// Tolerates prose or code fences around the JSON object. Narration strings
/// become `{"text": ...}` payloads; objects are kept as-is. Blank actions are
/// dropped.
///
/// # Errors
///
/// Returns `GenerationError::Validation` if no well-formed reply object can be
/// found.
pub fn parse_generation(content: &str) -> Result<Generation, GenerationError> {
    let json = extract_json_object(content).ok_or_else(|| {
        GenerationError::Validation("model reply contained no JSON object".to_owned())
    })?;
    let reply: TurnReply = serde_json::from_str(json)
        .map_err(|e| GenerationError::Validation(format!("model reply was not a turn: {e}")))?;

    let narration = reply
        .narration
        .into_iter()
        .map(|entry| match entry {
            serde_json::Value::String(text) => Ok(serde_json::json!({ "text": text })),
            object @ serde_json::Value::Object(_) => Ok(object),
            other => Err(GenerationError::Validation(format!(
                "unexpected narration entry: {other}"
            ))),
        })
        .collect::<Result<Vec<_>, _>>()?;

    let actions = reply
        .actions
        .into_iter()
        .map(|action| action.trim().to_owned())
        .filter(|action| !action.is_empty())
        .map(ActionId::from)
        .collect();

    Ok(Generation::new(narration, actions))
}

fn extract_json_object(content: &str) -> Option<&str> {
    let start = content.find('{')?;
    let end = content.rfind('}')?;
    (end > start).then(|| &content[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_delta_reads_content() {
        let data = r#"{"choices":[{"delta":{"content":"Hello"},"index":0}]}"#;
        assert_eq!(parse_delta(data), Ok(Some("Hello".to_owned())));
    }

    #[test]
    fn test_parse_delta_ignores_role_only_chunk() {
        let data = r#"{"choices":[{"delta":{"role":"assistant"},"index":0}]}"#;
        assert_eq!(parse_delta(data), Ok(None));
    }

    #[test]
    fn test_parse_delta_surfaces_stream_error() {
        let data = r#"{"error":{"message":"context length exceeded"}}"#;
        assert_eq!(
            parse_delta(data),
            Err(GenerationError::Generation("context length exceeded".into()))
        );
    }

    #[test]
    fn test_parse_generation_handles_code_fences() {
        // Arrange
        let content = "Here you go:\n```json\n{\"narration\": [\"The door creaks.\", {\"text\": \"A draft.\", \"mood\": \"cold\"}], \"actions\": [\"enter\", \" \", \"leave \"]}\n```";

        // Act
        let generation = parse_generation(content).unwrap();

        // Assert
        assert_eq!(generation.narration.len(), 2);
        assert_eq!(generation.narration[0]["text"], "The door creaks.");
        assert_eq!(generation.narration[1]["mood"], "cold");
        assert_eq!(generation.actions, [ActionId::from("enter"), ActionId::from("leave")]);
    }

    #[test]
    fn test_parse_generation_rejects_prose() {
        let result = parse_generation("Once upon a time there was no JSON.");
        assert!(matches!(result, Err(GenerationError::Validation(_))));
    }

    #[test]
    fn test_parse_generation_rejects_numeric_narration() {
        let result = parse_generation(r#"{"narration": [42], "actions": []}"#);
        assert!(matches!(result, Err(GenerationError::Validation(_))));
    }

    #[test]
    fn test_error_message_prefers_structured_body() {
        assert_eq!(
            error_message(r#"{"error":{"message":"invalid api key"}}"#),
            "invalid api key"
        );
        assert_eq!(error_message("Bad Gateway\n"), "Bad Gateway");
    }
}
