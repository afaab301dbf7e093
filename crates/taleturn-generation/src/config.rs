//! Backend configuration.

use std::time::Duration;

/// Connection and sampling settings for [`ChatCompletionsBackend`].
///
/// [`ChatCompletionsBackend`]: crate::ChatCompletionsBackend
#[derive(Debug, Clone)]
pub struct ChatCompletionsConfig {
    /// Server root, without the `/v1/...` path.
    pub base_url: String,
    /// Model name sent with every request.
    pub model: String,
    /// Bearer token, if the server wants one.
    pub api_key: Option<String>,
    /// Sampling temperature.
    pub temperature: f32,
    /// Upper bound on a whole request, streaming included.
    pub request_timeout: Duration,
    /// How many of the latest narration events are sent as context.
    pub history_window: usize,
}

impl Default for ChatCompletionsConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:1234".to_owned(),
            model: "local-model".to_owned(),
            api_key: None,
            temperature: 0.7,
            request_timeout: Duration::from_secs(120),
            history_window: 20,
        }
    }
}

impl ChatCompletionsConfig {
    /// Full URL of the chat-completions endpoint.
    #[must_use]
    pub fn endpoint(&self) -> String {
        format!("{}/v1/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_tolerates_trailing_slash() {
        let config = ChatCompletionsConfig {
            base_url: "http://localhost:8080/".into(),
            ..ChatCompletionsConfig::default()
        };
        assert_eq!(config.endpoint(), "http://localhost:8080/v1/chat/completions");
    }
}
