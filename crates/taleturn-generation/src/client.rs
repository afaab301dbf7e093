//! HTTP client side of the chat-completions backend.

use std::future::Future;
use std::pin::pin;

use async_trait::async_trait;
use futures_util::StreamExt;
use serde::Serialize;
use taleturn_core::backend::{Generation, GenerationBackend, GenerationRequest};
use taleturn_core::error::GenerationError;
use taleturn_core::progress::{ProgressReport, ProgressSink};
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

use crate::config::ChatCompletionsConfig;
use crate::parse;
use crate::prompt::{self, ChatMessage};
use crate::sse::{DONE, SseLineBuffer};

const WAITING_TITLE: &str = "Waiting for model";
const GENERATING_TITLE: &str = "Generating narration";

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
    stream: bool,
}

/// Generation backend speaking the OpenAI chat-completions protocol.
#[derive(Debug, Clone)]
pub struct ChatCompletionsBackend {
    config: ChatCompletionsConfig,
    client: reqwest::Client,
}

impl ChatCompletionsBackend {
    /// Creates a backend for `config`.
    ///
    /// # Errors
    ///
    /// Returns `GenerationError::Transport` if the HTTP client cannot be
    /// built (e.g. the TLS backend fails to initialise).
    pub fn new(config: ChatCompletionsConfig) -> Result<Self, GenerationError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| GenerationError::Transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { config, client })
    }

    #[must_use]
    pub fn config(&self) -> &ChatCompletionsConfig {
        &self.config
    }
}

/// Races `future` against `cancel`, preferring cancellation.
async fn cancellable<F: Future>(
    cancel: &CancellationToken,
    future: F,
) -> Result<F::Output, GenerationError> {
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(GenerationError::Cancelled),
        output = future => Ok(output),
    }
}

#[async_trait]
impl GenerationBackend for ChatCompletionsBackend {
    #[instrument(skip_all, fields(turn_id = %request.turn_id, model = %self.config.model))]
    async fn generate(
        &self,
        request: GenerationRequest,
        progress: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<Generation, GenerationError> {
        progress.report(&ProgressReport::new(WAITING_TITLE, 0).with_message(&self.config.model));

        let endpoint = self.config.endpoint();
        let body = ChatCompletionRequest {
            model: &self.config.model,
            messages: prompt::build_messages(&request, self.config.history_window),
            temperature: self.config.temperature,
            stream: true,
        };
        let mut builder = self.client.post(&endpoint).json(&body);
        if let Some(api_key) = &self.config.api_key {
            builder = builder.bearer_auth(api_key);
        }

        let response = cancellable(cancel, builder.send())
            .await?
            .map_err(|e| GenerationError::Transport(format!("request to {endpoint} failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = cancellable(cancel, response.text()).await?.unwrap_or_default();
            return Err(GenerationError::Transport(format!(
                "model server returned HTTP {}: {}",
                status.as_u16(),
                parse::error_message(&body)
            )));
        }

        let mut stream = pin!(response.bytes_stream());
        let mut lines = SseLineBuffer::default();
        let mut content = String::new();
        let mut token_count = 0_u64;

        'stream: while let Some(chunk) = cancellable(cancel, stream.next()).await? {
            let chunk = chunk
                .map_err(|e| GenerationError::Transport(format!("response stream failed: {e}")))?;
            for data in lines.push(&chunk) {
                if data == DONE {
                    break 'stream;
                }
                if let Some(delta) = parse::parse_delta(&data)? {
                    content.push_str(&delta);
                    token_count += 1;
                    progress.report(&ProgressReport::new(GENERATING_TITLE, token_count));
                }
            }
        }

        debug!(token_count, reply_len = content.len(), "stream finished");
        parse::parse_generation(&content)
    }
}
