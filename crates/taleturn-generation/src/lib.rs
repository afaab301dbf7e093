//! Taleturn: streaming chat-completions generation backend.
//!
//! [`ChatCompletionsBackend`] drives an OpenAI-compatible
//! `/v1/chat/completions` endpoint (LM Studio, llama.cpp server, vLLM, or a
//! hosted API) with `stream: true`, reporting one progress tick per streamed
//! content delta and parsing the finished reply into narration and actions.

mod client;
mod config;
pub mod parse;
pub mod prompt;
mod sse;

pub use client::ChatCompletionsBackend;
pub use config::ChatCompletionsConfig;
