//! Shared test doubles and utilities for the Taleturn narrative engine.

mod backend;
mod clock;
mod progress;

pub use backend::{Outcome, ScriptedBackend, narration};
pub use clock::FixedClock;
pub use progress::RecordingProgressSink;
