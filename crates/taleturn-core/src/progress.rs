//! Progress reporting while a turn is running.

use serde::Serialize;

/// A transient progress notification emitted by a generation backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressReport {
    /// Short label, e.g. "Generating narration".
    pub title: String,
    /// Optional detail line.
    pub message: Option<String>,
    /// Work done so far in this turn, non-decreasing within a turn.
    pub token_count: u64,
}

impl ProgressReport {
    #[must_use]
    pub fn new(title: impl Into<String>, token_count: u64) -> Self {
        Self {
            title: title.into(),
            message: None,
            token_count,
        }
    }

    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// Caller-supplied receiver of progress reports.
///
/// Reports are delivered synchronously, in emission order, on the task that
/// is driving the turn.
pub trait ProgressSink: Send + Sync {
    /// Receives one progress report.
    fn report(&self, progress: &ProgressReport);
}

impl<F> ProgressSink for F
where
    F: Fn(&ProgressReport) + Send + Sync,
{
    fn report(&self, progress: &ProgressReport) {
        self(progress);
    }
}

/// A sink that discards every report.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&self, _progress: &ProgressReport) {}
}
