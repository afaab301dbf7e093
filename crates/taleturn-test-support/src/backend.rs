//! Test backends: scripted `GenerationBackend` implementations for tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use taleturn_core::action::ActionId;
use taleturn_core::backend::{Generation, GenerationBackend, GenerationRequest};
use taleturn_core::error::GenerationError;
use taleturn_core::progress::{ProgressReport, ProgressSink};
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

/// Builds the narration payload the scripted backend produces for `text`.
#[must_use]
pub fn narration(text: &str) -> serde_json::Value {
    serde_json::json!({ "text": text })
}

/// How a scripted generation settles.
#[derive(Debug, Clone)]
pub enum Outcome {
    /// Return the generation immediately.
    Succeed(Generation),
    /// Return the error immediately.
    Fail(GenerationError),
    /// Wait for cancellation, then settle with `GenerationError::Cancelled`.
    StallUntilCancelled,
    /// Wait for cancellation, then succeed anyway (a misbehaving backend).
    IgnoreCancel(Generation),
}

#[derive(Debug)]
struct Step {
    progress: Vec<ProgressReport>,
    outcome: Outcome,
}

/// A generation backend that plays back a script of outcomes, one per call.
///
/// Records every request and tracks how many calls are outstanding at once.
/// A call beyond the end of the script fails with a generation error.
#[derive(Debug, Default)]
pub struct ScriptedBackend {
    steps: Mutex<VecDeque<Step>>,
    requests: Mutex<Vec<GenerationRequest>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    started: Notify,
}

impl ScriptedBackend {
    /// Creates a backend with an empty script.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a step with the given outcome.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn then(self, outcome: Outcome) -> Self {
        self.steps.lock().unwrap().push_back(Step {
            progress: Vec::new(),
            outcome,
        });
        self
    }

    /// Appends a successful step producing `texts` as narration.
    #[must_use]
    pub fn then_succeed(self, texts: &[&str], actions: &[&str]) -> Self {
        self.then(Outcome::Succeed(generation(texts, actions)))
    }

    /// Appends a failing step.
    #[must_use]
    pub fn then_fail(self, error: GenerationError) -> Self {
        self.then(Outcome::Fail(error))
    }

    /// Appends a step that only settles once cancelled.
    #[must_use]
    pub fn then_stall(self) -> Self {
        self.then(Outcome::StallUntilCancelled)
    }

    /// Appends a step that waits for cancellation and then succeeds anyway.
    #[must_use]
    pub fn then_ignore_cancel(self, texts: &[&str], actions: &[&str]) -> Self {
        self.then(Outcome::IgnoreCancel(generation(texts, actions)))
    }

    /// Attaches progress reports to the most recently added step. They are
    /// emitted in order before the step settles.
    ///
    /// # Panics
    ///
    /// Panics if no step has been added yet.
    #[must_use]
    pub fn with_progress(self, reports: Vec<ProgressReport>) -> Self {
        self.steps
            .lock()
            .unwrap()
            .back_mut()
            .expect("with_progress requires a preceding step")
            .progress = reports;
        self
    }

    /// Returns a snapshot of every request received so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Number of `generate` calls received.
    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// The largest number of `generate` calls ever outstanding at once.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Completes once a `generate` call has started.
    pub async fn started(&self) {
        self.started.notified().await;
    }
}

fn generation(texts: &[&str], actions: &[&str]) -> Generation {
    Generation::new(
        texts.iter().map(|t| narration(t)).collect(),
        actions.iter().map(|a| ActionId::from(*a)).collect(),
    )
}

/// Decrements the outstanding counter even if the call is dropped.
struct CallGuard<'a>(&'a AtomicUsize);

impl Drop for CallGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl GenerationBackend for ScriptedBackend {
    async fn generate(
        &self,
        request: GenerationRequest,
        progress: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<Generation, GenerationError> {
        let outstanding = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        let _guard = CallGuard(&self.in_flight);
        self.max_in_flight.fetch_max(outstanding, Ordering::SeqCst);

        self.requests.lock().unwrap().push(request);
        let step = self.steps.lock().unwrap().pop_front();
        self.started.notify_one();

        let Some(step) = step else {
            return Err(GenerationError::Generation("script exhausted".into()));
        };
        for report in &step.progress {
            progress.report(report);
        }

        match step.outcome {
            Outcome::Succeed(generation) => Ok(generation),
            Outcome::Fail(error) => Err(error),
            Outcome::StallUntilCancelled => {
                cancel.cancelled().await;
                Err(GenerationError::Cancelled)
            }
            Outcome::IgnoreCancel(generation) => {
                cancel.cancelled().await;
                Ok(generation)
            }
        }
    }
}
