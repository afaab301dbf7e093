//! Test progress sink: records every report it receives.

use std::sync::Mutex;

use taleturn_core::progress::{ProgressReport, ProgressSink};

/// A progress sink that records every report in arrival order.
#[derive(Debug, Default)]
pub struct RecordingProgressSink {
    reports: Mutex<Vec<ProgressReport>>,
}

impl RecordingProgressSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of all recorded reports.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn reports(&self) -> Vec<ProgressReport> {
        self.reports.lock().unwrap().clone()
    }

    /// Returns the token counts of all recorded reports.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn token_counts(&self) -> Vec<u64> {
        self.reports
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.token_count)
            .collect()
    }
}

impl ProgressSink for RecordingProgressSink {
    fn report(&self, progress: &ProgressReport) {
        self.reports.lock().unwrap().push(progress.clone());
    }
}
