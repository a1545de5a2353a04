use std::path::Path;

use serde::Serialize;

use crate::types::{FailureKind, SeriesError, TaskOutcome, TaskStatus};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskFailure {
    pub task_id: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeriesFailure {
    pub series: String,
    pub reason: String,
}

/// Summary of one batch. Successes are only counted; failures keep
/// their reason.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub attempted: usize,
    pub succeeded: usize,
    pub bytes_written: u64,
    pub failures: Vec<TaskFailure>,
    pub series_errors: Vec<SeriesFailure>,
}

impl BatchReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_outcome(&mut self, outcome: TaskOutcome) {
        self.attempted += 1;
        self.bytes_written += outcome.bytes_written;
        match outcome.status {
            TaskStatus::Succeeded => self.succeeded += 1,
            TaskStatus::Failed(error) => {
                let prefix = match error.kind() {
                    FailureKind::Fetch => "fetch",
                    FailureKind::Write => "write",
                };
                self.failures.push(TaskFailure {
                    task_id: outcome.task_id,
                    reason: format!("{}: {}", prefix, error),
                });
            }
        }
    }

    /// An episode whose video URL could not be resolved. It counts as
    /// attempted and failed, but never reached the worker pool.
    pub fn record_unresolved(&mut self, task_id: impl Into<String>, reason: impl Into<String>) {
        self.attempted += 1;
        self.failures.push(TaskFailure {
            task_id: task_id.into(),
            reason: reason.into(),
        });
    }

    pub fn record_series_error(&mut self, series: impl Into<String>, error: &SeriesError) {
        self.series_errors.push(SeriesFailure {
            series: series.into(),
            reason: error.to_string(),
        });
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty() || !self.series_errors.is_empty()
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub async fn write_json(&self, path: &Path) -> std::io::Result<()> {
        let json = self.to_json().map_err(std::io::Error::other)?;
        tokio::fs::write(path, json).await
    }
}
