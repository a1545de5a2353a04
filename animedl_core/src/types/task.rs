use std::path::PathBuf;

use super::error::DownloadError;

/// One episode download. Never mutated once built; progress and status
/// live in the `TaskOutcome` produced for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskDescriptor {
    pub id: String,
    pub source_url: String,
    pub destination_path: PathBuf,
    /// Known size in bytes, if the caller has one. Otherwise the fetch
    /// falls back to the response's `Content-Length`.
    pub expected_size: Option<u64>,
}

impl TaskDescriptor {
    pub fn new(
        id: impl Into<String>,
        source_url: impl Into<String>,
        destination_path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            id: id.into(),
            source_url: source_url.into(),
            destination_path: destination_path.into(),
            expected_size: None,
        }
    }

    pub fn with_expected_size(mut self, size: u64) -> Self {
        self.expected_size = Some(size);
        self
    }
}

#[derive(Debug)]
pub enum TaskStatus {
    Succeeded,
    Failed(DownloadError),
}

/// Terminal result of one task.
#[derive(Debug)]
pub struct TaskOutcome {
    pub task_id: String,
    pub status: TaskStatus,
    /// Bytes on disk when the task ended. On failure this is whatever was
    /// written before the error; the partial file is left in place.
    pub bytes_written: u64,
}

impl TaskOutcome {
    pub fn succeeded(task_id: impl Into<String>, bytes_written: u64) -> Self {
        Self {
            task_id: task_id.into(),
            status: TaskStatus::Succeeded,
            bytes_written,
        }
    }

    pub fn failed(task_id: impl Into<String>, error: DownloadError, bytes_written: u64) -> Self {
        Self {
            task_id: task_id.into(),
            status: TaskStatus::Failed(error),
            bytes_written,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.status, TaskStatus::Succeeded)
    }

    /// The failure, if any.
    pub fn error(&self) -> Option<&DownloadError> {
        match &self.status {
            TaskStatus::Succeeded => None,
            TaskStatus::Failed(e) => Some(e),
        }
    }
}
