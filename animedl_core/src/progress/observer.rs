use async_trait::async_trait;

use super::snapshot::{ProgressSnapshot, TaskSnapshot};

/// Trait for anything that wants to observe batch progress.
///
/// The `ProgressNotifier` calls these methods on all registered observers
/// after folding raw `ProgressEvent`s into its per-task state.
///
/// Lifecycle:
/// - `on_series_start` once per series, before its tasks report.
/// - `on_progress` for every progress event (per-chunk granularity).
/// - `on_task_done` / `on_task_failed` once per task that reaches an end.
/// - `on_complete` once, after every sink has been dropped.
#[async_trait]
pub trait ProgressObserver: Send + Sync + 'static {
    async fn on_series_start(&self, _title: &str, _task_count: usize) {}

    async fn on_progress(&self, snapshot: &ProgressSnapshot);

    async fn on_task_done(&self, task: &TaskSnapshot);

    async fn on_task_failed(&self, task: &TaskSnapshot, reason: &str);

    async fn on_complete(&self, snapshot: &ProgressSnapshot);
}
