/// Receives byte-level progress from fetch units.
///
/// Called concurrently from every worker, synchronously after each chunk
/// is written. Implementations must return promptly and must not fail:
/// dropping or buffering an update is fine, blocking the fetch is not.
/// `bytes_done` is absolute, so a dropped update is superseded by the next.
pub trait ProgressSink: Send + Sync {
    fn report(&self, task_id: &str, bytes_done: u64, total: Option<u64>);

    fn finish(&self, task_id: &str);

    fn fail(&self, task_id: &str, _reason: &str) {
        self.finish(task_id);
    }

    /// Marks the start of a series so renderers can group its tasks.
    fn begin_series(&self, _title: &str, _task_count: usize) {}
}

/// Discards everything. For headless runs.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSink;

impl ProgressSink for NoopSink {
    fn report(&self, _task_id: &str, _bytes_done: u64, _total: Option<u64>) {}

    fn finish(&self, _task_id: &str) {}
}
