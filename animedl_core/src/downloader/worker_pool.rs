use std::sync::Arc;

use tokio::sync::Semaphore;

use crate::downloader::fetch_unit::FetchUnit;
use crate::progress::ProgressSink;
use crate::types::{DownloadError, TaskDescriptor, TaskOutcome};

/// Bounded pool of concurrent fetches.
///
/// Tasks are dispatched in input order, each one only after it has taken
/// one of `concurrency_limit` permits, so at most that many fetch units
/// are ever active. Each dispatched task runs on its own tokio task; the
/// handles are kept in input order, which is the order outcomes come back
/// in regardless of which finished first.
pub struct WorkerPool {
    fetcher: Arc<dyn FetchUnit>,
    concurrency_limit: usize,
}

impl WorkerPool {
    /// A limit of zero is treated as one.
    pub fn new(fetcher: Arc<dyn FetchUnit>, concurrency_limit: usize) -> Self {
        Self {
            fetcher,
            concurrency_limit: concurrency_limit.max(1),
        }
    }

    pub fn concurrency_limit(&self) -> usize {
        self.concurrency_limit
    }

    /// Runs every task and returns exactly one outcome per task, in input
    /// order. Individual failures never stop the rest of the batch.
    pub async fn run(
        &self,
        tasks: Vec<TaskDescriptor>,
        sink: Arc<dyn ProgressSink>,
    ) -> Vec<TaskOutcome> {
        if tasks.is_empty() {
            return Vec::new();
        }

        log::info!(
            "[pool] dispatching {} tasks across {} slots",
            tasks.len(),
            self.concurrency_limit
        );

        let semaphore = Arc::new(Semaphore::new(self.concurrency_limit));
        let mut handles = Vec::with_capacity(tasks.len());

        for task in tasks {
            let task_id = task.id.clone();
            // Wait for a free slot before spawning, so dispatch follows
            // input order and never overshoots the limit.
            let permit = match Arc::clone(&semaphore).acquire_owned().await {
                Ok(p) => p,
                Err(e) => {
                    handles.push((task_id, Err(e.to_string())));
                    continue;
                }
            };

            let fetcher = Arc::clone(&self.fetcher);
            let sink = Arc::clone(&sink);
            log::debug!("[pool] task={}: dispatched", task_id);

            let handle = tokio::spawn(async move {
                let _permit = permit;
                fetcher.execute(&task, &*sink).await
            });
            handles.push((task_id, Ok(handle)));
        }

        let results = futures::future::join_all(handles.into_iter().map(
            |(task_id, handle)| async move {
                match handle {
                    Ok(handle) => (task_id, handle.await.map_err(|e| e.to_string())),
                    Err(reason) => (task_id, Err(reason)),
                }
            },
        ))
        .await;

        let mut outcomes = Vec::with_capacity(results.len());
        for (task_id, result) in results {
            match result {
                Ok(outcome) => outcomes.push(outcome),
                Err(reason) => {
                    log::error!("[pool] task={}: worker aborted: {}", task_id, reason);
                    sink.fail(&task_id, &reason);
                    outcomes.push(TaskOutcome::failed(
                        task_id,
                        DownloadError::WorkerAborted(reason),
                        0,
                    ));
                }
            }
        }

        let failed = outcomes.iter().filter(|o| !o.is_success()).count();
        log::info!(
            "[pool] finished: {} succeeded, {} failed",
            outcomes.len() - failed,
            failed
        );
        outcomes
    }
}
