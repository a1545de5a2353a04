use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use futures::StreamExt;

use crate::config::DownloadConfig;
use crate::discovery::{EpisodeRange, EpisodeSource};
use crate::downloader::{FetchUnit, WorkerPool};
use crate::paths::{episode_file_name, series_dir, UniqueNames};
use crate::progress::ProgressSink;
use crate::types::{DiscoveryError, SeriesError, TaskDescriptor};

use super::report::BatchReport;

/// One series, ready for the worker pool.
#[derive(Debug)]
pub struct PreparedSeries {
    pub title: String,
    pub directory: PathBuf,
    pub tasks: Vec<TaskDescriptor>,
    /// Episodes whose video URL could not be resolved: `(task_id, reason)`.
    pub unresolved: Vec<(String, String)>,
}

/// Top-level driver: series URL → episode tasks → worker pool → report.
///
/// Series are processed one after another, each through its own pool run.
/// A series that fails discovery or directory creation is recorded and
/// skipped; the rest of the batch continues.
pub struct BatchCoordinator {
    source: Arc<dyn EpisodeSource>,
    pool: WorkerPool,
    sink: Arc<dyn ProgressSink>,
    download_dir: PathBuf,
    resolve_concurrency: usize,
}

impl BatchCoordinator {
    pub fn new(
        source: Arc<dyn EpisodeSource>,
        fetcher: Arc<dyn FetchUnit>,
        sink: Arc<dyn ProgressSink>,
        config: &DownloadConfig,
    ) -> Self {
        Self {
            source,
            pool: WorkerPool::new(fetcher, config.concurrency),
            sink,
            download_dir: config.download_dir.clone(),
            resolve_concurrency: config.resolve_concurrency.max(1),
        }
    }

    pub async fn run_batch(&self, series_sources: &[String], range: EpisodeRange) -> BatchReport {
        let mut report = BatchReport::new();
        log::info!(
            "[batch] {} series into {} ({} workers)",
            series_sources.len(),
            self.download_dir.display(),
            self.pool.concurrency_limit()
        );

        for series_url in series_sources {
            let prepared = match self.prepare_series(series_url, range).await {
                Ok(p) => p,
                Err(e) => {
                    log::error!("[batch] {}: {}", series_url, e);
                    report.record_series_error(series_url.as_str(), &e);
                    continue;
                }
            };

            for (task_id, reason) in prepared.unresolved {
                report.record_unresolved(task_id, reason);
            }

            self.sink.begin_series(&prepared.title, prepared.tasks.len());
            let outcomes = self.pool.run(prepared.tasks, Arc::clone(&self.sink)).await;
            for outcome in outcomes {
                report.record_outcome(outcome);
            }
        }

        log::info!(
            "[batch] done: {}/{} succeeded, {} series skipped",
            report.succeeded,
            report.attempted,
            report.series_errors.len()
        );
        report
    }

    /// Discovers, filters and resolves one series, creates its directory,
    /// and builds one task per resolved episode.
    pub async fn prepare_series(
        &self,
        series_url: &str,
        range: EpisodeRange,
    ) -> Result<PreparedSeries, SeriesError> {
        let index = self.source.list(series_url).await?;
        if index.episodes.is_empty() {
            return Err(DiscoveryError::NoEpisodes(series_url.to_string()).into());
        }

        let selected = range.select(index.episodes);
        if selected.is_empty() {
            return Err(DiscoveryError::EmptyRange { title: index.title }.into());
        }

        let source = Arc::clone(&self.source);
        let resolved: Vec<_> = futures::stream::iter(selected)
            .map(|episode| {
                let source = Arc::clone(&source);
                async move {
                    let link = source.resolve(&episode).await;
                    (episode, link)
                }
            })
            .buffered(self.resolve_concurrency)
            .collect()
            .await;

        let directory = series_dir(&self.download_dir, &index.title);
        tokio::fs::create_dir_all(&directory)
            .await
            .map_err(|source| SeriesError::Directory {
                path: directory.clone(),
                source,
            })?;

        let mut names = UniqueNames::new();
        let mut repeats: HashMap<u32, usize> = HashMap::new();
        let mut tasks = Vec::new();
        let mut unresolved = Vec::new();
        for (episode, link) in resolved {
            // Sources may list the same number twice; ids must stay distinct.
            let seen = repeats.entry(episode.number).or_insert(0);
            *seen += 1;
            let task_id = if *seen == 1 {
                format!("{} E{:02}", index.title, episode.number)
            } else {
                format!("{} E{:02} #{}", index.title, episode.number, seen)
            };
            match link {
                Ok(video_url) => {
                    let file_name = names.claim(
                        episode_file_name(&video_url, episode.number),
                        episode.number,
                    );
                    tasks.push(TaskDescriptor::new(
                        task_id,
                        video_url,
                        directory.join(file_name),
                    ));
                }
                Err(e) => {
                    log::warn!("[batch] {}: {}", task_id, e);
                    unresolved.push((task_id, format!("discovery: {}", e)));
                }
            }
        }

        Ok(PreparedSeries {
            title: index.title,
            directory,
            tasks,
            unresolved,
        })
    }
}
