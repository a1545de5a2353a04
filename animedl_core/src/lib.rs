//! Concurrent episode downloader: discovers a series' episodes and
//! streams them to disk through a bounded worker pool.

pub mod batch;
pub mod config;
pub mod discovery;
pub mod downloader;
pub mod paths;
pub mod progress;
pub mod types;

pub use batch::{BatchCoordinator, BatchReport};
pub use config::{build_client, DownloadConfig};
pub use discovery::{AnimeWorldSource, EpisodeRange, EpisodeSource};
pub use downloader::{FetchUnit, HttpFetchUnit, WorkerPool};
pub use progress::{NoopSink, ProgressSink};
pub use types::{TaskDescriptor, TaskOutcome, TaskStatus};
