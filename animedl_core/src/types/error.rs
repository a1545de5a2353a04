use std::path::PathBuf;

use thiserror::Error;

/// Which side of a task failed: the remote fetch or the local write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Fetch,
    Write,
}

/// Task-level failure. Recorded in a `TaskOutcome`, never propagated
/// out of the worker pool.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// Connection failure, timeout, or a body stream that broke mid-transfer.
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("server responded with HTTP {0}")]
    Status(u16),

    #[error("disk error: {0}")]
    Disk(#[from] std::io::Error),

    /// The worker running the task panicked or was aborted.
    #[error("worker aborted: {0}")]
    WorkerAborted(String),
}

impl DownloadError {
    pub fn kind(&self) -> FailureKind {
        match self {
            DownloadError::Disk(_) => FailureKind::Write,
            DownloadError::Network(_)
            | DownloadError::Status(_)
            | DownloadError::WorkerAborted(_) => FailureKind::Fetch,
        }
    }
}

/// Series-level failure of the URL-discovery collaborator.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("not a series URL: {0}")]
    InvalidSeriesUrl(String),

    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} responded with HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("series title not found on {0}")]
    MissingTitle(String),

    #[error("no episodes found on {0}")]
    NoEpisodes(String),

    #[error("no download link on episode page {0}")]
    MissingDownloadLink(String),

    #[error("no episodes of {title} fall inside the requested range")]
    EmptyRange { title: String },
}

/// Anything that stops one series from being dispatched. Other series
/// in the same batch still run.
#[derive(Debug, Error)]
pub enum SeriesError {
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),

    #[error("could not create {path:?}: {source}")]
    Directory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Invalid invocation. Raised before anything is dispatched.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("episode range start {start} is after end {end}")]
    InvertedRange { start: u32, end: u32 },

    #[error("concurrency limit must be at least 1")]
    ZeroConcurrency,

    #[error("{name} is not a valid number: {value:?}")]
    InvalidNumber { name: &'static str, value: String },

    #[error("could not read batch file {path:?}: {source}")]
    BatchFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
}
