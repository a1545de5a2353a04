pub mod error;
pub mod task;

pub use error::{ConfigError, DiscoveryError, DownloadError, FailureKind, SeriesError};
pub use task::{TaskDescriptor, TaskOutcome, TaskStatus};
