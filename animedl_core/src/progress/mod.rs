pub mod notifier;
pub mod observer;
pub mod sink;
pub mod snapshot;

pub use notifier::{ChannelSink, ProgressEvent, ProgressNotifier};
pub use observer::ProgressObserver;
pub use sink::{NoopSink, ProgressSink};
pub use snapshot::{format_bytes, ProgressSnapshot, TaskSnapshot};
