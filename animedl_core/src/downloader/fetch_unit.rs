use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{Client, Response};
use tokio::io::{AsyncWriteExt, BufWriter};

use crate::config::{DownloadConfig, DEFAULT_CHUNK_SIZE, DEFAULT_WRITE_BUFFER};
use crate::progress::ProgressSink;
use crate::types::{DownloadError, TaskDescriptor, TaskOutcome};

/// Runs one task to completion. Exactly one attempt, no retries; every
/// failure comes back as a `TaskOutcome`, never as an `Err` or a panic.
#[async_trait]
pub trait FetchUnit: Send + Sync {
    async fn execute(&self, task: &TaskDescriptor, sink: &dyn ProgressSink) -> TaskOutcome;
}

/// Streams a task's source URL straight into its destination file.
///
/// The body is never held in memory as a whole: each network chunk is
/// written through a `BufWriter` in slices of at most `chunk_size` bytes,
/// and the sink is told the running total after every slice.
pub struct HttpFetchUnit {
    client: Client,
    chunk_size: usize,
    write_buffer: usize,
}

impl HttpFetchUnit {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            chunk_size: DEFAULT_CHUNK_SIZE,
            write_buffer: DEFAULT_WRITE_BUFFER,
        }
    }

    pub fn from_config(client: Client, config: &DownloadConfig) -> Self {
        Self {
            client,
            chunk_size: config.chunk_size.max(1),
            write_buffer: config.write_buffer.max(1),
        }
    }

    pub fn with_chunk_size(mut self, bytes: usize) -> Self {
        self.chunk_size = bytes.max(1);
        self
    }

    async fn open(&self, task: &TaskDescriptor) -> Result<Response, DownloadError> {
        let response = self.client.get(&task.source_url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::Status(status.as_u16()));
        }
        Ok(response)
    }

    /// Copies the body into `writer`. `written` is kept current so the
    /// caller knows how much landed on disk even when this fails.
    async fn stream_body(
        &self,
        task: &TaskDescriptor,
        response: Response,
        writer: &mut BufWriter<tokio::fs::File>,
        written: &mut u64,
        sink: &dyn ProgressSink,
    ) -> Result<(), DownloadError> {
        let total = task.expected_size.or_else(|| response.content_length());
        sink.report(&task.id, 0, total);

        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            for slice in chunk.chunks(self.chunk_size) {
                writer.write_all(slice).await?;
                *written += slice.len() as u64;
                sink.report(&task.id, *written, total);
            }
        }
        Ok(())
    }
}

#[async_trait]
impl FetchUnit for HttpFetchUnit {
    async fn execute(&self, task: &TaskDescriptor, sink: &dyn ProgressSink) -> TaskOutcome {
        log::debug!("[fetch] task={}: GET {}", task.id, task.source_url);

        let response = match self.open(task).await {
            Ok(r) => r,
            Err(e) => {
                log::warn!("[fetch] task={}: {}", task.id, e);
                sink.fail(&task.id, &e.to_string());
                return TaskOutcome::failed(task.id.clone(), e, 0);
            }
        };

        let file = match tokio::fs::File::create(&task.destination_path).await {
            Ok(f) => f,
            Err(e) => {
                let e = DownloadError::Disk(e);
                log::warn!(
                    "[fetch] task={}: cannot create {:?}: {}",
                    task.id,
                    task.destination_path,
                    e
                );
                sink.fail(&task.id, &e.to_string());
                return TaskOutcome::failed(task.id.clone(), e, 0);
            }
        };
        let mut writer = BufWriter::with_capacity(self.write_buffer, file);

        let mut written = 0u64;
        let streamed = self
            .stream_body(task, response, &mut writer, &mut written, sink)
            .await;

        // Flush on every path so a partial file holds every byte received.
        let flushed = writer.flush().await.map_err(DownloadError::from);
        drop(writer);

        match streamed.and(flushed) {
            Ok(()) => {
                log::info!("[fetch] task={}: finished, {} bytes", task.id, written);
                sink.finish(&task.id);
                TaskOutcome::succeeded(task.id.clone(), written)
            }
            Err(e) => {
                log::warn!(
                    "[fetch] task={}: failed after {} bytes: {} (partial file kept at {:?})",
                    task.id,
                    written,
                    e,
                    task.destination_path
                );
                sink.fail(&task.id, &e.to_string());
                TaskOutcome::failed(task.id.clone(), e, written)
            }
        }
    }
}
