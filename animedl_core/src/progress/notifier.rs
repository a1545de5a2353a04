use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Instant;

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;

use super::observer::ProgressObserver;
use super::sink::ProgressSink;
use super::snapshot::{ProgressSnapshot, TaskSnapshot};

/// EMA smoothing factor. 0.3 = responsive but stable.
const EMA_ALPHA: f64 = 0.3;

/// Default capacity of the channel between sinks and the notifier.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

/// Raw message sent from a `ChannelSink` to the notifier task.
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressEvent {
    SeriesStarted { title: String, task_count: usize },
    Progress { task_id: String, bytes_done: u64, total: Option<u64> },
    /// `bytes_done` carries the last count whose `Progress` was dropped.
    Finished { task_id: String, bytes_done: Option<u64> },
    Failed { task_id: String, reason: String, bytes_done: Option<u64> },
}

/// `ProgressSink` that forwards into a bounded channel drained by a single
/// `ProgressNotifier`. Cheap to clone; the notifier completes once every
/// clone is dropped.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::Sender<ProgressEvent>,
    dropped: Arc<Mutex<HashMap<String, u64>>>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::Sender<ProgressEvent>) -> Self {
        Self {
            tx,
            dropped: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn remember_dropped(&self, task_id: &str, bytes_done: u64) {
        if let Ok(mut dropped) = self.dropped.lock() {
            let last = dropped.entry(task_id.to_string()).or_insert(0);
            *last = (*last).max(bytes_done);
        }
    }

    fn take_dropped(&self, task_id: &str) -> Option<u64> {
        self.dropped.lock().ok().and_then(|mut d| d.remove(task_id))
    }

    /// Terminal and grouping events must not be lost. If the channel is
    /// momentarily full, hand the send off to the runtime instead of
    /// blocking the caller.
    fn send_control(&self, event: ProgressEvent) {
        match self.tx.try_send(event) {
            Ok(()) | Err(TrySendError::Closed(_)) => {}
            Err(TrySendError::Full(event)) => match tokio::runtime::Handle::try_current() {
                Ok(handle) => {
                    let tx = self.tx.clone();
                    handle.spawn(async move {
                        let _ = tx.send(event).await;
                    });
                }
                Err(_) => log::warn!("[progress] channel full, dropped {:?}", event),
            },
        }
    }
}

impl ProgressSink for ChannelSink {
    fn report(&self, task_id: &str, bytes_done: u64, total: Option<u64>) {
        // Progress is absolute; a dropped update is superseded by the next one
        // or by the terminal event, which carries the last dropped count.
        if let Err(TrySendError::Full(_)) = self.tx.try_send(ProgressEvent::Progress {
            task_id: task_id.to_string(),
            bytes_done,
            total,
        }) {
            log::trace!("[progress] channel full, dropped update for {}", task_id);
            self.remember_dropped(task_id, bytes_done);
        }
    }

    fn finish(&self, task_id: &str) {
        self.send_control(ProgressEvent::Finished {
            task_id: task_id.to_string(),
            bytes_done: self.take_dropped(task_id),
        });
    }

    fn fail(&self, task_id: &str, reason: &str) {
        self.send_control(ProgressEvent::Failed {
            task_id: task_id.to_string(),
            reason: reason.to_string(),
            bytes_done: self.take_dropped(task_id),
        });
    }

    fn begin_series(&self, title: &str, task_count: usize) {
        self.send_control(ProgressEvent::SeriesStarted {
            title: title.to_string(),
            task_count,
        });
    }
}

/// Internal per-task tracking (purely data, no UI).
struct TaskProgress {
    task_id: String,
    bytes_downloaded: u64,
    total_bytes: u64,
    speed: f64,
    last_update: Instant,
    done: bool,
    failed: bool,
}

impl TaskProgress {
    fn new(task_id: String, now: Instant) -> Self {
        Self {
            task_id,
            bytes_downloaded: 0,
            total_bytes: 0,
            speed: 0.0,
            last_update: now,
            done: false,
            failed: false,
        }
    }

    fn snapshot(&self) -> TaskSnapshot {
        let rem = self.total_bytes.saturating_sub(self.bytes_downloaded);
        let eta = if self.speed > 0.0 && !self.done {
            rem as f64 / self.speed
        } else {
            0.0
        };
        TaskSnapshot {
            task_id: self.task_id.clone(),
            bytes_downloaded: self.bytes_downloaded,
            total_bytes: self.total_bytes,
            speed: self.speed,
            eta_secs: eta,
            done: self.done,
            failed: self.failed,
        }
    }
}

/// Sole owner of the per-task progress map. Consumes `ProgressEvent`s,
/// aggregates them into `ProgressSnapshot`s, and fans out to all
/// registered observers.
///
/// # Lifecycle
///
/// | Channel message          | Observer method called            |
/// |--------------------------|-----------------------------------|
/// | `SeriesStarted`          | `on_series_start(title, count)`   |
/// | `Progress`               | `on_progress(&snapshot)`          |
/// | `Finished`               | `on_task_done(&task)`             |
/// | `Failed`                 | `on_task_failed(&task, reason)`   |
/// | Channel closed           | `on_complete(&final_snapshot)`    |
pub struct ProgressNotifier {
    observers: Vec<Box<dyn ProgressObserver>>,
    tasks: HashMap<String, TaskProgress>,
    task_order: Vec<String>,
    start_time: Instant,
}

impl ProgressNotifier {
    pub fn new() -> Self {
        Self {
            observers: Vec::new(),
            tasks: HashMap::new(),
            task_order: Vec::new(),
            start_time: Instant::now(),
        }
    }

    /// Register an observer. Must be called before `run()` / `spawn()`.
    pub fn add_observer(&mut self, observer: Box<dyn ProgressObserver>) {
        self.observers.push(observer);
    }

    /// Spawn the notifier on the current runtime and return the sink that
    /// feeds it. Await the handle after dropping every sink clone to make
    /// sure `on_complete` has run.
    pub fn spawn(self, capacity: usize) -> (ChannelSink, JoinHandle<()>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let handle = tokio::spawn(self.run(rx));
        (ChannelSink::new(tx), handle)
    }

    /// Consume events until every sender has been dropped.
    pub async fn run(mut self, mut progress_rx: mpsc::Receiver<ProgressEvent>) {
        while let Some(event) = progress_rx.recv().await {
            self.handle_event(event).await;
        }
        self.finish().await;
    }

    async fn handle_event(&mut self, event: ProgressEvent) {
        match event {
            ProgressEvent::SeriesStarted { title, task_count } => {
                for observer in &self.observers {
                    observer.on_series_start(&title, task_count).await;
                }
            }
            ProgressEvent::Progress {
                task_id,
                bytes_done,
                total,
            } => {
                self.apply_progress(task_id, bytes_done, total);
                let snapshot = self.build_snapshot();
                for observer in &self.observers {
                    observer.on_progress(&snapshot).await;
                }
            }
            ProgressEvent::Finished { task_id, bytes_done } => {
                let task = self.entry(task_id);
                task.bytes_downloaded = task.bytes_downloaded.max(bytes_done.unwrap_or(0));
                task.done = true;
                if task.total_bytes == 0 {
                    task.total_bytes = task.bytes_downloaded;
                }
                let snap = task.snapshot();
                for observer in &self.observers {
                    observer.on_task_done(&snap).await;
                }
            }
            ProgressEvent::Failed {
                task_id,
                reason,
                bytes_done,
            } => {
                let task = self.entry(task_id);
                task.bytes_downloaded = task.bytes_downloaded.max(bytes_done.unwrap_or(0));
                task.done = true;
                task.failed = true;
                let snap = task.snapshot();
                for observer in &self.observers {
                    observer.on_task_failed(&snap, &reason).await;
                }
            }
        }
    }

    /// Lazily track a task on first sight.
    fn entry(&mut self, task_id: String) -> &mut TaskProgress {
        if !self.tasks.contains_key(&task_id) {
            self.task_order.push(task_id.clone());
        }
        self.tasks
            .entry(task_id.clone())
            .or_insert_with(|| TaskProgress::new(task_id, Instant::now()))
    }

    fn apply_progress(&mut self, task_id: String, bytes_done: u64, total: Option<u64>) {
        let now = Instant::now();
        let task = self.entry(task_id);

        // Late or duplicated updates never move a task backwards.
        let delta = bytes_done.saturating_sub(task.bytes_downloaded);
        task.bytes_downloaded = task.bytes_downloaded.max(bytes_done);

        if let Some(tb) = total {
            task.total_bytes = tb;
        }

        let elapsed = now.duration_since(task.last_update).as_secs_f64();
        if elapsed > 0.0 {
            let instant_speed = delta as f64 / elapsed;
            task.speed = EMA_ALPHA * instant_speed + (1.0 - EMA_ALPHA) * task.speed;
            task.last_update = now;
        }
    }

    fn build_snapshot(&self) -> ProgressSnapshot {
        let tasks: Vec<TaskSnapshot> = self
            .task_order
            .iter()
            .filter_map(|id| self.tasks.get(id))
            .map(TaskProgress::snapshot)
            .collect();

        let total_bytes: u64 = tasks.iter().map(|t| t.total_bytes).sum();
        let total_downloaded: u64 = tasks.iter().map(|t| t.bytes_downloaded).sum();
        let combined_speed: f64 = tasks.iter().filter(|t| !t.done).map(|t| t.speed).sum();
        let remaining = total_bytes.saturating_sub(total_downloaded);
        let eta = if combined_speed > 0.0 {
            remaining as f64 / combined_speed
        } else {
            0.0
        };

        ProgressSnapshot {
            tasks,
            total_bytes_downloaded: total_downloaded,
            total_bytes,
            speed: combined_speed,
            eta_secs: eta,
            done: false,
        }
    }

    /// Build the final snapshot with `done = true` and notify all observers.
    async fn finish(self) {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        let mut final_snapshot = self.build_snapshot();
        final_snapshot.done = true;
        final_snapshot.speed = if elapsed > 0.0 {
            final_snapshot.total_bytes_downloaded as f64 / elapsed
        } else {
            0.0
        };
        final_snapshot.eta_secs = 0.0;

        for observer in &self.observers {
            observer.on_complete(&final_snapshot).await;
        }
    }
}

impl Default for ProgressNotifier {
    fn default() -> Self {
        Self::new()
    }
}
