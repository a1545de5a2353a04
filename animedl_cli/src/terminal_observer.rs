use async_trait::async_trait;
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use std::collections::HashMap;
use std::sync::Mutex;

use animedl_core::progress::{format_bytes, ProgressObserver, ProgressSnapshot, TaskSnapshot};

/// Renders batch progress as indicatif terminal bars.
///
/// One `ProgressBar` per episode, plus a total bar kept at the bottom.
/// All bars live under a shared `MultiProgress` so they render cleanly.
pub struct TerminalProgressObserver {
    multi: MultiProgress,
    /// task_id → ProgressBar (lazily initialised on first sight)
    bars: Mutex<HashMap<String, ProgressBar>>,
    total_bar: Mutex<Option<ProgressBar>>,
}

impl TerminalProgressObserver {
    pub fn new() -> Self {
        Self {
            multi: MultiProgress::new(),
            bars: Mutex::new(HashMap::new()),
            total_bar: Mutex::new(None),
        }
    }

    fn task_style() -> ProgressStyle {
        ProgressStyle::with_template(
            "{spinner:.green} [{bar:30.cyan/blue}] {percent:>3}% {bytes}/{total_bytes} ETA {eta} {msg}",
        )
        .unwrap()
        .progress_chars("=>-")
    }

    fn total_style() -> ProgressStyle {
        ProgressStyle::with_template(
            "Total [{bar:30.green/white}] {bytes}/{total_bytes} ({binary_bytes_per_sec}) ETA {eta} {msg}",
        )
        .unwrap()
        .progress_chars("=>-")
    }

    /// Returns the bar for a task, creating it above the total bar if needed.
    fn bar_for(&self, task: &TaskSnapshot) -> ProgressBar {
        let mut bars = self.bars.lock().unwrap();
        if let Some(pb) = bars.get(&task.task_id) {
            return pb.clone();
        }

        let total_bar = self.total_bar.lock().unwrap();
        let pb = ProgressBar::new(task.total_bytes.max(1));
        let pb = match total_bar.as_ref() {
            Some(total) => self.multi.insert_before(total, pb),
            None => self.multi.add(pb),
        };
        pb.set_style(Self::task_style());
        pb.set_message(task.task_id.clone());
        bars.insert(task.task_id.clone(), pb.clone());
        pb
    }

    fn update_total(&self, snapshot: &ProgressSnapshot) {
        let mut total_bar = self.total_bar.lock().unwrap();
        let pb = total_bar.get_or_insert_with(|| {
            let pb = self.multi.add(ProgressBar::new(snapshot.total_bytes.max(1)));
            pb.set_style(Self::total_style());
            pb
        });
        pb.set_length(snapshot.total_bytes.max(snapshot.total_bytes_downloaded).max(1));
        pb.set_position(snapshot.total_bytes_downloaded);
    }
}

#[async_trait]
impl ProgressObserver for TerminalProgressObserver {
    async fn on_series_start(&self, title: &str, task_count: usize) {
        self.multi
            .println(format!("== {} ({} episodes) ==", title, task_count))
            .ok();
    }

    async fn on_progress(&self, snapshot: &ProgressSnapshot) {
        for task in snapshot.tasks.iter().filter(|t| !t.done) {
            let pb = self.bar_for(task);
            pb.set_length(task.total_bytes.max(task.bytes_downloaded).max(1));
            pb.set_position(task.bytes_downloaded);
        }
        self.update_total(snapshot);
    }

    async fn on_task_done(&self, task: &TaskSnapshot) {
        let pb = self.bar_for(task);
        pb.set_length(task.bytes_downloaded.max(1));
        pb.set_position(task.bytes_downloaded);
        pb.finish_with_message(format!("{} done", task.task_id));
    }

    async fn on_task_failed(&self, task: &TaskSnapshot, reason: &str) {
        let pb = self.bar_for(task);
        pb.abandon_with_message(format!("{} failed: {}", task.task_id, reason));
    }

    async fn on_complete(&self, snapshot: &ProgressSnapshot) {
        if let Some(pb) = self.total_bar.lock().unwrap().as_ref() {
            let speed = format_bytes(snapshot.speed as u64);
            let total = format_bytes(snapshot.total_bytes_downloaded);
            pb.finish_with_message(format!("Complete: {} at {}/s", total, speed));
        }
    }
}
