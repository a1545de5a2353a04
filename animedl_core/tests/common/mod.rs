#![allow(dead_code)]

use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::Mutex;
use std::thread;

use animedl_core::progress::ProgressSink;

/// Generates deterministic test data.
pub fn generate_test_data(size: usize) -> Vec<u8> {
    (0..size).map(|i| (i % 251) as u8).collect()
}

/// One-shot HTTP/1.1 server that announces `promised` bytes in
/// `Content-Length`, sends `body`, then closes the connection. Returns the
/// URL to GET.
pub fn start_truncating_server(promised: usize, body: Vec<u8>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    thread::spawn(move || {
        if let Ok((mut stream, _)) = listener.accept() {
            let mut buf = [0u8; 4096];
            let _ = stream.read(&mut buf);
            let head = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: video/mp4\r\nContent-Length: {}\r\n\r\n",
                promised
            );
            let _ = stream.write_all(head.as_bytes());
            let _ = stream.write_all(&body);
            let _ = stream.flush();
        }
    });
    format!("http://127.0.0.1:{}/cut.mp4", port)
}

#[derive(Debug, Clone, PartialEq)]
pub enum SinkCall {
    Report { task_id: String, bytes_done: u64, total: Option<u64> },
    Finish { task_id: String },
    Fail { task_id: String, reason: String },
    Series { title: String, task_count: usize },
}

/// Sink that records every call, in order.
#[derive(Default)]
pub struct RecordingSink {
    calls: Mutex<Vec<SinkCall>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<SinkCall> {
        self.calls.lock().unwrap().clone()
    }

    /// `bytes_done` of every report for one task, in call order.
    pub fn reports_for(&self, task_id: &str) -> Vec<u64> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                SinkCall::Report { task_id: id, bytes_done, .. } if id == task_id => Some(bytes_done),
                _ => None,
            })
            .collect()
    }

    pub fn finished(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                SinkCall::Finish { task_id } => Some(task_id),
                _ => None,
            })
            .collect()
    }

    pub fn failed(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                SinkCall::Fail { task_id, .. } => Some(task_id),
                _ => None,
            })
            .collect()
    }
}

impl ProgressSink for RecordingSink {
    fn report(&self, task_id: &str, bytes_done: u64, total: Option<u64>) {
        self.calls.lock().unwrap().push(SinkCall::Report {
            task_id: task_id.to_string(),
            bytes_done,
            total,
        });
    }

    fn finish(&self, task_id: &str) {
        self.calls.lock().unwrap().push(SinkCall::Finish {
            task_id: task_id.to_string(),
        });
    }

    fn fail(&self, task_id: &str, reason: &str) {
        self.calls.lock().unwrap().push(SinkCall::Fail {
            task_id: task_id.to_string(),
            reason: reason.to_string(),
        });
    }

    fn begin_series(&self, title: &str, task_count: usize) {
        self.calls.lock().unwrap().push(SinkCall::Series {
            title: title.to_string(),
            task_count,
        });
    }
}
