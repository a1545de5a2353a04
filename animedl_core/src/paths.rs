//! Destination naming: one directory per series, one file per episode.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

const FALLBACK_DIR: &str = "series";

/// Characters rejected by at least one of Linux, macOS or Windows.
fn is_forbidden(c: char) -> bool {
    c.is_control() || matches!(c, '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*')
}

/// Turns a series title into a single safe directory name.
///
/// Forbidden characters become `_`, whitespace runs collapse to one
/// space, and leading/trailing dots and spaces are stripped so the result
/// can never be `.`, `..` or hidden.
pub fn sanitize_dir_name(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    let mut last_space = false;
    for c in title.chars() {
        if c.is_whitespace() {
            if !last_space {
                out.push(' ');
            }
            last_space = true;
            continue;
        }
        last_space = false;
        out.push(if is_forbidden(c) { '_' } else { c });
    }

    let trimmed = out.trim_matches(|c: char| c == '.' || c == ' ');
    if trimmed.is_empty() {
        FALLBACK_DIR.to_string()
    } else {
        trimmed.to_string()
    }
}

/// File name for an episode: the last path segment of its video URL, or
/// `Episode_<NN>.mp4` when the URL has none.
pub fn episode_file_name(video_url: &str, number: u32) -> String {
    let from_url = reqwest::Url::parse(video_url).ok().and_then(|url| {
        url.path_segments()
            .and_then(|segments| segments.last().map(str::to_string))
    });

    match from_url {
        Some(name) if !name.is_empty() && name != "." && name != ".." => {
            name.chars().map(|c| if is_forbidden(c) { '_' } else { c }).collect()
        }
        _ => format!("Episode_{:02}.mp4", number),
    }
}

/// `<root>/<sanitized title>`.
pub fn series_dir(root: &Path, title: &str) -> PathBuf {
    root.join(sanitize_dir_name(title))
}

/// Hands out file names that are unique within one series directory.
/// A repeated name gets an `E<NN>_` prefix.
#[derive(Debug, Default)]
pub struct UniqueNames {
    seen: HashSet<String>,
}

impl UniqueNames {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn claim(&mut self, name: String, number: u32) -> String {
        if self.seen.insert(name.clone()) {
            return name;
        }
        let mut candidate = format!("E{:02}_{}", number, name);
        let mut n = 2;
        while !self.seen.insert(candidate.clone()) {
            candidate = format!("E{:02}_{}_{}", number, n, name);
            n += 1;
        }
        candidate
    }
}
