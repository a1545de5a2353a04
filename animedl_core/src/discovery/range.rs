use crate::discovery::EpisodeRef;
use crate::types::ConfigError;

/// Inclusive episode-number filter. A missing bound is open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EpisodeRange {
    start: Option<u32>,
    end: Option<u32>,
}

impl EpisodeRange {
    /// Every episode.
    pub fn all() -> Self {
        Self::default()
    }

    pub fn new(start: Option<u32>, end: Option<u32>) -> Result<Self, ConfigError> {
        if let (Some(start), Some(end)) = (start, end) {
            if start > end {
                return Err(ConfigError::InvertedRange { start, end });
            }
        }
        Ok(Self { start, end })
    }

    pub fn contains(&self, number: u32) -> bool {
        self.start.map_or(true, |s| number >= s) && self.end.map_or(true, |e| number <= e)
    }

    /// Keeps the episodes inside the range, preserving order.
    pub fn select(&self, episodes: Vec<EpisodeRef>) -> Vec<EpisodeRef> {
        episodes.into_iter().filter(|e| self.contains(e.number)).collect()
    }
}
