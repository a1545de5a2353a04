pub mod anime_world;
pub mod range;

use async_trait::async_trait;

use crate::types::DiscoveryError;

pub use anime_world::AnimeWorldSource;
pub use range::EpisodeRange;

/// An episode as listed on the series page, before its video URL is known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpisodeRef {
    pub number: u32,
    pub page_url: String,
}

/// What a series page tells us: its title and its episodes, in site order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeriesIndex {
    pub title: String,
    pub episodes: Vec<EpisodeRef>,
}

/// URL-discovery collaborator.
///
/// Split in two so episode-range filtering can happen before any episode
/// page is fetched.
#[async_trait]
pub trait EpisodeSource: Send + Sync {
    /// Title and ordered episode list for a series URL.
    async fn list(&self, series_url: &str) -> Result<SeriesIndex, DiscoveryError>;

    /// Direct video URL for one episode.
    async fn resolve(&self, episode: &EpisodeRef) -> Result<String, DiscoveryError>;
}
