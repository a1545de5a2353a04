use async_trait::async_trait;
use reqwest::{Client, Url};
use scraper::{Html, Selector};

use super::{EpisodeRef, EpisodeSource, SeriesIndex};
use crate::types::DiscoveryError;

const TITLE_SELECTOR: &str = "h1.title[data-jtitle]";
const EPISODE_SELECTOR: &str = "div.server.active li.episode a[data-id]";
const DOWNLOAD_LINK_SELECTOR: &str = "a#alternativeDownloadLink[href]";

fn selector(css: &'static str) -> Selector {
    Selector::parse(css).expect("static selector is valid")
}

/// Scrapes AnimeWorld-style sites.
///
/// Series URLs look like `<origin>/play/<anime-id>/<episode-id>`. The series
/// page carries the title in `h1.title[data-jtitle]` and one
/// `li.episode > a[data-id]` per episode inside the active server block;
/// each episode page links its video file from `#alternativeDownloadLink`.
pub struct AnimeWorldSource {
    client: Client,
}

impl AnimeWorldSource {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    async fn fetch_page(&self, url: &str) -> Result<String, DiscoveryError> {
        log::debug!("[discovery] GET {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| DiscoveryError::Request {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(DiscoveryError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(|source| DiscoveryError::Request {
            url: url.to_string(),
            source,
        })
    }
}

/// Splits a series URL into `(<origin>/play/, anime id)`.
pub fn split_series_url(series_url: &str) -> Result<(String, String), DiscoveryError> {
    let invalid = || DiscoveryError::InvalidSeriesUrl(series_url.to_string());
    let url = Url::parse(series_url).map_err(|_| invalid())?;
    if url.cannot_be_a_base() || url.host_str().is_none() {
        return Err(invalid());
    }

    let segments: Vec<&str> = url
        .path_segments()
        .map(|s| s.filter(|seg| !seg.is_empty()).collect())
        .unwrap_or_default();

    let anime_id = match segments.iter().position(|s| *s == "play") {
        Some(i) => segments.get(i + 1).copied(),
        None if segments.len() >= 2 => segments.get(segments.len() - 2).copied(),
        None => None,
    }
    .ok_or_else(invalid)?;

    let host_page = format!("{}/play/", url.origin().ascii_serialization());
    Ok((host_page, anime_id.to_string()))
}

/// Extracts the title and episode list from a series page.
pub fn parse_series_page(
    html: &str,
    page_url: &str,
    host_page: &str,
    anime_id: &str,
) -> Result<SeriesIndex, DiscoveryError> {
    let document = Html::parse_document(html);

    let title = document
        .select(&selector(TITLE_SELECTOR))
        .next()
        .and_then(|h1| h1.value().attr("data-jtitle"))
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| DiscoveryError::MissingTitle(page_url.to_string()))?;

    let episodes: Vec<EpisodeRef> = document
        .select(&selector(EPISODE_SELECTOR))
        .enumerate()
        .filter_map(|(position, link)| {
            let data_id = link.value().attr("data-id")?.trim();
            if data_id.is_empty() {
                return None;
            }
            let number = link
                .value()
                .attr("data-episode-num")
                .and_then(|n| n.trim().parse::<u32>().ok())
                .or_else(|| link.text().collect::<String>().trim().parse::<u32>().ok())
                .unwrap_or(position as u32 + 1);
            Some(EpisodeRef {
                number,
                page_url: format!("{}{}/{}", host_page, anime_id, data_id),
            })
        })
        .collect();

    if episodes.is_empty() {
        return Err(DiscoveryError::NoEpisodes(page_url.to_string()));
    }

    Ok(SeriesIndex { title, episodes })
}

/// Extracts the direct video URL from an episode page, resolved against
/// the page URL so relative links work.
pub fn parse_episode_page(html: &str, page_url: &str) -> Result<String, DiscoveryError> {
    let document = Html::parse_document(html);
    let href = document
        .select(&selector(DOWNLOAD_LINK_SELECTOR))
        .next()
        .and_then(|a| a.value().attr("href"))
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .ok_or_else(|| DiscoveryError::MissingDownloadLink(page_url.to_string()))?;

    match Url::parse(page_url).and_then(|base| base.join(href)) {
        Ok(url) => Ok(url.to_string()),
        Err(_) => Ok(href.to_string()),
    }
}

#[async_trait]
impl EpisodeSource for AnimeWorldSource {
    async fn list(&self, series_url: &str) -> Result<SeriesIndex, DiscoveryError> {
        let (host_page, anime_id) = split_series_url(series_url)?;
        let html = self.fetch_page(series_url).await?;
        let index = parse_series_page(&html, series_url, &host_page, &anime_id)?;
        log::info!(
            "[discovery] {}: {} episodes listed",
            index.title,
            index.episodes.len()
        );
        Ok(index)
    }

    async fn resolve(&self, episode: &EpisodeRef) -> Result<String, DiscoveryError> {
        let html = self.fetch_page(&episode.page_url).await?;
        parse_episode_page(&html, &episode.page_url)
    }
}
