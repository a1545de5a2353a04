mod common;

use std::sync::Arc;

use reqwest::Client;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use animedl_core::batch::BatchCoordinator;
use animedl_core::config::DownloadConfig;
use animedl_core::discovery::anime_world::{parse_episode_page, parse_series_page, split_series_url};
use animedl_core::discovery::{AnimeWorldSource, EpisodeRange, EpisodeRef, EpisodeSource};
use animedl_core::downloader::HttpFetchUnit;
use animedl_core::progress::NoopSink;
use animedl_core::types::DiscoveryError;
use common::generate_test_data;

fn series_html(title: &str, episodes: &[(&str, &str)]) -> String {
    let items: String = episodes
        .iter()
        .map(|(num, id)| {
            format!(
                r#"<li class="episode"><a data-episode-num="{num}" data-id="{id}" href="/play/x/{id}">{num}</a></li>"#
            )
        })
        .collect();
    format!(
        r#"<html><body>
        <h1 class="title" data-jtitle="{title}">Localized Title</h1>
        <div class="server" data-name="9"><ul><li class="episode"><a data-id="decoy">1</a></li></ul></div>
        <div class="server active" data-name="1"><ul>{items}</ul></div>
        </body></html>"#
    )
}

fn episode_html(href: &str) -> String {
    format!(r#"<html><body><a id="alternativeDownloadLink" href="{href}" class="btn">Download</a></body></html>"#)
}

// ---------------------------------------------------------------
// split_series_url
// ---------------------------------------------------------------

#[test]
fn test_split_series_url() {
    let (host, id) = split_series_url("https://www.animeworld.so/play/naruto.Ab12/XyZ9").unwrap();
    assert_eq!(host, "https://www.animeworld.so/play/");
    assert_eq!(id, "naruto.Ab12");
}

#[test]
fn test_split_series_url_keeps_port() {
    let (host, id) = split_series_url("http://127.0.0.1:8080/play/show.1/ep").unwrap();
    assert_eq!(host, "http://127.0.0.1:8080/play/");
    assert_eq!(id, "show.1");
}

#[test]
fn test_split_series_url_rejects_garbage() {
    assert!(matches!(
        split_series_url("not a url"),
        Err(DiscoveryError::InvalidSeriesUrl(_))
    ));
    assert!(matches!(
        split_series_url("https://www.animeworld.so/"),
        Err(DiscoveryError::InvalidSeriesUrl(_))
    ));
}

// ---------------------------------------------------------------
// Page parsing
// ---------------------------------------------------------------

#[test]
fn test_parse_series_page_reads_active_server_only() {
    let html = series_html("Naruto", &[("1", "aaa"), ("2", "bbb"), ("3", "ccc")]);
    let index = parse_series_page(&html, "page", "https://h/play/", "naruto.1").unwrap();

    assert_eq!(index.title, "Naruto");
    assert_eq!(
        index.episodes,
        vec![
            EpisodeRef { number: 1, page_url: "https://h/play/naruto.1/aaa".to_string() },
            EpisodeRef { number: 2, page_url: "https://h/play/naruto.1/bbb".to_string() },
            EpisodeRef { number: 3, page_url: "https://h/play/naruto.1/ccc".to_string() },
        ]
    );
}

#[test]
fn test_parse_series_page_falls_back_to_link_text_then_position() {
    let html = r#"<h1 class="title" data-jtitle="Show"></h1>
        <div class="server active"><ul>
          <li class="episode"><a data-id="a">7</a></li>
          <li class="episode"><a data-id="b">Special</a></li>
        </ul></div>"#;
    let index = parse_series_page(html, "page", "https://h/play/", "s").unwrap();
    let numbers: Vec<u32> = index.episodes.iter().map(|e| e.number).collect();
    assert_eq!(numbers, vec![7, 2]);
}

#[test]
fn test_parse_series_page_fractional_number_can_repeat_a_real_one() {
    let html = series_html("T", &[("1", "a"), ("1.5", "b"), ("2", "c")]);
    let index = parse_series_page(&html, "page", "https://h/play/", "s").unwrap();
    let numbers: Vec<u32> = index.episodes.iter().map(|e| e.number).collect();
    // "1.5" has no integer number; its link text doesn't parse either, so it
    // takes its position and collides with episode 2.
    assert_eq!(numbers, vec![1, 2, 2]);
    assert_ne!(index.episodes[1].page_url, index.episodes[2].page_url);
}

#[test]
fn test_parse_series_page_without_title() {
    let html = r#"<div class="server active"><li class="episode"><a data-id="a">1</a></li></div>"#;
    assert!(matches!(
        parse_series_page(html, "page", "https://h/play/", "s"),
        Err(DiscoveryError::MissingTitle(_))
    ));
}

#[test]
fn test_parse_series_page_without_episodes() {
    let html = series_html("Empty", &[]);
    assert!(matches!(
        parse_series_page(&html, "page", "https://h/play/", "s"),
        Err(DiscoveryError::NoEpisodes(_))
    ));
}

#[test]
fn test_parse_episode_page_absolute_and_relative_links() {
    let abs = episode_html("https://cdn.example/dl/Show_Ep_01.mp4");
    assert_eq!(
        parse_episode_page(&abs, "https://h/play/s/a").unwrap(),
        "https://cdn.example/dl/Show_Ep_01.mp4"
    );

    let rel = episode_html("/dl/Show_Ep_02.mp4");
    assert_eq!(
        parse_episode_page(&rel, "https://h/play/s/b").unwrap(),
        "https://h/dl/Show_Ep_02.mp4"
    );
}

#[test]
fn test_parse_episode_page_without_link() {
    assert!(matches!(
        parse_episode_page("<html></html>", "https://h/play/s/a"),
        Err(DiscoveryError::MissingDownloadLink(_))
    ));
}

// ---------------------------------------------------------------
// AnimeWorldSource against a mock site
// ---------------------------------------------------------------

async fn mount_site(server: &MockServer, episodes: u32) {
    let ids: Vec<(String, String)> = (1..=episodes)
        .map(|n| (n.to_string(), format!("id{}", n)))
        .collect();
    let refs: Vec<(&str, &str)> = ids.iter().map(|(n, id)| (n.as_str(), id.as_str())).collect();

    Mock::given(method("GET"))
        .and(path("/play/show.abc/id1"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(series_html("Mock Show", &refs)),
        )
        .mount(server)
        .await;

    for n in 2..=episodes {
        Mock::given(method("GET"))
            .and(path(format!("/play/show.abc/id{}", n)))
            .respond_with(ResponseTemplate::new(200).set_body_string(episode_html(&format!(
                "{}/dl/MockShow_Ep_{:02}.mp4",
                server.uri(),
                n
            ))))
            .mount(server)
            .await;
    }

    for n in 1..=episodes {
        Mock::given(method("GET"))
            .and(path(format!("/dl/MockShow_Ep_{:02}.mp4", n)))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(generate_test_data(4096 + n as usize)))
            .mount(server)
            .await;
    }
}

#[tokio::test]
async fn test_list_and_resolve_against_mock_site() {
    let server = MockServer::start().await;
    mount_site(&server, 3).await;

    let source = AnimeWorldSource::new(Client::new());
    let index = source
        .list(&format!("{}/play/show.abc/id1", server.uri()))
        .await
        .unwrap();

    assert_eq!(index.title, "Mock Show");
    assert_eq!(index.episodes.len(), 3);
    assert_eq!(index.episodes[1].page_url, format!("{}/play/show.abc/id2", server.uri()));

    let link = source.resolve(&index.episodes[2]).await.unwrap();
    assert_eq!(link, format!("{}/dl/MockShow_Ep_03.mp4", server.uri()));
}

#[tokio::test]
async fn test_series_page_http_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let source = AnimeWorldSource::new(Client::new());
    let err = source
        .list(&format!("{}/play/show.abc/id1", server.uri()))
        .await
        .unwrap_err();
    assert!(matches!(err, DiscoveryError::Status { status: 503, .. }));
}

#[tokio::test]
async fn test_end_to_end_batch_against_mock_site() {
    let server = MockServer::start().await;
    // The series page doubles as episode 1's page and has no download
    // link, so the range starts at 2.
    mount_site(&server, 4).await;

    let dir = tempfile::tempdir().unwrap();
    let config = DownloadConfig::builder()
        .with_download_dir(dir.path())
        .with_concurrency(2)
        .build()
        .unwrap();
    let client = Client::new();
    let coordinator = BatchCoordinator::new(
        Arc::new(AnimeWorldSource::new(client.clone())),
        Arc::new(HttpFetchUnit::from_config(client, &config)),
        Arc::new(NoopSink),
        &config,
    );

    let series_url = format!("{}/play/show.abc/id1", server.uri());
    let report = coordinator
        .run_batch(&[series_url], EpisodeRange::new(Some(2), None).unwrap())
        .await;

    assert_eq!(report.attempted, 3);
    assert_eq!(report.succeeded, 3, "failures: {:?}", report.failures);
    for n in 2..=4u32 {
        let file = dir.path().join("Mock Show").join(format!("MockShow_Ep_{:02}.mp4", n));
        assert_eq!(std::fs::read(&file).unwrap(), generate_test_data(4096 + n as usize));
    }
}
