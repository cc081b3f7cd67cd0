//! Public operations against a mock platform, no real network access.

mod common;

use async_trait::async_trait;
use common::*;
use httpmock::prelude::*;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use ttscraper::utils::FetchStage;
use ttscraper::{PageSource, ScrapeError, ScraperConfig, TikTokScraper};

/// Renderer standing in for the headless browser
struct FakeRenderer {
    body: String,
    calls: AtomicUsize,
}

#[async_trait]
impl PageSource for FakeRenderer {
    fn id(&self) -> &'static str {
        "fake-renderer"
    }

    async fn fetch_page(&self, _url: &str) -> anyhow::Result<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.body.clone())
    }
}

#[tokio::test]
async fn fetch_video_maps_aggregate() {
    let server = MockServer::start_async().await;
    let media = server.base_url();
    server
        .mock_async(|when, then| {
            when.method(GET).path("/@someone/video/111");
            then.status(200).body(video_page("111", &media));
        })
        .await;

    let scraper = scraper(&server).await;
    let result = scraper
        .fetch_video(&server.url("/@someone/video/111"), false)
        .await
        .expect("fetch")
        .expect("video exists");

    assert_eq!(result.video.id, "111");
    assert!(url::Url::parse(&result.video.download_url).is_ok());
    assert_eq!(result.video.download_url, format!("{media}/media/111.mp4"));
    assert_eq!(result.author.unique_id, "someone");
    assert_eq!(result.audio.title, "original sound - someone");
    assert_eq!(result.likes_count, 120);
    assert_eq!(result.likes_count, result.video.likes_count);
    assert_eq!(result.tiktok_link, format!("{media}/@someone/video/111"));
    assert_eq!(result.thumbnail, format!("{media}/cover/111.jpg"));
}

#[tokio::test]
async fn fetch_video_removed_is_absent() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/@someone/video/999");
            then.status(200).body(removed_video_page());
        })
        .await;

    let scraper = scraper(&server).await;
    let result = scraper
        .fetch_video(&server.url("/@someone/video/999"), false)
        .await
        .expect("removed video is not a fault");
    assert!(result.is_none());
}

#[tokio::test]
async fn fetch_video_with_no_watermark_swaps_url() {
    let server = MockServer::start_async().await;
    let media = server.base_url();
    server
        .mock_async(|when, then| {
            when.method(GET).path("/@someone/video/111");
            then.status(200).body(video_page("111", &media));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/aweme/v1/feed/")
                .query_param("aweme_id", "111");
            then.status(200).json_body(json!({ "aweme_list": [{
                "aweme_id": "111",
                "video": { "play_addr": { "url_list": ["https://cdn.example.com/clean/111.mp4"] } }
            }] }));
        })
        .await;

    let scraper = scraper(&server).await;
    let result = scraper
        .fetch_video(&server.url("/@someone/video/111"), true)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(result.video.download_url, "https://cdn.example.com/clean/111.mp4");
    assert_ne!(result.video.play_url.as_deref(), Some(result.video.download_url.as_str()));
}

#[tokio::test]
async fn no_watermark_lookup_of_unknown_video_is_absent() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/aweme/v1/feed/");
            // The endpoint answers with some other video for unknown ids
            then.status(200).json_body(json!({ "aweme_list": [{
                "aweme_id": "555",
                "video": { "play_addr": { "url_list": ["https://cdn.example.com/clean/555.mp4"] } }
            }] }));
        })
        .await;

    let scraper = scraper(&server).await;
    let url = scraper
        .fetch_video_no_watermark(&server.url("/@someone/video/404"))
        .await
        .unwrap();
    assert_eq!(url, None);
}

#[tokio::test]
async fn fetch_user_is_stable() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/@someone");
            then.status(200).body(user_page());
        })
        .await;

    let scraper = scraper(&server).await;
    let first = scraper.fetch_user("someone").await.unwrap().unwrap();
    let second = scraper.fetch_user("@someone").await.unwrap().unwrap();

    mock.assert_hits_async(2).await;
    assert_eq!(first, second);
    assert_eq!(first.unique_id, "someone");
    assert_eq!(first.secret_uid, SEC_UID);
    assert_eq!(first.followers, 1500);
    assert_eq!(first.hearts, 90000);
    assert_eq!(first.videos, 3);
}

#[tokio::test]
async fn fetch_user_unknown_is_absent() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/@nobody");
            then.status(200).body(missing_user_page());
        })
        .await;

    let scraper = scraper(&server).await;
    assert_eq!(scraper.fetch_user("nobody").await.unwrap(), None);
}

#[tokio::test]
async fn user_listing_follows_cursor_without_duplicates() {
    let server = MockServer::start_async().await;
    let media = server.base_url();
    server
        .mock_async(|when, then| {
            when.method(GET).path("/@someone");
            then.status(200).body(user_page());
        })
        .await;
    let first = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/api/post/item_list/")
                .query_param("secUid", SEC_UID)
                .query_param("cursor", "0");
            then.status(200).body(feed(
                vec![item("333", &media), item("222", &media)],
                "1699999999000",
                true,
            ));
        })
        .await;
    let second = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/api/post/item_list/")
                .query_param("cursor", "1699999999000");
            then.status(200).body(feed(
                vec![item("222", &media), item("111", &media)],
                "1699999998000",
                false,
            ));
        })
        .await;

    let scraper = scraper(&server).await;
    let videos = scraper
        .fetch_all_videos_from_user("someone", false)
        .await
        .unwrap();

    first.assert_async().await;
    second.assert_async().await;
    let ids: Vec<&str> = videos.iter().map(|v| v.id.as_str()).collect();
    assert_eq!(ids, vec!["333", "222", "111"]);
}

#[tokio::test]
async fn listing_stops_when_cursor_repeats() {
    let server = MockServer::start_async().await;
    let media = server.base_url();
    server
        .mock_async(|when, then| {
            when.method(GET).path("/@someone");
            then.status(200).body(user_page());
        })
        .await;
    let feed_mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/api/post/item_list/");
            then.status(200).body(feed(vec![item("111", &media)], "0", true));
        })
        .await;

    let scraper = scraper(&server).await;
    let videos = scraper
        .fetch_all_videos_from_user("someone", false)
        .await
        .unwrap();

    feed_mock.assert_hits_async(1).await;
    assert_eq!(videos.len(), 1);
}

#[tokio::test]
async fn fetch_music_from_video_page() {
    let server = MockServer::start_async().await;
    let media = server.base_url();
    server
        .mock_async(|when, then| {
            when.method(GET).path("/@someone/video/111");
            then.status(200).body(video_page("111", &media));
        })
        .await;

    let scraper = scraper(&server).await;
    let music = scraper
        .fetch_music(&server.url("/@someone/video/111"))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(music.id, "7000000000000000001");
    assert_eq!(music.author, "Someone");
    assert_eq!(music.original, Some(true));
    assert_eq!(music.album, None);
}

#[tokio::test]
async fn hashtag_feed_is_paginated() {
    let server = MockServer::start_async().await;
    let media = server.base_url();
    server
        .mock_async(|when, then| {
            when.method(GET).path("/tag/cats");
            then.status(200).body(page(&json!({ "__DEFAULT_SCOPE__": {
                "webapp.challenge-detail": {
                    "statusCode": 0,
                    "challengeInfo": { "challenge": { "id": "4242", "title": "cats" } }
                }
            } })));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/api/challenge/item_list/")
                .query_param("challengeID", "4242")
                .query_param("cursor", "0");
            then.status(200).body(feed(vec![item("9", &media)], "30", true));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/api/challenge/item_list/")
                .query_param("cursor", "30");
            then.status(200).body(feed(vec![item("8", &media)], "60", false));
        })
        .await;

    let scraper = scraper(&server).await;
    let videos = scraper.fetch_hashtag("#cats").await.unwrap();
    let ids: Vec<&str> = videos.iter().map(|v| v.id.as_str()).collect();
    assert_eq!(ids, vec!["9", "8"]);
}

#[tokio::test]
async fn missing_marker_invokes_renderer_once_then_fails() {
    let server = MockServer::start_async().await;
    let direct = server
        .mock_async(|when, then| {
            when.method(GET).path("/@someone");
            then.status(200).body(challenge_page());
        })
        .await;

    let renderer = Arc::new(FakeRenderer {
        body: challenge_page(),
        calls: AtomicUsize::new(0),
    });
    let scraper = TikTokScraper::with_config(config(&server, true))
        .await
        .unwrap()
        .with_renderer(renderer.clone());

    let err = scraper.fetch_user("someone").await.unwrap_err();

    direct.assert_hits_async(1).await;
    assert_eq!(renderer.calls.load(Ordering::SeqCst), 1);
    assert!(matches!(
        err,
        ScrapeError::Fetch {
            stage: FetchStage::Rendered,
            ..
        }
    ));
}

#[tokio::test]
async fn rendered_page_is_used_after_challenge() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/@someone");
            then.status(200).body(challenge_page());
        })
        .await;

    let renderer = Arc::new(FakeRenderer {
        body: user_page(),
        calls: AtomicUsize::new(0),
    });
    let scraper = TikTokScraper::with_config(config(&server, true))
        .await
        .unwrap()
        .with_renderer(renderer.clone());

    let user = scraper.fetch_user("someone").await.unwrap().unwrap();
    assert_eq!(user.unique_id, "someone");
    assert_eq!(renderer.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn malformed_payload_is_parse_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/@someone");
            then.status(200).body(
                r#"<html><script id="__UNIVERSAL_DATA_FOR_REHYDRATION__">{"broken": </script></html>"#,
            );
        })
        .await;

    let scraper = scraper(&server).await;
    assert!(matches!(
        scraper.fetch_user("someone").await,
        Err(ScrapeError::Parse(_))
    ));
}

#[tokio::test]
async fn reference_without_video_id_is_absent() {
    let server = MockServer::start_async().await;
    let scraper = scraper(&server).await;

    assert_eq!(scraper.fetch_video("not-a-video-id", false).await.unwrap(), None);
    assert_eq!(
        scraper.fetch_video(&server.url("/@someone"), false).await.unwrap(),
        None
    );
    assert_eq!(scraper.fetch_music("not-a-video-id").await.unwrap(), None);
    assert_eq!(
        scraper.fetch_video_no_watermark("not-a-video-id").await.unwrap(),
        None
    );
    assert!(matches!(
        scraper.fetch_video("   ", false).await,
        Err(ScrapeError::InvalidUrl(_))
    ));
}

#[tokio::test]
async fn no_watermark_lookup_not_found_is_absent() {
    let server = MockServer::start_async().await;
    let lookup = server
        .mock_async(|when, then| {
            when.method(GET).path("/aweme/v1/feed/");
            then.status(404);
        })
        .await;

    let scraper = scraper(&server).await;
    let url = scraper.fetch_video_no_watermark("7301234567890123456").await.unwrap();

    lookup.assert_async().await;
    assert_eq!(url, None);
}

#[tokio::test]
async fn video_page_is_fetched_from_configured_origin() {
    let server = MockServer::start_async().await;
    let media = server.base_url();
    let page = server
        .mock_async(|when, then| {
            when.method(GET).path("/@someone/video/111");
            then.status(200).body(video_page("111", &media));
        })
        .await;

    let scraper = scraper(&server).await;
    // The host of the link is never contacted
    let result = scraper
        .fetch_video("https://unreachable.invalid/@someone/video/111?lang=en", false)
        .await
        .unwrap()
        .unwrap();

    page.assert_async().await;
    assert_eq!(result.video.id, "111");
}

#[tokio::test]
async fn short_link_is_resolved_before_fetching() {
    let server = MockServer::start_async().await;
    let media = server.base_url();
    let landing = server.url("/@someone/video/111?is_from_webapp=1");
    let share = server
        .mock_async(|when, then| {
            when.method(GET).path("/ZMabc123/");
            then.status(301).header("location", landing.as_str());
        })
        .await;
    let page = server
        .mock_async(|when, then| {
            when.method(GET).path("/@someone/video/111");
            then.status(200).body(video_page("111", &media));
        })
        .await;

    let scraper = TikTokScraper::with_config(ScraperConfig {
        short_link_hosts: vec!["localhost".to_string()],
        ..config(&server, false)
    })
    .await
    .unwrap();

    let short = format!("http://localhost:{}/ZMabc123/", server.port());
    let music = scraper.fetch_music(&short).await.unwrap().unwrap();

    share.assert_async().await;
    // Once while following the redirect, once for the canonical page
    page.assert_hits_async(2).await;
    assert_eq!(music.id, "7000000000000000001");
}
