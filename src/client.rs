//! The scraper client and its public operations
//!
//! Every operation is a short pipeline: build the canonical URL, fetch the page
//! (direct first, rendered on demand), decode the embedded payload, map it.

use crate::downloader::{DownloadEngine, DownloadJob, DownloadOptions, DownloadReport};
use crate::extractor::endpoints::{video_ref_from_url, Endpoints, FeedKind};
use crate::extractor::mapper::{self, id_field};
use crate::extractor::models::{Feed, Music, SkippedItem, TikTokResult, User, Video};
use crate::extractor::payload::{extract_payload, Payload};
use crate::extractor::{DirectSource, HybridFetcher, PageSource};
use crate::utils::config::ScraperConfig;
use crate::utils::cookies::SessionCookies;
use crate::utils::error::{Result, ScrapeError};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Turn a "does not exist" error into an absent result, keep real faults
fn absent_if_missing<T>(result: Result<T>, what: &str) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(e) if e.is_missing() => {
            info!("{} not found: {}", what, e);
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// Stateful client holding the configuration and the read-only session cookies
pub struct TikTokScraper {
    config: ScraperConfig,
    endpoints: Endpoints,
    direct: Arc<DirectSource>,
    fetcher: HybridFetcher,
    engine: DownloadEngine,
}

impl TikTokScraper {
    /// Client with default settings and an optional Netscape cookie file
    pub async fn new(cookie_file: Option<&Path>) -> Result<Self> {
        Self::with_config(ScraperConfig {
            cookie_file: cookie_file.map(Path::to_path_buf),
            ..Default::default()
        })
        .await
    }

    /// Client from explicit settings; cookies are loaded once here
    pub async fn with_config(config: ScraperConfig) -> Result<Self> {
        let config = config.validated()?;
        let cookies = Arc::new(match &config.cookie_file {
            Some(path) => SessionCookies::load(path).await?,
            None => SessionCookies::empty(),
        });

        let endpoints = Endpoints::new(&config.base_url, &config.api_base_url)?
            .with_short_link_hosts(&config.short_link_hosts);
        let referer = format!("{}/", endpoints.origin());
        let direct = Arc::new(DirectSource::new(&config.user_agent, &referer, cookies.clone())?);
        let engine = DownloadEngine::new(direct.client().clone());

        #[cfg(feature = "headless")]
        let fallback: Option<Arc<dyn PageSource>> = config.browser_fallback.then(|| {
            Arc::new(crate::extractor::BrowserSource::new(&config.user_agent, cookies.clone()))
                as Arc<dyn PageSource>
        });
        #[cfg(not(feature = "headless"))]
        let fallback: Option<Arc<dyn PageSource>> = None;

        let fetcher = HybridFetcher::new(direct.clone(), fallback);

        Ok(Self {
            config,
            endpoints,
            direct,
            fetcher,
            engine,
        })
    }

    /// Replace the rendered-page fallback (another browser driver, or a fake in tests)
    pub fn with_renderer(mut self, renderer: Arc<dyn PageSource>) -> Self {
        self.fetcher = HybridFetcher::new(self.direct.clone(), Some(renderer));
        self
    }

    pub fn config(&self) -> &ScraperConfig {
        &self.config
    }

    // ============================================================
    // Public operations
    // ============================================================

    /// Scrape a video page.
    ///
    /// `None` when the video was removed or the id does not exist. With
    /// `no_watermark`, the download URL is swapped for the watermark-free one
    /// when the platform has it.
    pub async fn fetch_video(
        &self,
        url: &str,
        no_watermark: bool,
    ) -> Result<Option<TikTokResult>> {
        info!("Fetching video {}", url);
        let Some((page_url, video_id)) = self.resolve_video(url).await? else {
            return Ok(None);
        };
        let payload = self.load_payload(&page_url).await?;

        let mapped = mapper::video_node(&payload, &video_id)
            .and_then(|node| mapper::map_result(&node, self.endpoints.origin()));
        let Some(mut result) = absent_if_missing(mapped, &format!("video {video_id}"))? else {
            return Ok(None);
        };

        if no_watermark {
            if let Some(clean) = self.lookup_no_watermark(&result.video.id).await? {
                result.video.download_url = clean;
            }
        }
        Ok(Some(result))
    }

    /// Scrape a user profile; `None` when the name does not resolve
    pub async fn fetch_user(&self, username: &str) -> Result<Option<User>> {
        info!("Fetching user {}", username);
        let payload = self.load_payload(&self.endpoints.user_page(username)?).await?;
        let name = username.trim().trim_start_matches('@');

        let mapped = mapper::user_node(&payload, name)
            .and_then(|(user, stats)| mapper::map_user(user, stats));
        absent_if_missing(mapped, &format!("user {name}"))
    }

    /// Every video of a user, most recent first
    pub async fn fetch_all_videos_from_user(
        &self,
        username: &str,
        no_watermark: bool,
    ) -> Result<Vec<Video>> {
        let mut feed = self.user_feed(username).await?;
        if no_watermark {
            self.swap_in_no_watermark(&mut feed.videos).await;
        }
        Ok(feed.videos)
    }

    /// The music track of a video page
    pub async fn fetch_music(&self, url: &str) -> Result<Option<Music>> {
        info!("Fetching music of {}", url);
        let Some((page_url, video_id)) = self.resolve_video(url).await? else {
            return Ok(None);
        };
        let payload = self.load_payload(&page_url).await?;

        let mapped = mapper::video_node(&payload, &video_id).and_then(|node| {
            node.item
                .get("music")
                .filter(|m| m.is_object())
                .ok_or_else(|| ScrapeError::Mapping(format!("video {video_id} has no music")))
                .and_then(mapper::map_music)
        });
        absent_if_missing(mapped, &format!("music of video {video_id}"))
    }

    /// Direct watermark-free media URL of a video, `None` when there is none
    pub async fn fetch_video_no_watermark(&self, url: &str) -> Result<Option<String>> {
        let Some((_, video_id)) = self.resolve_video(url).await? else {
            return Ok(None);
        };
        self.lookup_no_watermark(&video_id).await
    }

    /// Videos posted under a hashtag, in feed order
    pub async fn fetch_hashtag(&self, tag: &str) -> Result<Vec<Video>> {
        info!("Fetching hashtag {}", tag);
        let payload = self.load_payload(&self.endpoints.tag_page(tag)?).await?;

        let found = mapper::challenge_id(&payload, tag);
        let Some(challenge_id) = absent_if_missing(found, &format!("hashtag {tag}"))? else {
            return Ok(Vec::new());
        };

        let feed = self.collect_feed(&FeedKind::Hashtag { challenge_id }).await?;
        Ok(feed.videos)
    }

    /// Download every video of a user into `<path>/<username>/<id>.mp4`.
    ///
    /// Items that cannot be mapped or downloaded are skipped and listed in the report.
    pub async fn download_all_videos_from_user(
        &self,
        username: &str,
        options: &DownloadOptions,
    ) -> Result<DownloadReport> {
        let name = username.trim().trim_start_matches('@');
        let directory = options
            .path
            .clone()
            .unwrap_or_else(|| self.config.download_dir.clone())
            .join(name);

        let mut feed = self.user_feed(name).await?;
        if !options.watermark {
            self.swap_in_no_watermark(&mut feed.videos).await;
        }

        info!("Downloading {} videos of {} to {:?}", feed.videos.len(), name, directory);
        let jobs = feed
            .videos
            .into_iter()
            .map(|video| DownloadJob {
                id: video.id,
                url: video.download_url,
            })
            .collect();

        let mut report = self.engine.download_batch(jobs, &directory).await?;

        // Items dropped while paginating count as skipped too
        report.skipped.extend(feed.skipped);
        info!(
            "Downloaded {} of {} videos of {}",
            report.saved.len(),
            report.attempted(),
            name
        );
        Ok(report)
    }

    // ============================================================
    // Pipeline steps
    // ============================================================

    async fn load_payload(&self, url: &str) -> Result<Payload> {
        let html = self.fetcher.fetch(url, self.config.browser_fallback).await?;
        extract_payload(&html)
    }

    /// Canonical page URL and numeric id of a video link, short link or bare id.
    ///
    /// `None` when the input names no video. The page is always built on the
    /// configured origin, whatever host the link pointed at.
    async fn resolve_video(&self, input: &str) -> Result<Option<(String, String)>> {
        let input = input.trim();
        if input.is_empty() {
            return Err(ScrapeError::InvalidUrl("empty video reference".to_string()));
        }

        let resolved = if self.endpoints.is_short_link(input) {
            self.direct.resolve_redirects(input).await?
        } else {
            input.to_string()
        };

        let Some(video) = video_ref_from_url(&resolved) else {
            info!("No video id in {}", resolved);
            return Ok(None);
        };
        Ok(Some((self.endpoints.video_page(&video)?, video.id)))
    }

    async fn lookup_no_watermark(&self, video_id: &str) -> Result<Option<String>> {
        let lookup = self
            .direct
            .get_json(&self.endpoints.no_watermark_lookup(video_id)?)
            .await;
        let Some(response) = absent_if_missing(lookup, &format!("lookup of {video_id}"))? else {
            return Ok(None);
        };

        let found = mapper::no_watermark_url(&response, video_id);
        if found.is_none() {
            debug!("No watermark-free variant for {}", video_id);
        }
        Ok(found)
    }

    /// Best effort inside a batch: a failed lookup keeps the watermarked URL
    async fn swap_in_no_watermark(&self, videos: &mut [Video]) {
        for video in videos.iter_mut() {
            match self.lookup_no_watermark(&video.id).await {
                Ok(Some(clean)) => video.download_url = clean,
                Ok(None) => {}
                Err(e) => warn!("Keeping watermarked URL for {}: {}", video.id, e),
            }
        }
    }

    /// The user's feed, empty when the user does not exist
    async fn user_feed(&self, username: &str) -> Result<Feed> {
        let Some(user) = self.fetch_user(username).await? else {
            return Ok(Feed::default());
        };
        if user.secret_uid.is_empty() {
            warn!("User {} has no secUid, cannot list videos", user.unique_id);
            return Ok(Feed::default());
        }

        self.collect_feed(&FeedKind::User {
            sec_uid: user.secret_uid,
        })
        .await
    }

    /// Walk a feed until the site reports no further pages.
    ///
    /// Items keep the site's order; a repeated id or an unmappable item is dropped.
    async fn collect_feed(&self, kind: &FeedKind) -> Result<Feed> {
        let mut feed = Feed::default();
        let mut seen = HashSet::new();
        let mut cursor = "0".to_string();
        let mut pages = 0usize;

        loop {
            let url = self.endpoints.feed_page(kind, &cursor, self.config.page_size)?;
            let page = mapper::feed_page(&self.direct.get_json(&url).await?);
            pages += 1;

            for item in &page.items {
                match mapper::map_video(item, self.endpoints.origin()) {
                    Ok(video) => {
                        if seen.insert(video.id.clone()) {
                            feed.videos.push(video);
                        } else {
                            debug!("Dropping repeated video {}", video.id);
                        }
                    }
                    Err(e) => {
                        warn!("Skipping feed item: {}", e);
                        feed.skipped.push(SkippedItem {
                            id: id_field(item, "id"),
                            reason: e.to_string(),
                        });
                    }
                }
            }

            if !page.has_more {
                break;
            }
            if page.cursor.is_empty() || page.cursor == cursor {
                warn!("Feed cursor did not advance past {}, stopping", cursor);
                break;
            }
            cursor = page.cursor;
        }

        info!(
            "Collected {} videos over {} pages ({} skipped)",
            feed.videos.len(),
            pages,
            feed.skipped.len()
        );
        Ok(feed)
    }
}
