//! One-shot helpers; each builds a default [`TikTokScraper`] without cookies

use crate::client::TikTokScraper;
use crate::downloader::{DownloadOptions, DownloadReport};
use crate::extractor::models::{Music, TikTokResult, User, Video};
use crate::utils::error::Result;

/// Scrape a video page
pub async fn fetch_video(url: &str, no_watermark: bool) -> Result<Option<TikTokResult>> {
    TikTokScraper::new(None).await?.fetch_video(url, no_watermark).await
}

/// Scrape a user profile
pub async fn fetch_user(username: &str) -> Result<Option<User>> {
    TikTokScraper::new(None).await?.fetch_user(username).await
}

/// List every video of a user, most recent first
pub async fn fetch_all_videos_from_user(username: &str, no_watermark: bool) -> Result<Vec<Video>> {
    TikTokScraper::new(None)
        .await?
        .fetch_all_videos_from_user(username, no_watermark)
        .await
}

/// Music of a video page
pub async fn fetch_music(url: &str) -> Result<Option<Music>> {
    TikTokScraper::new(None).await?.fetch_music(url).await
}

/// Watermark-free media URL of a video
pub async fn fetch_video_no_watermark(url: &str) -> Result<Option<String>> {
    TikTokScraper::new(None).await?.fetch_video_no_watermark(url).await
}

/// Videos under a hashtag
pub async fn fetch_hashtag(tag: &str) -> Result<Vec<Video>> {
    TikTokScraper::new(None).await?.fetch_hashtag(tag).await
}

/// Download every video of a user
pub async fn download_all_videos_from_user(
    username: &str,
    options: &DownloadOptions,
) -> Result<DownloadReport> {
    TikTokScraper::new(None)
        .await?
        .download_all_videos_from_user(username, options)
        .await
}
