//! ttscraper library
//!
//! Scrapes public video, user and hashtag pages of the platform by decoding the
//! JSON document embedded in its server-rendered HTML.

pub mod api;
pub mod client;
pub mod downloader;
pub mod extractor;
pub mod utils;

// Re-export main types for easier use
pub use api::{
    download_all_videos_from_user, fetch_all_videos_from_user, fetch_hashtag, fetch_music,
    fetch_user, fetch_video, fetch_video_no_watermark,
};
pub use client::TikTokScraper;
pub use downloader::{DownloadOptions, DownloadReport};
pub use extractor::{Author, Music, PageSource, SkippedItem, TikTokResult, User, Video};
pub use utils::{ScrapeError, ScraperConfig, SessionCookies};
