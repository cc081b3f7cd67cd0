//! Data structures for scraped videos, users and music

use serde::{Deserialize, Serialize};

/// A single video as published on the platform
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    pub id: String,
    pub description: String,
    pub created_at: String,
    pub height: u32,
    pub width: u32,
    /// Seconds
    pub duration: u64,
    pub resolution: String,
    pub share_count: u64,
    pub likes_count: u64,
    pub comment_count: u64,
    pub play_count: u64,
    /// Always a non-empty absolute URL
    #[serde(rename = "downloadURL")]
    pub download_url: String,
    #[serde(default)]
    pub cover: Option<String>,
    #[serde(default)]
    pub dynamic_cover: Option<String>,
    #[serde(default, rename = "playURL")]
    pub play_url: Option<String>,
    #[serde(default)]
    pub format: Option<String>,
    /// Unique id of the author
    #[serde(default)]
    pub author: Option<String>,
    /// Canonical page link of the video
    #[serde(default)]
    pub direct_video_url: Option<String>,
}

/// The author block embedded in a video
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    pub unique_id: String,
    pub id: String,
    pub avatar: String,
    #[serde(default)]
    pub signature: Option<String>,
    #[serde(default, rename = "user_created")]
    pub user_created: Option<String>,
    #[serde(default)]
    pub verified: Option<bool>,
}

/// Full profile of a user page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub unique_id: String,
    pub nickname: String,
    pub avatar: String,
    pub signature: String,
    pub created_at: String,
    pub verified: bool,
    #[serde(rename = "secretUID")]
    pub secret_uid: String,
    pub bio_link: String,
    pub private_account: bool,
    pub followers: u64,
    pub following: u64,
    pub hearts: u64,
    pub videos: u64,
}

/// Music track used by a video
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Music {
    pub id: String,
    pub title: String,
    #[serde(rename = "playURL")]
    pub play_url: String,
    pub cover_large: String,
    pub cover_thumb: String,
    pub author: String,
    pub duration: u64,
    #[serde(default)]
    pub original: Option<bool>,
    #[serde(default)]
    pub album: Option<String>,
}

/// Everything a video page tells about one video
///
/// The top-level counters always equal the ones on `video`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TikTokResult {
    pub author: Author,
    pub video: Video,
    pub audio: Music,
    pub share_count: u64,
    pub likes_count: u64,
    pub comment_count: u64,
    pub play_count: u64,
    pub created_at: String,
    pub tiktok_link: String,
    pub thumbnail: String,
}

/// One page of a cursor-paginated feed
#[derive(Debug, Clone, Default)]
pub struct FeedPage {
    /// Raw item subtrees, mapped by the caller so a bad item can be skipped
    pub items: Vec<serde_json::Value>,
    pub cursor: String,
    pub has_more: bool,
}

/// A whole feed after pagination
#[derive(Debug, Clone, Default)]
pub struct Feed {
    /// Most recent first, as the site orders them
    pub videos: Vec<Video>,
    /// Items that could not be mapped, with the reason
    pub skipped: Vec<SkippedItem>,
}

/// An item left out of a batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedItem {
    /// Video id when the item carried one
    pub id: Option<String>,
    pub reason: String,
}
