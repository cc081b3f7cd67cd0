//! Mapping embedded JSON subtrees into typed records
//!
//! The payload shape is an unversioned detail of the platform, so every field read
//! goes through one of the typed accessors below and defaults instead of failing.
//! Only a missing identity (or the subtree holding the entity) is an error.

use crate::extractor::endpoints::is_video_id;
use crate::extractor::models::{Author, FeedPage, Music, TikTokResult, User, Video};
use crate::extractor::payload::{Payload, PayloadLayout};
use crate::utils::error::{Result, ScrapeError};
use chrono::DateTime;
use serde_json::Value;

// ============================================================
// Typed accessors
// ============================================================

/// Non-empty string at `key`
pub fn str_field<'a>(node: &'a Value, key: &str) -> Option<&'a str> {
    node.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

/// String at `key`, empty when absent
pub fn string_or_empty(node: &Value, key: &str) -> String {
    str_field(node, key).unwrap_or_default().to_string()
}

/// Owned non-empty string at `key`
pub fn opt_string(node: &Value, key: &str) -> Option<String> {
    str_field(node, key).map(str::to_string)
}

/// Unsigned counter at `key`; numbers only, 0 otherwise
pub fn u64_field(node: &Value, key: &str) -> u64 {
    match node.get(key) {
        Some(Value::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite() && *f >= 0.0).map(|f| f as u64))
            .unwrap_or(0),
        _ => 0,
    }
}

/// Counter encoded as a decimal string (the `statsV2` block)
pub fn u64_from_str_field(node: &Value, key: &str) -> Option<u64> {
    str_field(node, key).and_then(|s| s.trim().parse().ok())
}

/// Dimension at `key`, 0 when absent or out of range
pub fn u32_field(node: &Value, key: &str) -> u32 {
    u32::try_from(u64_field(node, key)).unwrap_or(0)
}

/// Boolean at `key`
pub fn bool_field(node: &Value, key: &str) -> Option<bool> {
    node.get(key).and_then(Value::as_bool)
}

/// Identifier at `key`; the platform emits ids as strings or as integers
pub fn id_field(node: &Value, key: &str) -> Option<String> {
    match node.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Creation time at `key` as RFC 3339.
///
/// Epoch seconds arrive as numbers or numeric strings; other strings pass through.
pub fn timestamp_field(node: &Value, key: &str) -> String {
    let seconds = match node.get(key) {
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => match s.trim().parse::<i64>() {
            Ok(secs) => Some(secs),
            Err(_) => return s.clone(),
        },
        _ => None,
    };

    seconds
        .and_then(|secs| DateTime::from_timestamp(secs, 0))
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_default()
}

fn object<'a>(node: &'a Value, key: &str) -> Option<&'a Value> {
    node.get(key).filter(|v| v.is_object())
}

// ============================================================
// Entity mappers
// ============================================================

/// Engagement counters, preferring the numeric `stats` block
struct Counters {
    share: u64,
    likes: u64,
    comments: u64,
    plays: u64,
}

impl Counters {
    fn from_item(item: &Value) -> Self {
        if let Some(stats) = object(item, "stats") {
            return Self {
                share: u64_field(stats, "shareCount"),
                likes: u64_field(stats, "diggCount"),
                comments: u64_field(stats, "commentCount"),
                plays: u64_field(stats, "playCount"),
            };
        }

        let legacy = object(item, "statsV2").unwrap_or(&Value::Null);
        Self {
            share: u64_from_str_field(legacy, "shareCount").unwrap_or(0),
            likes: u64_from_str_field(legacy, "diggCount").unwrap_or(0),
            comments: u64_from_str_field(legacy, "commentCount").unwrap_or(0),
            plays: u64_from_str_field(legacy, "playCount").unwrap_or(0),
        }
    }
}

/// Unique id of a video's author; inline object or a bare name in the legacy layout
fn author_unique_id(item: &Value) -> Option<String> {
    let author = item.get("author")?;
    match author {
        Value::String(name) if !name.is_empty() => Some(name.clone()),
        Value::Object(_) => opt_string(author, "uniqueId"),
        _ => None,
    }
}

/// Canonical page link of a video
pub fn video_page_url(origin: &str, unique_id: &str, video_id: &str) -> String {
    format!("{origin}/@{unique_id}/video/{video_id}")
}

/// Map an `itemStruct` into a [`Video`]
///
/// `origin` is the web origin used to build the canonical page link.
pub fn map_video(item: &Value, origin: &str) -> Result<Video> {
    let id = id_field(item, "id").ok_or_else(|| ScrapeError::Mapping("video id".to_string()))?;
    // The id becomes a file name in bulk downloads
    if !is_video_id(&id) {
        return Err(ScrapeError::Mapping(format!("video id {id:?} is not numeric")));
    }

    let media = object(item, "video")
        .ok_or_else(|| ScrapeError::Mapping(format!("video {id} has no media block")))?;

    let download_url = str_field(media, "downloadAddr")
        .or_else(|| str_field(media, "playAddr"))
        .ok_or_else(|| ScrapeError::Mapping(format!("video {id} has no download address")))?
        .to_string();

    let counters = Counters::from_item(item);
    let author = author_unique_id(item);
    let direct_video_url = author
        .as_deref()
        .map(|name| video_page_url(origin, name, &id));

    Ok(Video {
        description: string_or_empty(item, "desc"),
        created_at: timestamp_field(item, "createTime"),
        height: u32_field(media, "height"),
        width: u32_field(media, "width"),
        duration: u64_field(media, "duration"),
        resolution: str_field(media, "ratio")
            .or_else(|| str_field(media, "definition"))
            .unwrap_or_default()
            .to_string(),
        share_count: counters.share,
        likes_count: counters.likes,
        comment_count: counters.comments,
        play_count: counters.plays,
        download_url,
        cover: opt_string(media, "cover").or_else(|| opt_string(media, "originCover")),
        dynamic_cover: opt_string(media, "dynamicCover"),
        play_url: opt_string(media, "playAddr"),
        format: opt_string(media, "format"),
        author,
        direct_video_url,
        id,
    })
}

/// Map a user object into the short [`Author`] form
pub fn map_author(user: &Value) -> Result<Author> {
    let id = id_field(user, "id").ok_or_else(|| ScrapeError::Mapping("author id".to_string()))?;
    let unique_id = str_field(user, "uniqueId")
        .ok_or_else(|| ScrapeError::Mapping(format!("author {id} has no uniqueId")))?
        .to_string();

    let user_created = Some(timestamp_field(user, "createTime")).filter(|s| !s.is_empty());

    Ok(Author {
        avatar: str_field(user, "avatarLarger")
            .or_else(|| str_field(user, "avatarMedium"))
            .or_else(|| str_field(user, "avatarThumb"))
            .unwrap_or_default()
            .to_string(),
        signature: opt_string(user, "signature"),
        user_created,
        verified: bool_field(user, "verified"),
        unique_id,
        id,
    })
}

/// Map a user object plus its stats object into a [`User`]
pub fn map_user(user: &Value, stats: &Value) -> Result<User> {
    let id = id_field(user, "id").ok_or_else(|| ScrapeError::Mapping("user id".to_string()))?;
    let unique_id = str_field(user, "uniqueId")
        .ok_or_else(|| ScrapeError::Mapping(format!("user {id} has no uniqueId")))?
        .to_string();

    let hearts = match u64_field(stats, "heartCount") {
        0 => u64_field(stats, "heart"),
        n => n,
    };

    let bio_link = object(user, "bioLink")
        .map(|link| string_or_empty(link, "link"))
        .unwrap_or_default();

    Ok(User {
        nickname: string_or_empty(user, "nickname"),
        avatar: str_field(user, "avatarLarger")
            .or_else(|| str_field(user, "avatarMedium"))
            .unwrap_or_default()
            .to_string(),
        signature: string_or_empty(user, "signature"),
        created_at: timestamp_field(user, "createTime"),
        verified: bool_field(user, "verified").unwrap_or(false),
        secret_uid: string_or_empty(user, "secUid"),
        bio_link,
        private_account: bool_field(user, "privateAccount").unwrap_or(false),
        followers: u64_field(stats, "followerCount"),
        following: u64_field(stats, "followingCount"),
        hearts,
        videos: u64_field(stats, "videoCount"),
        unique_id,
        id,
    })
}

/// Map a `music` object into [`Music`]
pub fn map_music(music: &Value) -> Result<Music> {
    let id = id_field(music, "id").ok_or_else(|| ScrapeError::Mapping("music id".to_string()))?;

    Ok(Music {
        title: string_or_empty(music, "title"),
        play_url: string_or_empty(music, "playUrl"),
        cover_large: string_or_empty(music, "coverLarge"),
        cover_thumb: string_or_empty(music, "coverThumb"),
        author: string_or_empty(music, "authorName"),
        duration: u64_field(music, "duration"),
        original: bool_field(music, "original"),
        album: opt_string(music, "album"),
        id,
    })
}

/// Compose the aggregate for a video page.
///
/// The counters are taken once from the mapped video so both levels agree.
pub fn map_result(node: &VideoNode<'_>, origin: &str) -> Result<TikTokResult> {
    let video = map_video(node.item, origin)?;
    let author_node = node
        .author
        .ok_or_else(|| ScrapeError::Mapping(format!("video {} has no author", video.id)))?;
    let author = map_author(author_node)?;
    let audio = object(node.item, "music")
        .ok_or_else(|| ScrapeError::Mapping(format!("video {} has no music", video.id)))
        .and_then(map_music)?;

    Ok(TikTokResult {
        share_count: video.share_count,
        likes_count: video.likes_count,
        comment_count: video.comment_count,
        play_count: video.play_count,
        created_at: video.created_at.clone(),
        tiktok_link: video_page_url(origin, &author.unique_id, &video.id),
        thumbnail: video.cover.clone().unwrap_or_default(),
        author,
        audio,
        video,
    })
}

// ============================================================
// Payload navigation
// ============================================================

/// A video subtree and the author object that belongs to it
#[derive(Debug, Clone, Copy)]
pub struct VideoNode<'a> {
    pub item: &'a Value,
    pub author: Option<&'a Value>,
}

/// Detail scope of the current layout, `NotFound` when the page reports an error status
fn detail_scope<'a>(payload: &'a Payload, scope: &str, what: &str) -> Result<&'a Value> {
    let node = payload
        .data
        .get("__DEFAULT_SCOPE__")
        .and_then(|s| s.get(scope))
        .ok_or_else(|| ScrapeError::NotFound(format!("{what}: no {scope} scope")))?;

    match node.get("statusCode").and_then(Value::as_i64) {
        None | Some(0) => Ok(node),
        Some(code) => Err(ScrapeError::NotFound(format!("{what}: status {code}"))),
    }
}

/// Locate the video subtree on a video page
pub fn video_node<'a>(payload: &'a Payload, video_id: &str) -> Result<VideoNode<'a>> {
    match payload.layout {
        PayloadLayout::Universal => {
            let scope = detail_scope(payload, "webapp.video-detail", video_id)?;
            let item = scope
                .get("itemInfo")
                .and_then(|i| object(i, "itemStruct"))
                .ok_or_else(|| ScrapeError::Mapping(format!("video {video_id}: no itemStruct")))?;
            Ok(VideoNode {
                item,
                author: object(item, "author"),
            })
        }
        PayloadLayout::Sigi => {
            let items = object(&payload.data, "ItemModule")
                .ok_or_else(|| ScrapeError::NotFound(format!("video {video_id}: no ItemModule")))?;
            let item = items
                .get(video_id)
                .filter(|v| v.is_object())
                .ok_or_else(|| ScrapeError::NotFound(format!("video {video_id}")))?;
            let author = author_unique_id(item).and_then(|name| {
                payload
                    .data
                    .get("UserModule")
                    .and_then(|m| m.get("users"))
                    .and_then(|users| object(users, &name))
            });
            Ok(VideoNode { item, author })
        }
    }
}

/// Locate the user object and its stats on a user page
pub fn user_node<'a>(payload: &'a Payload, username: &str) -> Result<(&'a Value, &'a Value)> {
    match payload.layout {
        PayloadLayout::Universal => {
            let scope = detail_scope(payload, "webapp.user-detail", username)?;
            let info = object(scope, "userInfo")
                .ok_or_else(|| ScrapeError::NotFound(format!("user {username}")))?;
            let user = object(info, "user")
                .ok_or_else(|| ScrapeError::Mapping(format!("user {username}: no user object")))?;
            Ok((user, object(info, "stats").unwrap_or(&Value::Null)))
        }
        PayloadLayout::Sigi => {
            let module = object(&payload.data, "UserModule")
                .ok_or_else(|| ScrapeError::NotFound(format!("user {username}: no UserModule")))?;
            let user = module
                .get("users")
                .and_then(|users| object(users, username))
                .ok_or_else(|| ScrapeError::NotFound(format!("user {username}")))?;
            let stats = module
                .get("stats")
                .and_then(|stats| object(stats, username))
                .unwrap_or(&Value::Null);
            Ok((user, stats))
        }
    }
}

/// Challenge id of a hashtag page
pub fn challenge_id(payload: &Payload, tag: &str) -> Result<String> {
    let info = match payload.layout {
        PayloadLayout::Universal => {
            let scope = detail_scope(payload, "webapp.challenge-detail", tag)?;
            object(scope, "challengeInfo")
        }
        PayloadLayout::Sigi => payload
            .data
            .get("ChallengePage")
            .and_then(|page| object(page, "challengeInfo")),
    };

    info.and_then(|i| object(i, "challenge"))
        .and_then(|challenge| id_field(challenge, "id"))
        .ok_or_else(|| ScrapeError::NotFound(format!("hashtag {tag}")))
}

/// One page of a feed API response (`itemList`, `cursor`, `hasMore`)
pub fn feed_page(response: &Value) -> FeedPage {
    let items = response
        .get("itemList")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    let has_more = match response.get("hasMore") {
        Some(Value::Bool(more)) => *more,
        Some(Value::Number(n)) => n.as_u64().unwrap_or(0) != 0,
        _ => false,
    };

    FeedPage {
        items,
        cursor: id_field(response, "cursor").unwrap_or_default(),
        has_more,
    }
}

/// Watermark-free play address from a mobile feed lookup.
///
/// The endpoint answers with the closest video when the id is unknown, so the
/// first entry only counts when it carries the requested id.
pub fn no_watermark_url(response: &Value, video_id: &str) -> Option<String> {
    let entry = response.get("aweme_list")?.as_array()?.first()?;
    if id_field(entry, "aweme_id").as_deref() != Some(video_id) {
        return None;
    }

    entry
        .get("video")?
        .get("play_addr")?
        .get("url_list")?
        .as_array()?
        .iter()
        .find_map(|u| u.as_str().filter(|s| !s.is_empty()))
        .map(str::to_string)
}
