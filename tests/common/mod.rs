//! Canned platform pages and a scraper pointed at a local mock server

#![allow(dead_code)]

use httpmock::MockServer;
use serde_json::{json, Value};
use ttscraper::{ScraperConfig, TikTokScraper};

pub const SEC_UID: &str = "MS4wLjABAAAA-someone";

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

pub fn config(server: &MockServer, browser_fallback: bool) -> ScraperConfig {
    ScraperConfig {
        base_url: server.base_url(),
        api_base_url: server.base_url(),
        browser_fallback,
        ..Default::default()
    }
}

pub async fn scraper(server: &MockServer) -> TikTokScraper {
    init_tracing();
    TikTokScraper::with_config(config(server, false))
        .await
        .expect("scraper")
}

/// Wrap a payload the way the platform embeds it
pub fn page(data: &Value) -> String {
    format!(
        "<!DOCTYPE html><html><head><title>TikTok</title></head><body><div id=\"app\"></div>\
         <script id=\"__UNIVERSAL_DATA_FOR_REHYDRATION__\" type=\"application/json\">{data}</script>\
         </body></html>"
    )
}

pub fn challenge_page() -> String {
    "<html><body><div id=\"captcha\">Verify to continue</div></body></html>".to_string()
}

pub fn author() -> Value {
    json!({
        "id": "6800000000000000000",
        "uniqueId": "someone",
        "nickname": "Someone",
        "avatarLarger": "https://cdn.example.com/avatar.jpg",
        "signature": "just clips",
        "createTime": 1600000000,
        "verified": false,
        "secUid": SEC_UID,
        "privateAccount": false
    })
}

/// A feed item; `media_base` is where its download address points
pub fn item(id: &str, media_base: &str) -> Value {
    json!({
        "id": id,
        "desc": format!("clip {id}"),
        "createTime": 1700000000,
        "video": {
            "height": 1024,
            "width": 576,
            "duration": 12,
            "ratio": "720p",
            "cover": format!("{media_base}/cover/{id}.jpg"),
            "playAddr": format!("{media_base}/play/{id}.mp4"),
            "downloadAddr": format!("{media_base}/media/{id}.mp4"),
            "format": "mp4"
        },
        "author": author(),
        "music": {
            "id": "7000000000000000001",
            "title": "original sound - someone",
            "playUrl": format!("{media_base}/music/1.mp3"),
            "coverLarge": format!("{media_base}/music/large.jpg"),
            "coverThumb": format!("{media_base}/music/thumb.jpg"),
            "authorName": "Someone",
            "duration": 12,
            "original": true
        },
        "stats": { "diggCount": 120, "shareCount": 4, "commentCount": 9, "playCount": 5000 }
    })
}

pub fn video_page(id: &str, media_base: &str) -> String {
    page(&json!({ "__DEFAULT_SCOPE__": { "webapp.video-detail": {
        "statusCode": 0,
        "itemInfo": { "itemStruct": item(id, media_base) }
    } } }))
}

pub fn removed_video_page() -> String {
    page(&json!({ "__DEFAULT_SCOPE__": { "webapp.video-detail": {
        "statusCode": 10204,
        "statusMsg": "item doesn't exist"
    } } }))
}

pub fn user_page() -> String {
    page(&json!({ "__DEFAULT_SCOPE__": { "webapp.user-detail": {
        "statusCode": 0,
        "userInfo": {
            "user": author(),
            "stats": { "followerCount": 1500, "followingCount": 20, "heartCount": 90000, "videoCount": 3 }
        }
    } } }))
}

pub fn missing_user_page() -> String {
    page(&json!({ "__DEFAULT_SCOPE__": { "webapp.user-detail": { "statusCode": 10221 } } }))
}

pub fn feed(items: Vec<Value>, cursor: &str, has_more: bool) -> String {
    json!({ "itemList": items, "cursor": cursor, "hasMore": has_more, "statusCode": 0 }).to_string()
}
