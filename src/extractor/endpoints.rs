//! Canonical URLs for pages and JSON endpoints

use crate::utils::error::{Result, ScrapeError};
use url::Url;

/// App id the web client sends with feed requests
const WEB_AID: &str = "1988";

/// Which feed to paginate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedKind {
    /// Posts of a user, keyed by the user's secUid
    User { sec_uid: String },
    /// Posts under a hashtag, keyed by the challenge id
    Hashtag { challenge_id: String },
}

/// Hosts serving short share links by default
pub const DEFAULT_SHORT_LINK_HOSTS: [&str; 2] = ["vm.tiktok.com", "vt.tiktok.com"];

/// URL builder bound to the configured origins
#[derive(Debug, Clone)]
pub struct Endpoints {
    origin: Url,
    api: Url,
    short_link_hosts: Vec<String>,
}

/// A video reference read from a page URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoRef {
    /// Author handle when the URL carries one (`/@name/video/<id>`)
    pub unique_id: Option<String>,
    pub id: String,
}

impl Endpoints {
    pub fn new(base_url: &str, api_base_url: &str) -> Result<Self> {
        let parse =
            |s: &str| Url::parse(s).map_err(|e| ScrapeError::InvalidUrl(format!("{s}: {e}")));
        Ok(Self {
            origin: parse(base_url)?,
            api: parse(api_base_url)?,
            short_link_hosts: DEFAULT_SHORT_LINK_HOSTS.iter().map(|h| h.to_string()).collect(),
        })
    }

    /// Replace the hosts whose links are resolved by following redirects
    pub fn with_short_link_hosts(mut self, hosts: &[String]) -> Self {
        self.short_link_hosts = hosts.iter().map(|h| h.to_ascii_lowercase()).collect();
        self
    }

    /// Web origin without a trailing slash
    pub fn origin(&self) -> &str {
        self.origin.as_str().trim_end_matches('/')
    }

    fn with_path(base: &Url, segments: &[&str]) -> Result<Url> {
        let mut url = base.clone();
        url.path_segments_mut()
            .map_err(|_| ScrapeError::InvalidUrl(base.to_string()))?
            .clear()
            .extend(segments);
        Ok(url)
    }

    /// Profile page of a user; a leading `@` is accepted
    pub fn user_page(&self, username: &str) -> Result<String> {
        let name = username.trim().trim_start_matches('@');
        if name.is_empty() {
            return Err(ScrapeError::InvalidUrl("empty username".to_string()));
        }
        let segment = format!("@{name}");
        Ok(Self::with_path(&self.origin, &[segment.as_str()])?.into())
    }

    /// Tag page; a leading `#` is accepted
    pub fn tag_page(&self, tag: &str) -> Result<String> {
        let tag = tag.trim().trim_start_matches('#');
        if tag.is_empty() {
            return Err(ScrapeError::InvalidUrl("empty hashtag".to_string()));
        }
        Ok(Self::with_path(&self.origin, &["tag", tag])?.into())
    }

    /// Page of a video on the configured origin.
    ///
    /// Without a known author the platform redirects `/@/video/<id>` to the real page.
    pub fn video_page(&self, video: &VideoRef) -> Result<String> {
        let author = format!("@{}", video.unique_id.as_deref().unwrap_or_default());
        Ok(Self::with_path(&self.origin, &[author.as_str(), "video", video.id.as_str()])?.into())
    }

    /// Whether `url` is a share link that must be resolved first
    pub fn is_short_link(&self, url: &str) -> bool {
        Url::parse(url)
            .ok()
            .and_then(|u| u.host_str().map(str::to_ascii_lowercase))
            .is_some_and(|host| self.short_link_hosts.iter().any(|h| *h == host))
    }

    /// One page of a feed starting at `cursor`
    pub fn feed_page(&self, kind: &FeedKind, cursor: &str, count: usize) -> Result<String> {
        let (path, key, value) = match kind {
            FeedKind::User { sec_uid } => (["api", "post", "item_list", ""], "secUid", sec_uid),
            FeedKind::Hashtag { challenge_id } => {
                (["api", "challenge", "item_list", ""], "challengeID", challenge_id)
            }
        };

        let mut url = Self::with_path(&self.origin, &path)?;
        url.query_pairs_mut()
            .append_pair("aid", WEB_AID)
            .append_pair(key, value)
            .append_pair("count", &count.to_string())
            .append_pair("cursor", cursor);
        Ok(url.into())
    }

    /// Mobile feed lookup returning the watermark-free address of a video
    pub fn no_watermark_lookup(&self, video_id: &str) -> Result<String> {
        let mut url = Self::with_path(&self.api, &["aweme", "v1", "feed", ""])?;
        url.query_pairs_mut().append_pair("aweme_id", video_id);
        Ok(url.into())
    }
}

/// Video ids are decimal digits only
pub fn is_video_id(id: &str) -> bool {
    !id.is_empty() && id.bytes().all(|b| b.is_ascii_digit())
}

fn is_handle(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '_')
}

/// Video reference from a page URL (`.../@name/video/<id>`, `.../v/<id>.html`) or a bare id
pub fn video_ref_from_url(input: &str) -> Option<VideoRef> {
    let input = input.trim();
    if is_video_id(input) {
        return Some(VideoRef {
            unique_id: None,
            id: input.to_string(),
        });
    }

    let url = Url::parse(input).ok()?;
    let segments: Vec<&str> = url.path_segments()?.collect();
    let position = segments.iter().position(|s| *s == "video" || *s == "v")?;

    let id: String = segments
        .get(position + 1)?
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    if id.is_empty() {
        return None;
    }

    let unique_id = position
        .checked_sub(1)
        .and_then(|i| segments[i].strip_prefix('@'))
        .filter(|name| is_handle(name))
        .map(str::to_string);
    Some(VideoRef { unique_id, id })
}
