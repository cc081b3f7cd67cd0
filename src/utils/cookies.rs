//! Read-only session cookies loaded from a Netscape cookie export

use crate::utils::error::{Result, ScrapeError};
use chrono::Utc;
use reqwest::cookie::CookieStore;
use reqwest::header::HeaderValue;
use std::path::Path;
use tracing::{debug, info};
use url::Url;

/// Prefix browsers put in front of HttpOnly entries in the export format
const HTTP_ONLY_PREFIX: &str = "#HttpOnly_";

/// A single cookie from the export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie {
    pub domain: String,
    pub include_subdomains: bool,
    pub path: String,
    pub secure: bool,
    /// Expiry as unix seconds, 0 for session cookies
    pub expires: i64,
    pub name: String,
    pub value: String,
}

impl Cookie {
    /// Session cookies (expiry 0) never expire here
    pub fn is_expired(&self, now: i64) -> bool {
        self.expires > 0 && self.expires <= now
    }

    /// Whether a browser would send this cookie with a request to `url`
    pub fn matches(&self, url: &Url, now: i64) -> bool {
        if self.is_expired(now) || (self.secure && url.scheme() != "https") {
            return false;
        }

        let Some(host) = url.host_str().map(str::to_ascii_lowercase) else {
            return false;
        };
        let domain = self.domain.trim_start_matches('.').to_ascii_lowercase();
        let domain_ok = host == domain
            || (self.include_subdomains && host.ends_with(&format!(".{domain}")));

        domain_ok && path_matches(&self.path, url.path())
    }
}

fn path_matches(cookie_path: &str, request_path: &str) -> bool {
    if cookie_path.is_empty() || cookie_path == "/" || cookie_path == request_path {
        return true;
    }
    request_path.starts_with(cookie_path)
        && (cookie_path.ends_with('/') || request_path[cookie_path.len()..].starts_with('/'))
}

/// Immutable cookie set shared by every request of a scraper instance
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionCookies {
    cookies: Vec<Cookie>,
}

impl SessionCookies {
    /// Empty session, no Cookie header is sent
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load and parse a cookie export from disk
    pub async fn load(path: &Path) -> Result<Self> {
        let text = tokio::fs::read_to_string(path).await?;
        let session = Self::parse(&text)?;
        info!(
            "Loaded {} cookies from {}",
            session.cookies.len(),
            path.display()
        );
        Ok(session)
    }

    /// Parse the tab-separated export format.
    ///
    /// Blank lines and `#` comments are skipped; `#HttpOnly_` lines are entries.
    pub fn parse(text: &str) -> Result<Self> {
        let mut cookies = Vec::new();

        for (index, raw) in text.lines().enumerate() {
            let mut line = raw.trim_end_matches('\r');
            if let Some(rest) = line.strip_prefix(HTTP_ONLY_PREFIX) {
                line = rest;
            } else if line.trim().is_empty() || line.starts_with('#') {
                continue;
            }

            let fields: Vec<&str> = line.split('\t').collect();
            if fields.len() < 7 {
                return Err(ScrapeError::Cookies(format!(
                    "line {}: expected 7 tab-separated fields, found {}",
                    index + 1,
                    fields.len()
                )));
            }

            let expires = fields[4].trim().parse::<i64>().map_err(|_| {
                ScrapeError::Cookies(format!("line {}: bad expiry {:?}", index + 1, fields[4]))
            })?;

            cookies.push(Cookie {
                domain: fields[0].to_string(),
                include_subdomains: fields[1].eq_ignore_ascii_case("TRUE"),
                path: fields[2].to_string(),
                secure: fields[3].eq_ignore_ascii_case("TRUE"),
                expires,
                name: fields[5].to_string(),
                // Values may legitimately contain tabs
                value: fields[6..].join("\t"),
            });
        }

        debug!("Parsed {} cookie entries", cookies.len());
        Ok(Self { cookies })
    }

    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Cookie> {
        self.cookies.iter()
    }

    /// `name=value; ...` for a request to `url`, `None` when nothing applies
    pub fn header_for(&self, url: &Url, now: i64) -> Option<String> {
        let pairs: Vec<String> = self
            .cookies
            .iter()
            .filter(|c| c.matches(url, now))
            .map(|c| format!("{}={}", c.name, c.value))
            .collect();
        (!pairs.is_empty()).then(|| pairs.join("; "))
    }
}

/// Read-only store: cookies set by responses are ignored
impl CookieStore for SessionCookies {
    fn set_cookies(&self, _cookie_headers: &mut dyn Iterator<Item = &HeaderValue>, _url: &Url) {}

    fn cookies(&self, url: &Url) -> Option<HeaderValue> {
        let header = self.header_for(url, Utc::now().timestamp())?;
        HeaderValue::from_str(&header).ok()
    }
}
