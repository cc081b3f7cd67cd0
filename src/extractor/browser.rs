//! Headless-browser page source
//!
//! Renders a page in Chromium so client-side scripts run before the HTML is read.
//! One browser is launched per render and shut down before returning.

use crate::extractor::payload::KNOWN_LAYOUTS;
use crate::extractor::traits::PageSource;
use crate::utils::cookies::SessionCookies;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::CookieParam;
use chromiumoxide::Page;
use chrono::Utc;
use futures::StreamExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Polls for the payload script after navigation, 250ms apart
const PAYLOAD_POLLS: usize = 40;
const POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Aborts the CDP handler task on every exit path
struct HandlerTask(JoinHandle<()>);

impl Drop for HandlerTask {
    fn drop(&mut self) {
        self.0.abort();
    }
}

pub struct BrowserSource {
    user_agent: String,
    cookies: Arc<SessionCookies>,
}

impl BrowserSource {
    pub fn new(user_agent: &str, cookies: Arc<SessionCookies>) -> Self {
        Self {
            user_agent: user_agent.to_string(),
            cookies,
        }
    }

    fn cookie_params(&self) -> Result<Vec<CookieParam>> {
        let now = Utc::now().timestamp();
        self.cookies
            .iter()
            .filter(|c| !c.is_expired(now))
            .map(|c| {
                CookieParam::builder()
                    .name(c.name.clone())
                    .value(c.value.clone())
                    .domain(c.domain.clone())
                    .path(c.path.clone())
                    .secure(c.secure)
                    .build()
                    .map_err(|e| anyhow!("bad cookie {}: {e}", c.name))
            })
            .collect()
    }

    async fn render(&self, browser: &Browser, url: &str) -> Result<String> {
        let page = browser
            .new_page("about:blank")
            .await
            .context("Failed to create page")?;

        if !self.cookies.is_empty() {
            page.set_cookies(self.cookie_params()?)
                .await
                .context("Failed to inject cookies")?;
        }

        page.goto(url).await.context("Failed to navigate")?;
        if !wait_for_payload(&page).await {
            debug!("No payload script appeared on {}", url);
        }

        page.content().await.context("Failed to read page content")
    }
}

/// Wait until client-side scripts have inserted the payload script.
///
/// Returns false when it never shows up; the caller still reads the page.
async fn wait_for_payload(page: &Page) -> bool {
    for _ in 0..PAYLOAD_POLLS {
        for layout in KNOWN_LAYOUTS {
            let selector = format!("script#{}", layout.script_id());
            if page.find_element(selector).await.is_ok() {
                return true;
            }
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
    false
}

#[async_trait]
impl PageSource for BrowserSource {
    fn id(&self) -> &'static str {
        "headless-chromium"
    }

    async fn fetch_page(&self, url: &str) -> Result<String> {
        debug!("Launching headless browser for {}", url);

        let config = BrowserConfig::builder()
            .no_sandbox()
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--disable-dev-shm-usage")
            .arg(format!("--user-agent={}", self.user_agent))
            .build()
            .map_err(|e| anyhow!("Browser config error: {e}"))?;

        // Dropping `browser` (e.g. on cancellation) kills the child process
        let (mut browser, mut handler) = Browser::launch(config)
            .await
            .context("Failed to launch browser")?;
        let _handler = HandlerTask(tokio::spawn(async move {
            while handler.next().await.is_some() {}
        }));

        let rendered = self.render(&browser, url).await;

        if let Err(e) = browser.close().await {
            warn!("Failed to close browser cleanly: {}", e);
        }
        if let Err(e) = browser.wait().await {
            warn!("Failed to reap browser process: {}", e);
        }

        rendered
    }
}
