//! Locating the JSON document the platform embeds in its server-rendered pages

use crate::utils::error::{Result, ScrapeError};
use scraper::{Html, Selector};
use serde_json::Value;
use tracing::debug;

/// Which page generation produced the payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadLayout {
    /// `__UNIVERSAL_DATA_FOR_REHYDRATION__`, keyed under `__DEFAULT_SCOPE__`
    Universal,
    /// `SIGI_STATE`, keyed by module (`ItemModule`, `UserModule`, ...)
    Sigi,
}

impl PayloadLayout {
    /// Script element id carrying the payload
    pub fn script_id(self) -> &'static str {
        match self {
            PayloadLayout::Universal => "__UNIVERSAL_DATA_FOR_REHYDRATION__",
            PayloadLayout::Sigi => "SIGI_STATE",
        }
    }
}

/// Markers in priority order
pub const KNOWN_LAYOUTS: [PayloadLayout; 2] = [PayloadLayout::Universal, PayloadLayout::Sigi];

/// Decoded embedded payload
#[derive(Debug, Clone, PartialEq)]
pub struct Payload {
    pub layout: PayloadLayout,
    pub data: Value,
}

/// Quick marker test used to decide whether a page needs the browser fallback
pub fn contains_payload(html: &str) -> bool {
    KNOWN_LAYOUTS.iter().any(|layout| {
        let id = layout.script_id();
        html.contains(&format!("id=\"{id}\"")) || html.contains(&format!("id='{id}'"))
    })
}

/// Find the payload script and decode it
///
/// The script content is taken verbatim; no schema is checked here.
pub fn extract_payload(html: &str) -> Result<Payload> {
    let document = Html::parse_document(html);

    for layout in KNOWN_LAYOUTS {
        let selector = Selector::parse(&format!("script#{}", layout.script_id()))
            .map_err(|e| ScrapeError::Parse(format!("bad selector: {e}")))?;

        let Some(script) = document.select(&selector).next() else {
            continue;
        };

        let text: String = script.text().collect();
        if text.trim().is_empty() {
            return Err(ScrapeError::Parse(format!(
                "{} script is empty",
                layout.script_id()
            )));
        }

        let data: Value = serde_json::from_str(text.trim())?;
        debug!("Decoded {:?} payload ({} bytes)", layout, text.len());
        return Ok(Payload { layout, data });
    }

    Err(ScrapeError::Parse("no embedded payload script found".to_string()))
}
