pub mod direct;
pub mod endpoints;
pub mod hybrid;
pub mod mapper;
pub mod models;
pub mod payload;
pub mod traits;

#[cfg(feature = "headless")]
pub mod browser;

#[cfg(feature = "headless")]
pub use browser::BrowserSource;
pub use direct::DirectSource;
pub use endpoints::{Endpoints, FeedKind};
pub use hybrid::HybridFetcher;
pub use models::{Author, Feed, FeedPage, Music, SkippedItem, TikTokResult, User, Video};
pub use payload::{extract_payload, Payload, PayloadLayout};
pub use traits::PageSource;
