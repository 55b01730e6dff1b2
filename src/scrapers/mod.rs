// src/scrapers/mod.rs

//! Mirror scraping strategies.
//!
//! Each mirror type has its own directory-listing convention, so each gets
//! its own [`MirrorScraper`] implementation. Adding support for a new
//! mirror type means adding one variant module and one [`for_mirror`] arm;
//! the scheduler and feed logic never change.

pub mod alpine;
pub mod debian;
pub mod ubuntu;

use async_trait::async_trait;
use scraper::Selector;

use crate::config::MirrorType;
use crate::error::{AppError, Result};
use crate::fetch::PageFetcher;

pub use alpine::AlpineScraper;
pub use debian::DebianScraper;
pub use ubuntu::UbuntuScraper;

/// A link to an installer image discovered on a mirror.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageLink {
    /// Filename as it appeared in the listing
    pub filename: String,

    /// Absolute URL of the file
    pub url: String,
}

/// A scraping strategy for one mirror type's listing format.
#[async_trait]
pub trait MirrorScraper: Send + Sync {
    /// Collect installer-image links from the index page at `url`.
    ///
    /// A failed fetch yields an empty list, not an error: the URL is simply
    /// skipped for this cycle. `Err` is reserved for conditions that must
    /// halt the producer loop (unimplemented variant, selector bug).
    async fn scrape(
        &self,
        fetcher: &PageFetcher,
        file_extension: &str,
        url: &str,
    ) -> Result<Vec<ImageLink>>;
}

/// Get the scraper that corresponds to `mirror`.
pub fn for_mirror(mirror: MirrorType) -> &'static dyn MirrorScraper {
    match mirror {
        MirrorType::Debian => &DebianScraper,
        MirrorType::Ubuntu => &UbuntuScraper,
        MirrorType::Alpine => &AlpineScraper,
    }
}

/// Strip leading dots from the configured extension, lowercased.
pub(crate) fn normalize_extension(extension: &str) -> String {
    extension.trim_start_matches('.').to_ascii_lowercase()
}

/// The configured extension as a `.`-prefixed filename suffix.
pub(crate) fn extension_suffix(extension: &str) -> String {
    format!(".{}", extension.trim_start_matches('.'))
}

pub(crate) fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|err| AppError::selector(selector, format!("{err:?}")))
}
