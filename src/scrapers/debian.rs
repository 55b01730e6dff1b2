// src/scrapers/debian.rs

//! Scraper for debian-style directory listings.
//!
//! The index page is a table with one file per row; the first cell links to
//! the file. A row is yielded when the link's extension matches the
//! configured one.

use async_trait::async_trait;
use scraper::Html;

use crate::error::Result;
use crate::fetch::PageFetcher;

use super::{ImageLink, MirrorScraper, normalize_extension, parse_selector};

pub struct DebianScraper;

#[async_trait]
impl MirrorScraper for DebianScraper {
    async fn scrape(
        &self,
        fetcher: &PageFetcher,
        file_extension: &str,
        url: &str,
    ) -> Result<Vec<ImageLink>> {
        let Some(body) = fetcher.fetch(url).await else {
            return Ok(Vec::new());
        };
        let html = Html::parse_document(&body);
        listing_links(&html, file_extension, url)
    }
}

/// Extract matching file links from a directory-listing table.
fn listing_links(html: &Html, file_extension: &str, base_url: &str) -> Result<Vec<ImageLink>> {
    let row_selector = parse_selector("tr")?;
    let link_selector = parse_selector("td a")?;
    let want = normalize_extension(file_extension);

    let mut links = Vec::new();
    for row in html.select(&row_selector) {
        // Rows without a linked cell are headers or decorations; skip them.
        let Some(anchor) = row.select(&link_selector).next() else {
            continue;
        };
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        let matches = href
            .rsplit_once('.')
            .is_some_and(|(_, ext)| ext.eq_ignore_ascii_case(&want));
        if matches {
            links.push(ImageLink {
                filename: href.to_string(),
                url: format!("{base_url}/{href}"),
            });
        }
    }
    Ok(links)
}
