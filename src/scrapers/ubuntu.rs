// src/scrapers/ubuntu.rs

//! Scraper for ubuntu-style release trees.
//!
//! The top-level page links to one subdirectory per release version; each
//! version directory lists the actual image files. Version links are
//! recognized by a numeric `NN.NN/` (optionally `NN.NN.NN/`) name whose
//! visible text equals its href, which filters out navigation links.

use std::sync::OnceLock;

use async_trait::async_trait;
use regex::Regex;
use scraper::Html;

use crate::error::Result;
use crate::fetch::PageFetcher;

use super::{ImageLink, MirrorScraper, extension_suffix, parse_selector};

static VERSION_DIR: OnceLock<Regex> = OnceLock::new();

fn version_dir() -> &'static Regex {
    VERSION_DIR.get_or_init(|| Regex::new(r"^\d+\.\d+(\.\d+)?/").expect("version dir pattern"))
}

pub struct UbuntuScraper;

#[async_trait]
impl MirrorScraper for UbuntuScraper {
    async fn scrape(
        &self,
        fetcher: &PageFetcher,
        file_extension: &str,
        url: &str,
    ) -> Result<Vec<ImageLink>> {
        let Some(body) = fetcher.fetch(url).await else {
            return Ok(Vec::new());
        };
        let versions = {
            let html = Html::parse_document(&body);
            version_paths(&html)?
        };

        let suffix = extension_suffix(file_extension);
        let mut links = Vec::new();
        for version in versions {
            let page_url = format!("{url}/{version}");
            let Some(body) = fetcher.fetch(&page_url).await else {
                continue;
            };
            let page_links = {
                let html = Html::parse_document(&body);
                release_links(&html, &suffix, &page_url)?
            };
            links.extend(page_links);
        }
        Ok(links)
    }
}

/// Version subdirectories to descend into, trailing slash trimmed.
fn version_paths(html: &Html) -> Result<Vec<String>> {
    let anchor_selector = parse_selector("a")?;

    let mut paths = Vec::new();
    for anchor in html.select(&anchor_selector) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        let text: String = anchor.text().collect();
        if href == text && version_dir().is_match(&text) {
            paths.push(href.trim_end_matches('/').to_string());
        }
    }
    Ok(paths)
}

/// Image-file links on a single version's page.
fn release_links(html: &Html, suffix: &str, page_url: &str) -> Result<Vec<ImageLink>> {
    let anchor_selector = parse_selector("a")?;

    let mut links = Vec::new();
    for anchor in html.select(&anchor_selector) {
        let Some(href) = anchor.value().attr("href") else {
            continue;
        };
        if href.ends_with(suffix) {
            links.push(ImageLink {
                filename: href.to_string(),
                url: format!("{page_url}/{href}"),
            });
        }
    }
    Ok(links)
}
