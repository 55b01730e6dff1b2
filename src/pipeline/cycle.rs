// src/pipeline/cycle.rs

//! One full scrape pass over the configured mirrors.

use crate::config::Config;
use crate::error::Result;
use crate::feed::FeedStore;
use crate::fetch::PageFetcher;
use crate::scrapers;

/// Run one scrape cycle: re-hydrate the feed, scrape every configured
/// repo in order, and persist the result.
///
/// A fetch failure is scoped to its URL (the scraper reports zero results
/// and the cycle moves on); an `Err` from a scraper is fatal and aborts
/// the cycle before the dump.
pub async fn run_cycle(config: &Config, fetcher: &PageFetcher) -> Result<()> {
    let mut feed = FeedStore::new(&config.rss_cache);
    feed.load().await?;

    let mut added = 0usize;
    for repo in &config.repos {
        let scraper = scrapers::for_mirror(repo.mirror);
        for url in repo.expand_urls() {
            let links = scraper
                .scrape(fetcher, &config.file_extension, &url)
                .await?;
            for link in links {
                if feed.append(&link.filename, &link.url) {
                    added += 1;
                }
            }
        }
    }

    feed.dump().await?;
    log::info!(
        "scrape cycle finished: {added} new entries, {} total",
        feed.len()
    );
    Ok(())
}
