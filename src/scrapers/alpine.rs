// src/scrapers/alpine.rs

//! Placeholder scraper for alpine mirrors.
//!
//! The mirror type is accepted by configuration, but no listing format has
//! been implemented yet. Selecting it fails loudly so a configuration
//! mistake cannot be confused with a mirror that simply has no new files.

use async_trait::async_trait;

use crate::config::MirrorType;
use crate::error::{AppError, Result};
use crate::fetch::PageFetcher;

use super::{ImageLink, MirrorScraper};

pub struct AlpineScraper;

#[async_trait]
impl MirrorScraper for AlpineScraper {
    async fn scrape(
        &self,
        fetcher: &PageFetcher,
        _file_extension: &str,
        url: &str,
    ) -> Result<Vec<ImageLink>> {
        if fetcher.fetch(url).await.is_none() {
            return Ok(Vec::new());
        }
        Err(AppError::Unimplemented(MirrorType::Alpine))
    }
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::config::HttpConfig;

    use super::*;

    #[tokio::test]
    async fn reachable_mirror_reports_unimplemented() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
            .mount(&server)
            .await;

        let fetcher = PageFetcher::new(&HttpConfig::default()).unwrap();
        let result = AlpineScraper.scrape(&fetcher, "torrent", &server.uri()).await;
        assert!(matches!(result, Err(AppError::Unimplemented(_))));
    }

    #[tokio::test]
    async fn unreachable_mirror_yields_nothing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let fetcher = PageFetcher::new(&HttpConfig::default()).unwrap();
        let links = AlpineScraper
            .scrape(&fetcher, "torrent", &server.uri())
            .await
            .unwrap();
        assert!(links.is_empty());
    }
}
