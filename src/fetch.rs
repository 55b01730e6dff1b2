// src/fetch.rs

//! Page fetching with bounded retry.
//!
//! A failed fetch is never fatal to a scrape cycle: the fetcher logs the
//! problem and reports `None`, and the caller skips that URL until the
//! next cycle.

use std::time::Duration;

use reqwest::Client;

use crate::config::HttpConfig;
use crate::error::Result;

/// Fixed pause between the two fetch attempts.
const RETRY_DELAY: Duration = Duration::from_secs(1);

/// Attempts made per URL before giving up.
const ATTEMPTS: u32 = 2;

/// Create a configured asynchronous HTTP client.
pub fn build_client(http: &HttpConfig) -> Result<Client> {
    let client = Client::builder()
        .user_agent(&http.user_agent)
        .timeout(Duration::from_secs(http.timeout_secs))
        .build()?;
    Ok(client)
}

/// HTTP page fetcher shared by all scrapers.
#[derive(Clone)]
pub struct PageFetcher {
    client: Client,
}

impl PageFetcher {
    pub fn new(http: &HttpConfig) -> Result<Self> {
        Ok(Self {
            client: build_client(http)?,
        })
    }

    /// Wrap an already-built client.
    pub fn from_client(client: Client) -> Self {
        Self { client }
    }

    /// Attempt to fetch a page, retrying once after a short fixed delay.
    ///
    /// Returns `None` when both attempts fail or the response status is not
    /// successful; the failure has already been logged.
    pub async fn fetch(&self, url: &str) -> Option<String> {
        for attempt in 1..=ATTEMPTS {
            if let Some(body) = self.attempt(url).await {
                return Some(body);
            }
            if attempt < ATTEMPTS {
                tokio::time::sleep(RETRY_DELAY).await;
            }
        }
        log::error!("failed to get \"{url}\" twice, skipping it this cycle");
        None
    }

    async fn attempt(&self, url: &str) -> Option<String> {
        log::debug!("getting {url}");
        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(err) => {
                // Warning since it's not fatal unless it happens again.
                log::warn!("error connecting to \"{url}\": {err}");
                return None;
            }
        };

        let status = response.status();
        if !status.is_success() {
            log::error!("could not get \"{url}\": {status}");
            return None;
        }

        match response.text().await {
            Ok(body) => {
                log::debug!("got {url}: {status}");
                Some(body)
            }
            Err(err) => {
                log::warn!("error reading body of \"{url}\": {err}");
                None
            }
        }
    }
}
