// src/feed.rs

//! Accumulated feed of discovered installer images.
//!
//! The RSS document on disk is both the published output and the durable
//! accumulation state: every cycle re-hydrates a [`FeedStore`] from it,
//! appends whatever the scrapers found, and writes it back. Entries are
//! keyed by file URL and are never evicted.

use std::collections::{BTreeMap, HashSet};
use std::io::ErrorKind;
use std::path::PathBuf;

use rss::{Channel, ChannelBuilder, Item, ItemBuilder};
use tokio::io::AsyncWriteExt;

use crate::error::Result;

const FEED_TITLE: &str = "ISO Release Feed";
const FEED_DESCRIPTION: &str = "A feed of Linux installer torrent files.";
const FEED_LINK: &str = "http://localhost";
const CONTENT_NS: (&str, &str) = ("content", "http://purl.org/rss/1.0/modules/content/");

/// One published release announcement.
///
/// By convention, `title` and `description` carry the filename while
/// `link` and `content` carry the file URL. The URL is the identity key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedEntry {
    pub title: String,
    pub link: String,
    pub description: String,
    pub content: String,
}

/// The de-duplicated, newest-first collection of feed entries.
pub struct FeedStore {
    path: PathBuf,
    entries: Vec<FeedEntry>,
    seen: HashSet<String>,
}

impl FeedStore {
    /// Create an empty store backed by the feed document at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            entries: Vec::new(),
            seen: HashSet::new(),
        }
    }

    pub fn entries(&self) -> &[FeedEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Load the previously generated feed document, if one exists.
    ///
    /// A missing file leaves the store empty; that is the normal first-run
    /// state. A file that exists but does not parse is surfaced as an
    /// error rather than discarded: it is the full accumulated history.
    pub async fn load(&mut self) -> Result<()> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                log::debug!("no feed cache at {}", self.path.display());
                return Ok(());
            }
            Err(err) => return Err(err.into()),
        };

        let channel = Channel::read_from(&bytes[..])?;
        log::debug!(
            "loading {} entries from existing cache at {}",
            channel.items().len(),
            self.path.display()
        );
        for item in channel.items() {
            // The link is the identity key; items without one are skipped.
            let Some(link) = item.link() else { continue };
            if !self.seen.insert(link.to_string()) {
                continue;
            }
            self.entries.push(FeedEntry {
                title: item.title().unwrap_or_default().to_string(),
                link: link.to_string(),
                description: item.description().unwrap_or_default().to_string(),
                content: item.content().unwrap_or(link).to_string(),
            });
        }
        Ok(())
    }

    /// Add an entry for the file `name` at `url`.
    ///
    /// Idempotent on the URL: a second append with the same URL is a no-op.
    /// New entries go to the front so they sort before old ones in the
    /// rendered document. Returns whether the entry was actually added.
    pub fn append(&mut self, name: &str, url: &str) -> bool {
        if !self.seen.insert(url.to_string()) {
            return false;
        }
        log::debug!("added {name}: {url}");
        self.entries.insert(
            0,
            FeedEntry {
                title: name.to_string(),
                link: url.to_string(),
                description: name.to_string(),
                content: url.to_string(),
            },
        );
        true
    }

    /// Save the feed to disk.
    ///
    /// The new document is written fully to a sibling temp file and then
    /// renamed over the old one, so a concurrent reader never observes a
    /// partially-written feed.
    pub async fn dump(&self) -> Result<()> {
        let header: &[u8] = b"<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n";
        let buf = self.to_channel().pretty_write_to(header.to_vec(), b' ', 2)?;

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let tmp = self.path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(&buf).await?;
        file.flush().await?;
        drop(file);
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    fn to_channel(&self) -> Channel {
        let items: Vec<Item> = self
            .entries
            .iter()
            .map(|entry| {
                ItemBuilder::default()
                    .title(entry.title.clone())
                    .link(entry.link.clone())
                    .description(entry.description.clone())
                    .content(entry.content.clone())
                    .build()
            })
            .collect();

        let mut namespaces = BTreeMap::new();
        namespaces.insert(CONTENT_NS.0.to_string(), CONTENT_NS.1.to_string());

        ChannelBuilder::default()
            .title(FEED_TITLE)
            .description(FEED_DESCRIPTION)
            .link(FEED_LINK)
            .namespaces(namespaces)
            .items(items)
            .build()
    }
}
