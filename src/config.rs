// src/config.rs

//! Application configuration structures.
//!
//! The daemon is configured from a TOML file, with a small set of
//! environment-variable overrides applied on top for container deployments.

use std::collections::HashMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Placeholder substituted into a URL template when a repo has no arches.
pub const NO_ARCH: &str = "noarches";

/// Floor on the scrape interval. Anything shorter hammers upstream mirrors.
const MIN_CHECK_INTERVAL_SECS: i64 = 15 * 60;

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Mirror index pages to scrape
    pub repos: Vec<RepoSource>,

    /// How often to re-scrape
    #[serde(default)]
    pub check_every: CheckEvery,

    /// Wall-clock time-of-day anchor for scrape wake-ups
    #[serde(default)]
    pub start_at: StartAt,

    /// Extension of the installer files to collect (dot optional)
    #[serde(default = "defaults::file_extension")]
    pub file_extension: String,

    /// Optional URL pinged after each successful cycle
    #[serde(default)]
    pub healthcheck_url: Option<String>,

    /// Location of the feed document on disk
    #[serde(default = "defaults::rss_cache")]
    pub rss_cache: PathBuf,

    /// Port the feed server listens on (bound on 0.0.0.0)
    #[serde(default = "defaults::port")]
    pub port: u16,

    /// Default arches for repos that do not list their own
    #[serde(default)]
    pub arches: Vec<String>,

    /// HTTP client behavior settings
    #[serde(default)]
    pub http: HttpConfig,
}

impl Config {
    /// Load configuration from a TOML file and apply environment overrides.
    pub fn load(path: impl AsRef<Path>, env: &HashMap<String, String>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&content)?;
        config.apply_env(env)?;
        config.resolve_default_arches();
        config.validate()?;
        Ok(config)
    }

    /// Apply environment-variable overrides on top of the file values.
    fn apply_env(&mut self, env: &HashMap<String, String>) -> Result<()> {
        if let Some(unit) = env.get("CHECK_EVERY_UNIT") {
            self.check_every.unit = unit.parse()?;
        }
        if let Some(multiplier) = env.get("CHECK_EVERY_MUL") {
            self.check_every.multiplier = multiplier
                .parse()
                .map_err(|_| AppError::config(format!("invalid CHECK_EVERY_MUL: {multiplier}")))?;
        }
        if let Some(arches) = env.get("DEFAULT_ARCHES") {
            self.arches = arches
                .split(',')
                .map(|arch| arch.trim().to_string())
                .filter(|arch| !arch.is_empty())
                .collect();
        }
        if let Some(extension) = env.get("FILE_EXTENSION") {
            self.file_extension = extension.clone();
        }
        if let Some(url) = env.get("HEALTHCHECK_URL") {
            self.healthcheck_url = Some(url.clone());
        }
        if let Some(port) = env.get("PORT") {
            self.port = port
                .parse()
                .map_err(|_| AppError::config(format!("invalid PORT: {port}")))?;
        }
        if let Some(path) = env.get("RSS_CACHE") {
            self.rss_cache = PathBuf::from(path);
        }
        if let Some(hour) = env.get("START_HOUR") {
            self.start_at.hour = hour
                .parse()
                .map_err(|_| AppError::config(format!("invalid START_HOUR: {hour}")))?;
        }
        if let Some(minute) = env.get("START_MINUTE") {
            self.start_at.minute = minute
                .parse()
                .map_err(|_| AppError::config(format!("invalid START_MINUTE: {minute}")))?;
        }
        Ok(())
    }

    /// Give repos without their own arch list the configured default.
    fn resolve_default_arches(&mut self) {
        if self.arches.is_empty() {
            return;
        }
        for repo in &mut self.repos {
            if repo.arches.is_none() {
                repo.arches = Some(self.arches.clone());
            }
        }
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        self.check_every.validate()?;
        self.start_at.validate()?;
        for repo in &self.repos {
            repo.validate()?;
        }
        Ok(())
    }
}

/// A configured mirror index to scrape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoSource {
    /// URL template with an optional `{arch}` placeholder
    pub url_template: String,

    /// Arches substituted into the template; absent means "use the default"
    #[serde(default)]
    pub arches: Option<Vec<String>>,

    /// Which scraping strategy understands this mirror's listing format
    #[serde(rename = "type")]
    pub mirror: MirrorType,
}

impl RepoSource {
    /// Expand the template into the concrete index-page URLs to scrape.
    ///
    /// With no arches, a single URL is produced using the [`NO_ARCH`]
    /// sentinel. Duplicate URLs collapse to the first occurrence,
    /// preserving first-seen order.
    pub fn expand_urls(&self) -> Vec<String> {
        let arches = self.arches.as_deref().unwrap_or_default();
        let sentinel = [NO_ARCH.to_string()];
        let arches = if arches.is_empty() { &sentinel[..] } else { arches };

        let mut urls = Vec::new();
        for arch in arches {
            let url = self.url_template.replace("{arch}", arch);
            if !urls.contains(&url) {
                urls.push(url);
            }
        }
        urls
    }

    fn validate(&self) -> Result<()> {
        let sample = self.url_template.replace("{arch}", NO_ARCH);
        url::Url::parse(&sample)
            .map_err(|err| AppError::config(format!("invalid url_template '{}': {err}", self.url_template)))?;
        Ok(())
    }
}

/// A selection of mirror types with scrapers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MirrorType {
    Debian,
    Ubuntu,
    Alpine,
}

impl fmt::Display for MirrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MirrorType::Debian => "debian",
            MirrorType::Ubuntu => "ubuntu",
            MirrorType::Alpine => "alpine",
        };
        f.write_str(name)
    }
}

/// Unit of the scrape interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntervalUnit {
    Week,
    Day,
    Hour,
    Minute,
}

impl IntervalUnit {
    fn seconds(self) -> i64 {
        match self {
            IntervalUnit::Week => 7 * 24 * 60 * 60,
            IntervalUnit::Day => 24 * 60 * 60,
            IntervalUnit::Hour => 60 * 60,
            IntervalUnit::Minute => 60,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            IntervalUnit::Week => "week",
            IntervalUnit::Day => "day",
            IntervalUnit::Hour => "hour",
            IntervalUnit::Minute => "minute",
        }
    }
}

impl FromStr for IntervalUnit {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "week" => Ok(IntervalUnit::Week),
            "day" => Ok(IntervalUnit::Day),
            "hour" => Ok(IntervalUnit::Hour),
            "minute" => Ok(IntervalUnit::Minute),
            other => Err(AppError::config(format!(
                "invalid value for check_every.unit: {other}"
            ))),
        }
    }
}

impl fmt::Display for IntervalUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Check-every interval specification.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct CheckEvery {
    pub unit: IntervalUnit,

    #[serde(default = "defaults::multiplier")]
    pub multiplier: f64,
}

impl CheckEvery {
    /// Construct a validated interval.
    pub fn new(unit: IntervalUnit, multiplier: f64) -> Result<Self> {
        let check_every = Self { unit, multiplier };
        check_every.validate()?;
        Ok(check_every)
    }

    /// The interval between checks.
    pub fn interval(&self) -> TimeDelta {
        let millis = self.unit.seconds() as f64 * self.multiplier * 1000.0;
        TimeDelta::milliseconds(millis as i64)
    }

    fn validate(&self) -> Result<()> {
        if !self.multiplier.is_finite() || self.multiplier <= 0.0 {
            return Err(AppError::config(format!(
                "invalid value for check_every.multiplier: {}",
                self.multiplier
            )));
        }
        if self.interval().num_seconds() < MIN_CHECK_INTERVAL_SECS {
            return Err(AppError::config(format!(
                "checking every {} {}s (less than 15 minutes) would hammer the mirrors",
                self.multiplier, self.unit
            )));
        }
        Ok(())
    }
}

impl Default for CheckEvery {
    fn default() -> Self {
        Self {
            unit: IntervalUnit::Day,
            multiplier: defaults::multiplier(),
        }
    }
}

/// Wall-clock time-of-day specification.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StartAt {
    pub hour: u8,
    pub minute: u8,
}

impl StartAt {
    fn validate(&self) -> Result<()> {
        if self.hour > 23 {
            return Err(AppError::config(format!(
                "invalid value for start_at.hour: {}",
                self.hour
            )));
        }
        if self.minute > 59 {
            return Err(AppError::config(format!(
                "invalid value for start_at.minute: {}",
                self.minute
            )));
        }
        Ok(())
    }
}

impl Default for StartAt {
    fn default() -> Self {
        Self {
            hour: defaults::start_hour(),
            minute: defaults::start_minute(),
        }
    }
}

/// HTTP client behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// User-Agent header for outbound requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
        }
    }
}

mod defaults {
    use std::path::PathBuf;

    pub fn file_extension() -> String {
        "torrent".into()
    }
    pub fn rss_cache() -> PathBuf {
        PathBuf::from("/var/cache/isofeed/feed.rss")
    }
    pub fn port() -> u16 {
        56427
    }
    pub fn multiplier() -> f64 {
        1.0
    }
    pub fn start_hour() -> u8 {
        12
    }
    pub fn start_minute() -> u8 {
        0
    }
    pub fn user_agent() -> String {
        "Mozilla/5.0 (compatible; isofeed/0.1)".into()
    }
    pub fn timeout() -> u64 {
        30
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repo(template: &str, arches: Option<Vec<&str>>) -> RepoSource {
        RepoSource {
            url_template: template.to_string(),
            arches: arches.map(|list| list.into_iter().map(String::from).collect()),
            mirror: MirrorType::Debian,
        }
    }

    #[test]
    fn expand_without_arches_uses_sentinel() {
        let repo = repo("https://cd.example.com/{arch}", Some(vec![]));
        assert_eq!(repo.expand_urls(), vec!["https://cd.example.com/noarches"]);

        let repo = super::RepoSource {
            arches: None,
            ..repo
        };
        assert_eq!(repo.expand_urls(), vec!["https://cd.example.com/noarches"]);
    }

    #[test]
    fn expand_one_url_per_arch_in_order() {
        let repo = repo("https://cd.example.com/{arch}", Some(vec!["arm64", "amd64"]));
        assert_eq!(
            repo.expand_urls(),
            vec![
                "https://cd.example.com/arm64",
                "https://cd.example.com/amd64",
            ]
        );
    }

    #[test]
    fn expand_collapses_duplicates_first_seen() {
        let repo = repo("https://cd.example.com/{arch}", Some(vec!["a", "a", "b"]));
        assert_eq!(
            repo.expand_urls(),
            vec!["https://cd.example.com/a", "https://cd.example.com/b"]
        );
    }

    #[test]
    fn expand_without_placeholder_yields_template() {
        let repo = repo("https://cd.example.com/isos", Some(vec!["a", "b"]));
        assert_eq!(repo.expand_urls(), vec!["https://cd.example.com/isos"]);
    }

    #[test]
    fn check_every_enforces_fifteen_minute_floor() {
        assert!(CheckEvery::new(IntervalUnit::Minute, 14.0).is_err());
        assert!(CheckEvery::new(IntervalUnit::Minute, 15.0).is_ok());
        assert!(CheckEvery::new(IntervalUnit::Hour, 0.2).is_err());
        assert!(CheckEvery::new(IntervalUnit::Day, 1.0).is_ok());
    }

    #[test]
    fn check_every_rejects_nonpositive_multiplier() {
        assert!(CheckEvery::new(IntervalUnit::Day, 0.0).is_err());
        assert!(CheckEvery::new(IntervalUnit::Day, -1.0).is_err());
    }

    #[test]
    fn check_every_interval_units() {
        let weekly = CheckEvery::new(IntervalUnit::Week, 1.0).unwrap();
        assert_eq!(weekly.interval().num_days(), 7);
        let half_day = CheckEvery::new(IntervalUnit::Hour, 12.0).unwrap();
        assert_eq!(half_day.interval().num_hours(), 12);
    }

    #[test]
    fn start_at_rejects_out_of_range() {
        assert!(StartAt { hour: 24, minute: 0 }.validate().is_err());
        assert!(StartAt { hour: 0, minute: 60 }.validate().is_err());
        assert!(StartAt { hour: 23, minute: 59 }.validate().is_ok());
    }

    #[test]
    fn load_full_config_from_toml() {
        let raw = r#"
            file_extension = "iso"
            port = 8080
            rss_cache = "/tmp/isofeed-test/feed.rss"
            arches = ["amd64"]

            [check_every]
            unit = "hour"
            multiplier = 6

            [start_at]
            hour = 3
            minute = 30

            [[repos]]
            url_template = "https://cdimage.example.org/{arch}/bt-cd"
            type = "debian"

            [[repos]]
            url_template = "https://releases.example.org/"
            arches = []
            type = "ubuntu"
        "#;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, raw).unwrap();

        let config = Config::load(&path, &HashMap::new()).unwrap();
        assert_eq!(config.file_extension, "iso");
        assert_eq!(config.port, 8080);
        assert_eq!(config.check_every.unit, IntervalUnit::Hour);
        assert_eq!(config.start_at.hour, 3);
        // First repo inherits the top-level arches; second keeps its empty list.
        assert_eq!(
            config.repos[0].expand_urls(),
            vec!["https://cdimage.example.org/amd64/bt-cd"]
        );
        assert_eq!(config.repos[1].mirror, MirrorType::Ubuntu);
        assert_eq!(
            config.repos[1].expand_urls(),
            vec!["https://releases.example.org/"]
        );
    }

    #[test]
    fn env_overrides_take_precedence() {
        let raw = r#"
            port = 1234

            [[repos]]
            url_template = "https://cd.example.com/{arch}"
            type = "debian"
        "#;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, raw).unwrap();

        let env: HashMap<String, String> = [
            ("PORT", "4321"),
            ("FILE_EXTENSION", "iso"),
            ("CHECK_EVERY_UNIT", "hour"),
            ("CHECK_EVERY_MUL", "2"),
            ("DEFAULT_ARCHES", "amd64, arm64"),
            ("START_HOUR", "6"),
            ("START_MINUTE", "45"),
            ("RSS_CACHE", "/tmp/other.rss"),
            ("HEALTHCHECK_URL", "https://hc.example.com/ping"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let config = Config::load(&path, &env).unwrap();
        assert_eq!(config.port, 4321);
        assert_eq!(config.file_extension, "iso");
        assert_eq!(config.check_every.unit, IntervalUnit::Hour);
        assert_eq!(config.check_every.multiplier, 2.0);
        assert_eq!(config.start_at.hour, 6);
        assert_eq!(config.start_at.minute, 45);
        assert_eq!(config.rss_cache, PathBuf::from("/tmp/other.rss"));
        assert_eq!(
            config.healthcheck_url.as_deref(),
            Some("https://hc.example.com/ping")
        );
        assert_eq!(
            config.repos[0].expand_urls(),
            vec![
                "https://cd.example.com/amd64",
                "https://cd.example.com/arm64",
            ]
        );
    }

    #[test]
    fn load_rejects_abusive_interval() {
        let raw = r#"
            [check_every]
            unit = "minute"
            multiplier = 5

            [[repos]]
            url_template = "https://cd.example.com/{arch}"
            type = "debian"
        "#;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, raw).unwrap();

        assert!(Config::load(&path, &HashMap::new()).is_err());
    }

    #[test]
    fn load_rejects_unknown_mirror_type() {
        let raw = r#"
            [[repos]]
            url_template = "https://cd.example.com/{arch}"
            type = "gentoo"
        "#;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, raw).unwrap();

        assert!(Config::load(&path, &HashMap::new()).is_err());
    }

    #[test]
    fn load_rejects_bad_url_template() {
        let raw = r#"
            [[repos]]
            url_template = "not a url at all"
            type = "debian"
        "#;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, raw).unwrap();

        assert!(Config::load(&path, &HashMap::new()).is_err());
    }
}
