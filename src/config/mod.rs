pub mod env;
pub mod validation;

use anyhow::Context;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

use crate::core::schedule::{DelayRange, VisitTiming};
use crate::error::Result;
use env::{EnvParser, EnvVars};
pub use validation::ConfigValidator;

fn default_storage_key() -> String {
    "sings".to_string()
}

fn default_genre() -> String {
    "alternative_rock".to_string()
}

fn default_genre_path_prefix() -> String {
    "/genre/".to_string()
}

fn default_user_agent() -> String {
    format!("songscrape/{}", env!("CARGO_PKG_VERSION"))
}

fn default_request_timeout_seconds() -> u64 {
    10
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Key-value storage file holding the persisted batch
    pub storage_path: PathBuf,

    /// Storage key the batch is mirrored under
    #[serde(default = "default_storage_key")]
    pub storage_key: String,

    /// Artist listing page the crawl starts from (URL or snapshot path)
    #[serde(default)]
    pub start_url: Option<String>,

    /// Genre used when the page has no usable genre link
    #[serde(default = "default_genre")]
    pub default_genre: String,

    /// Path prefix stripped from genre links
    #[serde(default = "default_genre_path_prefix")]
    pub genre_path_prefix: String,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    #[serde(default = "default_request_timeout_seconds")]
    pub request_timeout_seconds: u64,

    #[serde(default)]
    pub crawl: CrawlConfig,

    #[serde(default)]
    pub selectors: Selectors,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlConfig {
    /// Index of the first artist in the listing to visit
    pub first_artist_index: usize,

    /// Artists at or past this index are never visited
    pub max_artists: usize,

    /// Top tracks opened per artist
    pub max_titles: usize,

    /// Period of the artist tick, drawn once per crawl
    pub tick_interval_ms: DelayRange,

    /// Delay before each track click
    pub open_track_delay_ms: DelayRange,

    /// Delay between a track click and reading its metadata
    pub extract_delay_ms: u64,

    /// Delay before persisting and going back to the listing
    pub return_delay_ms: u64,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            first_artist_index: 0,
            max_artists: 100,
            max_titles: 5,
            tick_interval_ms: DelayRange::new(35_000, 40_000),
            open_track_delay_ms: DelayRange::new(2_500, 3_500),
            extract_delay_ms: 1_500,
            return_delay_ms: 200,
        }
    }
}

impl CrawlConfig {
    pub fn visit_timing(&self) -> VisitTiming {
        VisitTiming {
            max_titles: self.max_titles,
            open_track_delay: self.open_track_delay_ms,
            extract_delay: Duration::from_millis(self.extract_delay_ms),
            return_delay: Duration::from_millis(self.return_delay_ms),
        }
    }
}

/// CSS selectors for the catalog's page structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Selectors {
    pub artist_links: String,
    pub top_tracks: String,
    pub sidebar: String,
    pub sidebar_title: String,
    pub sidebar_artist: String,
    pub sidebar_lyrics: String,
    pub genre_link: String,
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            artist_links: ".page-genre__artists .artist__name a".to_string(),
            top_tracks: ".page-artist__tracks_top .track".to_string(),
            sidebar: ".sidebar-track".to_string(),
            sidebar_title: ".sidebar-track__title a".to_string(),
            sidebar_artist: ".album-summary__pregroup a".to_string(),
            sidebar_lyrics: ".sidebar-track__lyric-preview".to_string(),
            genre_link: ".page-artist__info .page-artist__summary a".to_string(),
        }
    }
}

impl Selectors {
    pub fn all(&self) -> [(&'static str, &str); 7] {
        [
            ("artist_links", &self.artist_links),
            ("top_tracks", &self.top_tracks),
            ("sidebar", &self.sidebar),
            ("sidebar_title", &self.sidebar_title),
            ("sidebar_artist", &self.sidebar_artist),
            ("sidebar_lyrics", &self.sidebar_lyrics),
            ("genre_link", &self.genre_link),
        ]
    }
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = match ProjectDirs::from("net", "songscrape", "songscrape") {
            Some(project_dirs) => project_dirs.data_dir().to_path_buf(),
            None => {
                warn!("ProjectDirs unavailable; falling back to current directory for data path");
                PathBuf::from(".")
            }
        };

        Self {
            storage_path: data_dir.join("storage.db"),
            storage_key: default_storage_key(),
            start_url: None,
            default_genre: default_genre(),
            genre_path_prefix: default_genre_path_prefix(),
            user_agent: default_user_agent(),
            request_timeout_seconds: default_request_timeout_seconds(),
            crawl: CrawlConfig::default(),
            selectors: Selectors::default(),
        }
    }
}

impl Config {
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        // Try to load .env file if it exists
        dotenvy::dotenv().ok();

        let config_file = if let Some(path) = config_path {
            PathBuf::from(path)
        } else {
            Self::default_config_path()?
        };

        let mut config = if config_file.exists() {
            let content = fs::read_to_string(&config_file)
                .with_context(|| format!("reading {}", config_file.display()))?;
            toml::from_str(&content)?
        } else {
            Self::default()
        };

        // Environment variables take priority over the file
        config.load_from_env()?;
        config.validate()?;

        // Save config file if it doesn't exist
        if !config_file.exists() {
            if let Some(parent) = config_file.parent() {
                fs::create_dir_all(parent)?;
            }
            config.save(&config_file)?;
        }

        Ok(config)
    }

    fn load_from_env(&mut self) -> Result<()> {
        if let Some(path) = EnvParser::parse_path(EnvVars::STORAGE_PATH, false)? {
            self.storage_path = path;
        }

        if let Some(key) = EnvParser::parse_string(EnvVars::STORAGE_KEY, None)? {
            self.storage_key = key;
        }

        if let Some(url) = EnvParser::parse_string(EnvVars::START_URL, None)? {
            self.start_url = Some(url);
        }

        if let Some(genre) = EnvParser::parse_string(EnvVars::DEFAULT_GENRE, None)? {
            self.default_genre = genre;
        }

        if let Some(agent) = EnvParser::parse_string(EnvVars::USER_AGENT, None)? {
            self.user_agent = agent;
        }

        if let Some(timeout) = EnvParser::parse_u64(EnvVars::REQUEST_TIMEOUT_SECONDS, 1, 300)? {
            self.request_timeout_seconds = timeout;
        }

        if let Some(first) = EnvParser::parse_usize(EnvVars::FIRST_ARTIST_INDEX, 0, 100_000)? {
            self.crawl.first_artist_index = first;
        }

        if let Some(max) = EnvParser::parse_usize(EnvVars::MAX_ARTISTS, 1, 100_000)? {
            self.crawl.max_artists = max;
        }

        if let Some(titles) = EnvParser::parse_usize(EnvVars::MAX_TITLES, 1, 100)? {
            self.crawl.max_titles = titles;
        }

        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        ConfigValidator::validate_db_path(&self.storage_path)?;
        ConfigValidator::validate_not_empty(&self.storage_key, "storage key")?;
        ConfigValidator::validate_not_empty(&self.default_genre, "default genre")?;
        ConfigValidator::validate_range(self.request_timeout_seconds, 1, 300, "request timeout seconds")?;

        if let Some(ref url) = self.start_url {
            ConfigValidator::validate_location(url, "start")?;
        }

        let crawl = &self.crawl;
        ConfigValidator::validate_range(crawl.max_titles, 1, 100, "max titles")?;
        ConfigValidator::validate_range(crawl.max_artists, 1, 100_000, "max artists")?;
        ConfigValidator::validate_delay_range(&crawl.tick_interval_ms, "tick interval")?;
        ConfigValidator::validate_delay_range(&crawl.open_track_delay_ms, "open track delay")?;
        ConfigValidator::validate_range(crawl.extract_delay_ms, 1, 600_000, "extract delay")?;
        ConfigValidator::validate_range(crawl.return_delay_ms, 1, 600_000, "return delay")?;

        for (name, selector) in self.selectors.all() {
            ConfigValidator::validate_selector(selector, name)?;
        }

        Ok(())
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    fn default_config_path() -> Result<PathBuf> {
        let project_dirs = ProjectDirs::from("net", "songscrape", "songscrape")
            .ok_or_else(|| anyhow::anyhow!("Failed to determine project directories"))?;

        Ok(project_dirs.config_dir().join("config.toml"))
    }

    pub fn config_path() -> Result<PathBuf> {
        Self::default_config_path()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        config.validate().unwrap();
        assert_eq!(config.storage_key, "sings");
        assert_eq!(config.crawl.first_artist_index, 0);
        assert_eq!(config.crawl.max_artists, 100);
        assert_eq!(config.crawl.max_titles, 5);
        assert_eq!(config.crawl.tick_interval_ms, DelayRange::new(35_000, 40_000));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
storage_path = "/tmp/songscrape-test/storage.db"
default_genre = "post_punk"

[crawl]
max_artists = 3

[selectors]
top_tracks = ".tracks .track"
"#,
        )
        .unwrap();

        let config = Config::load(Some(path.to_str().unwrap())).unwrap();
        assert_eq!(config.default_genre, "post_punk");
        assert_eq!(config.crawl.max_artists, 3);
        assert_eq!(config.crawl.max_titles, 5);
        assert_eq!(config.selectors.top_tracks, ".tracks .track");
        assert_eq!(config.selectors.sidebar, ".sidebar-track");
    }

    #[test]
    fn test_missing_file_is_written() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        Config::load(Some(path.to_str().unwrap())).unwrap();
        assert!(path.exists());

        let reloaded: Config = toml::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(reloaded.genre_path_prefix, "/genre/");
    }

    #[test]
    fn test_bad_selector_is_rejected() {
        let mut config = Config::default();
        config.selectors.genre_link = "a[".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_visit_timing() {
        let timing = CrawlConfig::default().visit_timing();
        assert_eq!(timing.max_titles, 5);
        assert_eq!(timing.extract_delay, Duration::from_millis(1500));
        assert_eq!(timing.return_delay, Duration::from_millis(200));
    }
}
