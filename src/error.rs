//! Error handling for the songscrape application
//!
//! Fatal errors are typed here and bubble up to `main`. Per-step problems
//! during a crawl (missing elements, empty fields, stale titles) are not
//! errors; see `core::extract::SkipReason`.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScrapeError {
    #[error("Page error: {0}")]
    Page(#[from] PageError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

#[derive(Error, Debug)]
pub enum PageError {
    #[error("Invalid selector '{selector}': {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("Invalid page URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Failed to read page {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Page not found: {url}")]
    NotFound { url: String },

    #[error("Element has no navigation target: {description}")]
    NotClickable { description: String },

    #[error("No previous page to navigate back to")]
    NoHistory,
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Connection failed: {0}")]
    Connection(#[source] rusqlite::Error),

    #[error("Query failed: {0}")]
    Query(#[source] rusqlite::Error),

    #[error("Storage corruption detected")]
    Corruption,

    #[error("Stored value for '{key}' is not a JSON string array: {source}")]
    Serialization {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid config format: {0}")]
    InvalidFormat(#[from] toml::de::Error),

    #[error("Failed to write config: {0}")]
    Write(#[from] toml::ser::Error),
}

pub type Result<T> = std::result::Result<T, ScrapeError>;

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(ffi::Error { code: ffi::ErrorCode::DatabaseCorrupt, .. }, _) => {
                StorageError::Corruption
            }
            _ => StorageError::Query(err),
        }
    }
}

use rusqlite::ffi;

impl From<rusqlite::Error> for ScrapeError {
    fn from(err: rusqlite::Error) -> Self {
        ScrapeError::Storage(err.into())
    }
}

impl From<std::io::Error> for ScrapeError {
    fn from(err: std::io::Error) -> Self {
        ScrapeError::Internal(err.into())
    }
}

impl From<toml::de::Error> for ScrapeError {
    fn from(err: toml::de::Error) -> Self {
        ScrapeError::Config(ConfigError::InvalidFormat(err))
    }
}

impl From<toml::ser::Error> for ScrapeError {
    fn from(err: toml::ser::Error) -> Self {
        ScrapeError::Config(ConfigError::Write(err))
    }
}

impl From<reqwest::Error> for ScrapeError {
    fn from(err: reqwest::Error) -> Self {
        ScrapeError::Page(PageError::Http(err))
    }
}

impl From<url::ParseError> for ScrapeError {
    fn from(err: url::ParseError) -> Self {
        ScrapeError::Page(PageError::InvalidUrl(err))
    }
}
