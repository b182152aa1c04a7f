use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::error::PageError;

/// Something that can produce the HTML of a page for a URL.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn load(&self, url: &Url) -> Result<String, PageError>;
}

#[derive(Clone)]
pub struct HttpSource {
    client: reqwest::Client,
}

impl HttpSource {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, PageError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;

        Ok(Self { client })
    }
}

#[async_trait]
impl PageSource for HttpSource {
    async fn load(&self, url: &Url) -> Result<String, PageError> {
        debug!("GET {}", url);
        let response = self.client.get(url.clone()).send().await?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(PageError::NotFound { url: url.to_string() });
        }

        Ok(response.error_for_status()?.text().await?)
    }
}

/// Reads saved page snapshots from disk for `file://` URLs.
#[derive(Debug, Clone, Default)]
pub struct FileSource;

#[async_trait]
impl PageSource for FileSource {
    async fn load(&self, url: &Url) -> Result<String, PageError> {
        let path = url
            .to_file_path()
            .map_err(|_| PageError::NotFound { url: url.to_string() })?;

        debug!("Reading snapshot {}", path.display());
        tokio::fs::read_to_string(&path)
            .await
            .map_err(|source| PageError::Read { path, source })
    }
}

/// Routes `file://` URLs to disk and everything else over HTTP.
#[derive(Clone)]
pub struct SiteSource {
    http: HttpSource,
    files: FileSource,
}

impl SiteSource {
    pub fn new(http: HttpSource) -> Self {
        Self {
            http,
            files: FileSource,
        }
    }
}

#[async_trait]
impl PageSource for SiteSource {
    async fn load(&self, url: &Url) -> Result<String, PageError> {
        match url.scheme() {
            "file" => self.files.load(url).await,
            _ => self.http.load(url).await,
        }
    }
}

/// Accept either an absolute URL or a local snapshot path.
pub fn parse_location(location: &str) -> Result<Url, PageError> {
    match Url::parse(location) {
        // single letter schemes are Windows drive letters, not URLs
        Ok(url) if url.scheme().len() > 1 => Ok(url),
        _ => {
            let path = Path::new(location);
            let absolute = if path.is_absolute() {
                path.to_path_buf()
            } else {
                std::env::current_dir()
                    .map_err(|source| PageError::Read {
                        path: path.to_path_buf(),
                        source,
                    })?
                    .join(path)
            };
            Url::from_file_path(&absolute).map_err(|_| PageError::NotFound {
                url: location.to_string(),
            })
        }
    }
}

/// In-memory site keyed by absolute URL.
#[cfg(test)]
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    pages: std::collections::HashMap<String, String>,
}

#[cfg(test)]
impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: &str, html: impl Into<String>) -> Self {
        self.pages.insert(url.to_string(), html.into());
        self
    }
}

#[cfg(test)]
#[async_trait]
impl PageSource for MemorySource {
    async fn load(&self, url: &Url) -> Result<String, PageError> {
        self.pages
            .get(url.as_str())
            .cloned()
            .ok_or_else(|| PageError::NotFound { url: url.to_string() })
    }
}
