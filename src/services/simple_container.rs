use std::sync::Arc;
use crate::config::Config;
use crate::core::extract::SidebarExtractor;
use crate::core::page::source::parse_location;
use crate::core::page::{DocumentPage, HttpSource, SiteSource};
use crate::core::storage::LocalStorage;
use crate::error::Result;

pub struct SimpleServices {
    config: Arc<Config>,
}

impl SimpleServices {
    pub fn new(config: Config) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> Arc<Config> {
        self.config.clone()
    }

    pub fn open_storage(&self) -> Result<LocalStorage> {
        Ok(LocalStorage::open(&self.config.storage_path)?)
    }

    pub fn create_page_source(&self) -> Result<SiteSource> {
        let http = HttpSource::new(&self.config.user_agent, self.config.request_timeout())?;
        Ok(SiteSource::new(http))
    }

    /// Load `location` (URL or snapshot path) as the first page of a session.
    pub async fn open_page(&self, location: &str) -> Result<DocumentPage<SiteSource>> {
        let url = parse_location(location)?;
        let page = DocumentPage::open(self.create_page_source()?, url).await?;
        Ok(page)
    }

    pub fn create_extractor(&self) -> SidebarExtractor {
        SidebarExtractor::from_config(&self.config)
    }
}
