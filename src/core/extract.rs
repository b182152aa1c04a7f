//! Reading song metadata out of a rendered page
//!
//! The sidebar-track panel shows the currently selected track; the artist
//! summary carries a genre link. Both extraction workflows go through
//! [`SidebarExtractor`] so they share one genre and language policy.

use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::config::{Config, Selectors};
use crate::core::page::{Page, Query};
use crate::core::song::SongRecord;
use crate::error::PageError;

/// Why a crawl step produced no record. None of these stop the crawl.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SkipReason {
    #[error("{what} not found")]
    MissingElement { what: String },

    #[error("empty data in {}", .fields.join(", "))]
    EmptyFields { fields: Vec<&'static str> },

    #[error("title has not been changed: {title}")]
    StaleTitle { title: String },

    #[error("artist index {index} is past the listing ({available} artists, limit {limit})")]
    OutOfBounds {
        index: usize,
        available: usize,
        limit: usize,
    },
}

#[derive(Debug, Clone)]
pub struct SidebarExtractor {
    selectors: Selectors,
    default_genre: String,
    genre_path_prefix: String,
    genre_override: Option<String>,
}

impl SidebarExtractor {
    pub fn new(selectors: Selectors, default_genre: String, genre_path_prefix: String) -> Self {
        Self {
            selectors,
            default_genre,
            genre_path_prefix,
            genre_override: None,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.selectors.clone(),
            config.default_genre.clone(),
            config.genre_path_prefix.clone(),
        )
    }

    /// Use `genre` for every record instead of reading the genre link.
    pub fn with_genre_override(mut self, genre: Option<String>) -> Self {
        self.genre_override = genre;
        self
    }

    /// Build a record from the page as it is now.
    ///
    /// Missing elements read as empty fields; callers decide whether an
    /// incomplete record is still worth emitting.
    pub fn extract(&self, page: &dyn Page) -> Result<SongRecord, PageError> {
        let title = self.sidebar_text(page, &self.selectors.sidebar_title)?;
        let artist = self.sidebar_text(page, &self.selectors.sidebar_artist)?;
        let lyrics = self.sidebar_text(page, &self.selectors.sidebar_lyrics)?;
        let genre = self.genre(page)?;

        Ok(SongRecord::new(artist, title, lyrics, genre))
    }

    fn sidebar_text(&self, page: &dyn Page, selector: &str) -> Result<String, PageError> {
        let query = Query::new(selector).within(self.selectors.sidebar.as_str());
        Ok(page
            .find_last(&query)?
            .map(|element| element.trimmed_text().to_string())
            .unwrap_or_default())
    }

    pub fn genre(&self, page: &dyn Page) -> Result<String, PageError> {
        if let Some(ref genre) = self.genre_override {
            return Ok(genre.clone());
        }

        let href = page
            .find_last(&Query::new(self.selectors.genre_link.as_str()))?
            .and_then(|link| link.attr("href").map(str::to_string));

        let derived = href.as_deref().and_then(|href| {
            genre_from_href(href, page.current_url(), &self.genre_path_prefix)
        });

        Ok(match derived {
            Some(genre) => genre,
            None => {
                debug!(
                    "No genre in link {:?}; using default '{}'",
                    href, self.default_genre
                );
                self.default_genre.clone()
            }
        })
    }
}

/// The part of a genre link's path after `prefix`, without surrounding slashes.
pub fn genre_from_href(href: &str, base: Option<&Url>, prefix: &str) -> Option<String> {
    let path = match base {
        Some(base) => base.join(href).ok()?.path().to_string(),
        None => match Url::parse(href) {
            Ok(url) => url.path().to_string(),
            Err(_) => href.to_string(),
        },
    };

    let start = path.find(prefix)? + prefix.len();
    let genre = path[start..].trim_matches('/');

    if genre.is_empty() {
        None
    } else {
        Some(genre.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::page::source::MemorySource;
    use crate::core::page::DocumentPage;
    use crate::core::song::Lang;

    const TRACK_PAGE: &str = r#"
        <div class="page-artist__info">
            <div class="page-artist__summary"><a href="/label/1">Label</a><a href="/genre/post_punk">Post-punk</a></div>
        </div>
        <div class="sidebar-track">
            <div class="sidebar-track__title"><a>Stale</a></div>
        </div>
        <div class="sidebar-track">
            <div class="sidebar-track__title"><a> Кукушка </a></div>
            <div class="album-summary__pregroup"><a>Кино</a></div>
            <div class="sidebar-track__lyric-preview">Песен ещё ненаписанных
сколько?</div>
        </div>
    "#;

    async fn page(html: &str) -> DocumentPage<MemorySource> {
        let source = MemorySource::new().with_page("http://site.test/track/1", html);
        DocumentPage::open(source, Url::parse("http://site.test/track/1").unwrap())
            .await
            .unwrap()
    }

    fn extractor() -> SidebarExtractor {
        SidebarExtractor::new(
            Selectors::default(),
            "alternative_rock".to_string(),
            "/genre/".to_string(),
        )
    }

    #[tokio::test]
    async fn test_extracts_last_sidebar() {
        let page = page(TRACK_PAGE).await;
        let song = extractor().extract(&page).unwrap();

        assert_eq!(song.title, "Кукушка");
        assert_eq!(song.artist, "Кино");
        assert_eq!(song.lyrics, "Песен ещё ненаписанных\nсколько?");
        assert_eq!(song.lang, Lang::Ru);
        assert_eq!(song.genre, "post_punk");
        assert!(song.is_complete());
    }

    #[tokio::test]
    async fn test_missing_elements_read_as_empty() {
        let page = page(r#"<div class="sidebar-track"><div class="sidebar-track__title"><a>Only title</a></div></div>"#).await;
        let song = extractor().extract(&page).unwrap();

        assert_eq!(song.title, "Only title");
        assert_eq!(song.missing_fields(), vec!["artist", "lyrics"]);
        assert_eq!(song.genre, "alternative_rock");
        assert_eq!(song.lang, Lang::En);
    }

    #[tokio::test]
    async fn test_genre_override() {
        let page = page(TRACK_PAGE).await;
        let song = extractor()
            .with_genre_override(Some("shoegaze".to_string()))
            .extract(&page)
            .unwrap();
        assert_eq!(song.genre, "shoegaze");
    }

    #[test]
    fn test_genre_from_href() {
        let base = Url::parse("http://site.test/artist/9").unwrap();
        assert_eq!(genre_from_href("/genre/rock", Some(&base), "/genre/").as_deref(), Some("rock"));
        assert_eq!(genre_from_href("../genre/indie/", Some(&base), "/genre/").as_deref(), Some("indie"));
        assert_eq!(genre_from_href("/genre/rock", None, "/genre/").as_deref(), Some("rock"));
        assert_eq!(
            genre_from_href("https://other.test/genre/alternative_rock", None, "/genre/").as_deref(),
            Some("alternative_rock")
        );
        assert_eq!(genre_from_href("/label/5", Some(&base), "/genre/"), None);
        assert_eq!(genre_from_href("/genre/", Some(&base), "/genre/"), None);
    }

    #[test]
    fn test_skip_reason_messages() {
        let empty = SkipReason::EmptyFields { fields: vec!["title", "lyrics"] };
        assert_eq!(empty.to_string(), "empty data in title, lyrics");

        let stale = SkipReason::StaleTitle { title: "Song".to_string() };
        assert_eq!(stale.to_string(), "title has not been changed: Song");
    }
}
