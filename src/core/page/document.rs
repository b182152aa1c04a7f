use async_trait::async_trait;
use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;
use tracing::debug;
use url::Url;

use super::{ClickTarget, Element, Page, PageSource, Query};
use crate::error::PageError;

static LINK: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("a[href]").expect("valid link selector"));

struct LoadedPage {
    url: Url,
    body: String,
}

/// Static HTML backend for [`Page`].
///
/// Clicking a link loads its target through the source and pushes the
/// current page onto a history stack; clicking a `data-href` element swaps
/// the content in place. The body is kept as text and parsed per query since
/// `scraper::Html` is not `Send`.
pub struct DocumentPage<S: PageSource> {
    source: S,
    current: Option<LoadedPage>,
    history: Vec<LoadedPage>,
}

impl<S: PageSource> DocumentPage<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            current: None,
            history: Vec::new(),
        }
    }

    pub async fn open(source: S, url: Url) -> Result<Self, PageError> {
        let mut page = Self::new(source);
        page.goto(url).await?;
        Ok(page)
    }

    pub async fn goto(&mut self, url: Url) -> Result<(), PageError> {
        let body = self.source.load(&url).await?;
        debug!("Loaded {} ({} bytes)", url, body.len());

        if let Some(previous) = self.current.replace(LoadedPage { url, body }) {
            self.history.push(previous);
        }
        Ok(())
    }

    /// Replace the current page without adding a history entry.
    pub async fn swap(&mut self, url: Url) -> Result<(), PageError> {
        let body = self.source.load(&url).await?;
        debug!("Swapped in {} ({} bytes)", url, body.len());
        self.current = Some(LoadedPage { url, body });
        Ok(())
    }

}

pub fn parse_selector(selector: &str) -> Result<Selector, PageError> {
    Selector::parse(selector).map_err(|e| PageError::InvalidSelector {
        selector: selector.to_string(),
        reason: format!("{:?}", e),
    })
}

fn snapshot(index: usize, element: ElementRef<'_>) -> Element {
    let value = element.value();
    let attrs = value
        .attrs()
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect();

    let target = if let Some(href) = value.attr("href") {
        Some(ClickTarget::Navigate(href.to_string()))
    } else if let Some(href) = value.attr("data-href") {
        Some(ClickTarget::Swap(href.to_string()))
    } else {
        element
            .select(&LINK)
            .next()
            .and_then(|link| link.value().attr("href"))
            .map(|href| ClickTarget::Navigate(href.to_string()))
    };

    Element {
        index,
        text: element.text().collect::<String>(),
        attrs,
        target,
    }
}

#[async_trait]
impl<S: PageSource> Page for DocumentPage<S> {
    fn current_url(&self) -> Option<&Url> {
        self.current.as_ref().map(|page| &page.url)
    }

    fn find_all(&self, query: &Query) -> Result<Vec<Element>, PageError> {
        let Some(page) = &self.current else {
            return Ok(Vec::new());
        };

        let selector = parse_selector(&query.selector)?;
        let document = Html::parse_document(&page.body);

        let elements = match &query.scope {
            Some(scope) => {
                let scope_selector = parse_selector(scope)?;
                match document.select(&scope_selector).last() {
                    Some(root) => root
                        .select(&selector)
                        .enumerate()
                        .map(|(index, element)| snapshot(index, element))
                        .collect(),
                    None => Vec::new(),
                }
            }
            None => document
                .select(&selector)
                .enumerate()
                .map(|(index, element)| snapshot(index, element))
                .collect(),
        };

        Ok(elements)
    }

    async fn click(&mut self, element: &Element) -> Result<(), PageError> {
        let target = element.target.as_ref().ok_or_else(|| PageError::NotClickable {
            description: element.describe(),
        })?;

        let url = match self.current_url() {
            Some(base) => base.join(target.href())?,
            None => Url::parse(target.href())?,
        };

        match target {
            ClickTarget::Navigate(_) => self.goto(url).await,
            ClickTarget::Swap(_) => self.swap(url).await,
        }
    }

    async fn navigate_back(&mut self) -> Result<(), PageError> {
        let previous = self.history.pop().ok_or(PageError::NoHistory)?;
        debug!("Navigating back to {}", previous.url);
        self.current = Some(previous);
        Ok(())
    }

    fn history_depth(&self) -> usize {
        self.history.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::page::source::MemorySource;

    const LISTING: &str = r#"
        <div class="page-genre__artists">
            <div class="artist__name"><a href="/artist/1" title="First">First</a></div>
            <div class="artist__name"><a href="/artist/2" title="Second">Second</a></div>
        </div>
    "#;

    const ARTIST: &str = r#"
        <div class="page-artist__tracks_top">
            <div class="track" data-href="/track/10">One</div>
            <div class="track"><span><a href="/track/11">Two</a></span></div>
            <div class="track">Dead</div>
        </div>
        <div class="sidebar-track"><span class="sidebar-track__title"><a>Old</a></span></div>
        <div class="sidebar-track"><span class="sidebar-track__title"><a>New</a></span></div>
    "#;

    async fn site() -> DocumentPage<MemorySource> {
        let source = MemorySource::new()
            .with_page("http://site.test/genre/rock", LISTING)
            .with_page("http://site.test/artist/1", ARTIST);
        DocumentPage::open(source, Url::parse("http://site.test/genre/rock").unwrap())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_find_all_in_document_order() {
        let page = site().await;
        let artists = page
            .find_all(&Query::new(".page-genre__artists .artist__name a"))
            .unwrap();

        assert_eq!(artists.len(), 2);
        assert_eq!(artists[0].describe(), "First");
        assert_eq!(artists[1].index, 1);
        assert_eq!(artists[1].target, Some(ClickTarget::Navigate("/artist/2".to_string())));
    }

    #[tokio::test]
    async fn test_click_and_navigate_back() {
        let mut page = site().await;
        let first = page
            .find_last(&Query::new("a[title=First]"))
            .unwrap()
            .unwrap();

        page.click(&first).await.unwrap();
        assert_eq!(page.current_url().unwrap().path(), "/artist/1");
        assert_eq!(page.history_depth(), 1);

        page.navigate_back().await.unwrap();
        assert_eq!(page.current_url().unwrap().path(), "/genre/rock");
        assert!(matches!(page.navigate_back().await, Err(PageError::NoHistory)));
    }

    #[tokio::test]
    async fn test_click_targets_from_data_href_and_nested_links() {
        let mut page = site().await;
        let first = page.find_last(&Query::new("a[title=First]")).unwrap().unwrap();
        page.click(&first).await.unwrap();

        let tracks = page.find_all(&Query::new(".page-artist__tracks_top .track")).unwrap();
        assert_eq!(tracks[0].target, Some(ClickTarget::Swap("/track/10".to_string())));
        assert_eq!(tracks[1].target, Some(ClickTarget::Navigate("/track/11".to_string())));
        assert_eq!(tracks[2].target, None);

        let err = page.click(&tracks[2]).await.unwrap_err();
        assert!(matches!(err, PageError::NotClickable { .. }));
    }

    #[tokio::test]
    async fn test_swap_keeps_history() {
        let source = MemorySource::new()
            .with_page("http://site.test/genre/rock", LISTING)
            .with_page("http://site.test/artist/1", ARTIST)
            .with_page("http://site.test/track/10", "<p>track ten</p>");
        let mut page = DocumentPage::open(source, Url::parse("http://site.test/genre/rock").unwrap())
            .await
            .unwrap();

        let first = page.find_last(&Query::new("a[title=First]")).unwrap().unwrap();
        page.click(&first).await.unwrap();
        let tracks = page.find_all(&Query::new(".track")).unwrap();
        page.click(&tracks[0]).await.unwrap();

        assert_eq!(page.current_url().unwrap().path(), "/track/10");
        assert_eq!(page.history_depth(), 1);

        page.navigate_back().await.unwrap();
        assert_eq!(page.current_url().unwrap().path(), "/genre/rock");
    }

    #[tokio::test]
    async fn test_navigate_back_to_checkpoint() {
        let source = MemorySource::new()
            .with_page("http://site.test/genre/rock", LISTING)
            .with_page("http://site.test/artist/1", ARTIST)
            .with_page("http://site.test/track/11", "<p>track eleven</p>");
        let mut page = DocumentPage::open(source, Url::parse("http://site.test/genre/rock").unwrap())
            .await
            .unwrap();

        let checkpoint = page.history_depth();
        let first = page.find_last(&Query::new("a[title=First]")).unwrap().unwrap();
        page.click(&first).await.unwrap();
        let tracks = page.find_all(&Query::new(".track")).unwrap();
        page.click(&tracks[1]).await.unwrap();
        assert_eq!(page.history_depth(), 2);

        page.navigate_back_to(checkpoint).await.unwrap();
        assert_eq!(page.current_url().unwrap().path(), "/genre/rock");
        assert_eq!(page.history_depth(), 0);

        // already there
        page.navigate_back_to(checkpoint).await.unwrap();
        assert_eq!(page.current_url().unwrap().path(), "/genre/rock");
    }

    #[tokio::test]
    async fn test_scoped_query_uses_last_scope() {
        let mut page = site().await;
        let first = page.find_last(&Query::new("a[title=First]")).unwrap().unwrap();
        page.click(&first).await.unwrap();

        let title = page
            .find_last(&Query::new(".sidebar-track__title a").within(".sidebar-track"))
            .unwrap()
            .unwrap();
        assert_eq!(title.trimmed_text(), "New");

        let missing = page
            .find_all(&Query::new(".sidebar-track__title a").within(".no-such-panel"))
            .unwrap();
        assert!(missing.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_selector_is_reported() {
        let page = site().await;
        let err = page.find_all(&Query::new("div[")).unwrap_err();
        assert!(matches!(err, PageError::InvalidSelector { .. }));
    }

    #[test]
    fn test_empty_page_has_no_elements() {
        let page = DocumentPage::new(MemorySource::new());
        assert!(page.current_url().is_none());
        assert!(page.find_all(&Query::new("a")).unwrap().is_empty());
    }
}
