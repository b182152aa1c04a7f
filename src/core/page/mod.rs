//! Page capability used by the extractors and the crawl driver
//!
//! Extraction logic only ever talks to a [`Page`]: it can look elements up,
//! click them and go back. [`DocumentPage`] is the HTML-snapshot backend that
//! turns clicks into navigations through a [`PageSource`].

pub mod document;
pub mod source;

use async_trait::async_trait;
use std::collections::BTreeMap;
use url::Url;

use crate::error::PageError;

pub use document::DocumentPage;
pub use source::{HttpSource, PageSource, SiteSource};

/// A CSS selector, optionally evaluated inside the last element matching `scope`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub selector: String,
    pub scope: Option<String>,
}

impl Query {
    pub fn new<S: Into<String>>(selector: S) -> Self {
        Self {
            selector: selector.into(),
            scope: None,
        }
    }

    pub fn within<S: Into<String>>(mut self, scope: S) -> Self {
        self.scope = Some(scope.into());
        self
    }
}

/// What clicking an element does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickTarget {
    /// Follow a link; the current page is kept for `navigate_back`
    Navigate(String),
    /// Swap the current page's content in place, like a script-driven panel update
    Swap(String),
}

impl ClickTarget {
    pub fn href(&self) -> &str {
        match self {
            ClickTarget::Navigate(href) | ClickTarget::Swap(href) => href,
        }
    }
}

/// Owned snapshot of a matched element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Position among the matches of the query that produced it
    pub index: usize,
    pub text: String,
    pub attrs: BTreeMap<String, String>,
    /// `href`, then `data-href`, then the `href` of the first nested link
    pub target: Option<ClickTarget>,
}

impl Element {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    pub fn trimmed_text(&self) -> &str {
        self.text.trim()
    }

    /// Human readable name for log lines: the `title` attribute, else the text.
    pub fn describe(&self) -> String {
        match self.attr("title") {
            Some(title) if !title.trim().is_empty() => title.trim().to_string(),
            _ => self.trimmed_text().to_string(),
        }
    }
}

#[async_trait]
pub trait Page: Send {
    fn current_url(&self) -> Option<&Url>;

    /// Every element matching the query, in document order.
    fn find_all(&self, query: &Query) -> Result<Vec<Element>, PageError>;

    fn find_last(&self, query: &Query) -> Result<Option<Element>, PageError> {
        Ok(self.find_all(query)?.pop())
    }

    async fn click(&mut self, element: &Element) -> Result<(), PageError>;

    async fn navigate_back(&mut self) -> Result<(), PageError>;

    /// Pages that `navigate_back` can return to.
    fn history_depth(&self) -> usize;

    /// Go back until only `depth` history entries remain.
    async fn navigate_back_to(&mut self, depth: usize) -> Result<(), PageError> {
        while self.history_depth() > depth {
            self.navigate_back().await?;
        }
        Ok(())
    }
}
