//! Core functionality modules
//!
//! - `song`: song records, escaping and SQL rendering
//! - `page`: the page capability and its HTML backend
//! - `extract`: reading song metadata from a page
//! - `schedule`: per-artist action plans on an accumulating delay cursor
//! - `driver`: the artist crawl event loop
//! - `storage`: persisted key-value storage for crawl progress

pub mod driver;
pub mod extract;
pub mod page;
pub mod schedule;
pub mod song;
pub mod storage;

pub use song::{Lang, SongRecord};
