//! Song records and their rendering as SQL insert statements
//!
//! Fields are kept unescaped on the record. Escaping only happens in
//! [`SongRecord::to_insert_sql`], which produces the single-line statement
//! format consumed by the `songs` table importer.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

static CYRILLIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[\u{0400}-\u{052F}]").expect("valid cyrillic pattern"));

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Lang {
    En,
    Ru,
}

impl Lang {
    /// Infer the language of a lyric text. Any Cyrillic character makes it `ru`.
    pub fn detect(lyrics: &str) -> Self {
        if CYRILLIC.is_match(lyrics) {
            Lang::Ru
        } else {
            Lang::En
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Lang::En => "en",
            Lang::Ru => "ru",
        }
    }
}

impl fmt::Display for Lang {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SongRecord {
    pub artist: String,
    pub title: String,
    pub lyrics: String,
    pub lang: Lang,
    pub genre: String,
}

impl SongRecord {
    pub fn new(artist: String, title: String, lyrics: String, genre: String) -> Self {
        let lang = Lang::detect(&lyrics);
        Self {
            artist,
            title,
            lyrics,
            lang,
            genre,
        }
    }

    /// Names of the required fields that are empty after trimming.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.title.trim().is_empty() {
            missing.push("title");
        }
        if self.artist.trim().is_empty() {
            missing.push("artist");
        }
        if self.lyrics.trim().is_empty() {
            missing.push("lyrics");
        }
        missing
    }

    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }

    pub fn to_insert_sql(&self) -> String {
        format!(
            "INSERT INTO `songs` (`artist`, `title`, `lyrics`, `lang`, `genre`) VALUES ('{}', '{}', '{}', '{}', '{}');",
            escape_sql_text(&self.artist),
            escape_sql_text(&self.title),
            escape_sql_text(&self.lyrics),
            self.lang,
            escape_sql_text(&self.genre),
        )
    }
}

/// Escape text for a single-quoted SQL literal on one line.
///
/// Every line break (`\r\n`, `\r`, `\n`) becomes the two characters `\n`,
/// quotes become `\'` and backslashes become `\\`.
pub fn escape_sql_text(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len() + 8);
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\\' => escaped.push_str("\\\\"),
            '\'' => escaped.push_str("\\'"),
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                escaped.push_str("\\n");
            }
            '\n' => escaped.push_str("\\n"),
            _ => escaped.push(c),
        }
    }

    escaped
}

/// Reverse of [`escape_sql_text`]. Line breaks come back as `\n`.
pub fn unescape_sql_text(escaped: &str) -> String {
    let mut text = String::with_capacity(escaped.len());
    let mut chars = escaped.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            text.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => text.push('\n'),
            Some('\'') => text.push('\''),
            Some('\\') => text.push('\\'),
            Some(other) => {
                text.push('\\');
                text.push(other);
            }
            None => text.push('\\'),
        }
    }

    text
}

pub fn normalize_line_breaks(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\r', "\n")
}
