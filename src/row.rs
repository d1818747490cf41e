//! Normalized review rows, one shape per store.
//!
//! Rows are built once by a surface parser and never mutated afterwards. Their
//! serialized field order is the column order of the output file, so every
//! `*_COLUMNS` list below must follow the struct it describes.

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::Serialize;

/// Columns written for the App Store syndication (XML) feed.
pub const FEED_XML_COLUMNS: &[&str] = &[
    "title",
    "review_date",
    "author",
    "author_url",
    "version",
    "rating",
    "review",
    "vote_count",
    "vote_sum",
];

/// Columns written for the App Store JSON feed.
pub const FEED_JSON_COLUMNS: &[&str] = &[
    "review_id",
    "title",
    "review_date",
    "author",
    "author_url",
    "version",
    "rating",
    "review",
    "vote_count",
];

/// Columns written for the Play Store listing.
pub const PLAY_COLUMNS: &[&str] = &["author", "review_date", "rating", "content"];

/// A star rating, always within 1..=5.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Rating(u8);

impl Rating {
    pub fn new(stars: u8) -> Option<Self> {
        (1..=5).contains(&stars).then_some(Rating(stars))
    }

    pub fn from_text(text: &str) -> Option<Self> {
        text.trim().parse::<u8>().ok().and_then(Rating::new)
    }

    /// Accepts either a JSON number or a numeric string.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        count_from_json(value)
            .and_then(|n| u8::try_from(n).ok())
            .and_then(Rating::new)
    }

    pub fn stars(self) -> u8 {
        self.0
    }
}

/// Non-negative integer carried either as a JSON number or a numeric string.
pub fn count_from_json(value: &serde_json::Value) -> Option<u32> {
    match value {
        serde_json::Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppStoreReview {
    /// Only the JSON feed carries an identifier.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review_id: Option<String>,
    pub title: String,
    pub review_date: Option<DateTime<FixedOffset>>,
    pub author: String,
    pub author_url: String,
    pub version: String,
    pub rating: Rating,
    pub review: String,
    pub vote_count: u32,
    /// Only the XML feed carries a vote sum.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vote_sum: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayStoreReview {
    pub author: String,
    pub review_date: NaiveDate,
    pub rating: Rating,
    pub content: String,
}

/// Replaces typographic quotes and apostrophes with their ASCII forms.
pub fn normalize_quotes(text: &str) -> String {
    text.replace(['\u{2019}', '\u{2018}'], "'")
        .replace(['\u{201C}', '\u{201D}'], "\"")
}

/// Doubles every `"` the way delimited files escape quotes inside a quoted field.
pub fn double_quotes(text: &str) -> String {
    text.replace('"', "\"\"")
}

/// Drops every non-ASCII character.
pub fn ascii_only(text: &str) -> String {
    text.chars().filter(char::is_ascii).collect()
}
