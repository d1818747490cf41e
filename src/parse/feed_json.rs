use chrono::DateTime;
use serde::Deserialize;
use serde_json::Value;

use crate::row::{count_from_json, double_quotes, normalize_quotes, AppStoreReview, Rating};
use crate::{Error, Result};

pub(crate) const SURFACE: &str = "feed-json";

#[derive(Debug, Deserialize)]
struct Document {
    feed: Feed,
}

#[derive(Debug, Deserialize)]
struct Feed {
    /// Absent past the last page.
    entry: Option<OneOrMany<Entry>>,
}

/// The feed collapses a single entry into a bare object.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum OneOrMany<T> {
    Many(Vec<T>),
    One(T),
}

impl<T> OneOrMany<T> {
    fn into_vec(self) -> Vec<T> {
        match self {
            OneOrMany::Many(v) => v,
            OneOrMany::One(t) => vec![t],
        }
    }
}

#[derive(Debug, Deserialize)]
struct Label {
    label: Value,
}

impl Label {
    fn text(&self) -> Option<String> {
        match &self.label {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct Author {
    name: Option<Label>,
    uri: Option<Label>,
}

#[derive(Debug, Deserialize)]
struct Entry {
    /// Only the app metadata entry has a name.
    #[serde(rename = "im:name")]
    name: Option<Value>,
    id: Option<Label>,
    title: Option<Label>,
    updated: Option<Label>,
    author: Option<Author>,
    #[serde(rename = "im:version")]
    version: Option<Label>,
    #[serde(rename = "im:rating")]
    rating: Option<Label>,
    content: Option<Label>,
    #[serde(rename = "im:voteCount")]
    vote_count: Option<Label>,
}

/// Parses an App Store customer reviews JSON feed.
///
/// A feed without `entry` is the last page and yields no rows. With
/// `escape_quotes`, `"` in titles and review text is doubled.
pub fn parse_feed(body: &str, escape_quotes: bool) -> Result<Vec<AppStoreReview>> {
    let doc: Document =
        serde_json::from_str(body).map_err(|e| Error::parse(SURFACE, e.to_string()))?;

    let Some(entries) = doc.feed.entry else {
        return Ok(Vec::new());
    };

    let text = |s: &str| {
        let s = normalize_quotes(s);
        if escape_quotes {
            double_quotes(&s)
        } else {
            s
        }
    };

    entries
        .into_vec()
        .into_iter()
        .enumerate()
        .filter(|(_, entry)| entry.name.is_none())
        .map(|(index, entry)| -> Result<AppStoreReview> {
            let (author_name, author_uri) = match entry.author {
                Some(author) => (author.name, author.uri),
                None => (None, None),
            };

            let rating = require(&entry.rating, "im:rating", index)?;
            let rating = Rating::from_json(&rating.label).ok_or_else(|| {
                Error::parse(
                    SURFACE,
                    format!("entry {index} has an invalid rating {}", rating.label),
                )
            })?;
            let vote_count = require(&entry.vote_count, "im:voteCount", index)?;
            let vote_count = count_from_json(&vote_count.label).ok_or_else(|| {
                Error::parse(
                    SURFACE,
                    format!(
                        "entry {index} has a non-numeric `im:voteCount` {}",
                        vote_count.label
                    ),
                )
            })?;

            // Optional: older feeds omit it.
            let review_date = entry
                .updated
                .as_ref()
                .and_then(Label::text)
                .and_then(|s| DateTime::parse_from_rfc3339(s.trim()).ok());

            Ok(AppStoreReview {
                review_id: Some(require_text(&entry.id, "id", index)?),
                title: text(&require_text(&entry.title, "title", index)?),
                review_date,
                author: require_text(&author_name, "author/name", index)?,
                author_url: require_text(&author_uri, "author/uri", index)?,
                version: require_text(&entry.version, "im:version", index)?,
                rating,
                review: text(&require_text(&entry.content, "content", index)?),
                vote_count,
                vote_sum: None,
            })
        })
        .collect()
}

fn require<'a>(label: &'a Option<Label>, field: &str, index: usize) -> Result<&'a Label> {
    label
        .as_ref()
        .ok_or_else(|| Error::missing(SURFACE, field, index))
}

fn require_text(label: &Option<Label>, field: &str, index: usize) -> Result<String> {
    require(label, field, index)?
        .text()
        .ok_or_else(|| Error::missing(SURFACE, field, index))
}
