use chrono::DateTime;
use quick_xml::events::Event;
use quick_xml::Reader;

use crate::row::{normalize_quotes, AppStoreReview, Rating};
use crate::{Error, Result};

pub(crate) const SURFACE: &str = "feed-xml";

/// Parses an App Store customer reviews feed (Atom + `im:` extensions).
///
/// The first `<entry>` describes the app itself and is skipped. Every other
/// entry must carry all review fields, otherwise the whole page fails.
pub fn parse_feed(xml: &str) -> Result<Vec<AppStoreReview>> {
    read_entries(xml)?
        .into_iter()
        .enumerate()
        .skip(1)
        .map(|(index, entry)| entry.into_review(index))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Title,
    Updated,
    AuthorName,
    AuthorUri,
    Version,
    Rating,
    Content,
    VoteCount,
    VoteSum,
}

impl Field {
    /// Maps an element path relative to `<entry>` to the field it fills.
    fn locate(path: &[Vec<u8>]) -> Option<Field> {
        match path {
            [leaf] => match leaf.as_slice() {
                b"title" => Some(Field::Title),
                b"updated" => Some(Field::Updated),
                b"content" => Some(Field::Content),
                b"im:version" => Some(Field::Version),
                b"im:rating" => Some(Field::Rating),
                b"im:voteCount" => Some(Field::VoteCount),
                b"im:voteSum" => Some(Field::VoteSum),
                _ => None,
            },
            [parent, leaf] if parent.as_slice() == b"author" => match leaf.as_slice() {
                b"name" => Some(Field::AuthorName),
                b"uri" => Some(Field::AuthorUri),
                _ => None,
            },
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
struct EntryFields {
    title: Option<String>,
    updated: Option<String>,
    author_name: Option<String>,
    author_uri: Option<String>,
    version: Option<String>,
    rating: Option<String>,
    content: Option<String>,
    vote_count: Option<String>,
    vote_sum: Option<String>,
    content_blocks: usize,
}

impl EntryFields {
    fn slot(&mut self, field: Field) -> &mut Option<String> {
        match field {
            Field::Title => &mut self.title,
            Field::Updated => &mut self.updated,
            Field::AuthorName => &mut self.author_name,
            Field::AuthorUri => &mut self.author_uri,
            Field::Version => &mut self.version,
            Field::Rating => &mut self.rating,
            Field::Content => &mut self.content,
            Field::VoteCount => &mut self.vote_count,
            Field::VoteSum => &mut self.vote_sum,
        }
    }

    /// Marks `field` as present. Returns the field text should be written to,
    /// `None` for any `<content>` after the first one.
    fn open(&mut self, field: Field) -> Option<Field> {
        if field == Field::Content {
            self.content_blocks += 1;
            if self.content_blocks > 1 {
                return None;
            }
        }
        self.slot(field).get_or_insert_with(String::new);
        Some(field)
    }

    fn push(&mut self, field: Field, text: &str) {
        self.slot(field).get_or_insert_with(String::new).push_str(text);
    }

    fn into_review(self, index: usize) -> Result<AppStoreReview> {
        let updated = require(self.updated, "updated", index)?;
        let review_date = DateTime::parse_from_rfc3339(updated.trim()).map_err(|e| {
            Error::parse(
                SURFACE,
                format!("entry {index} has an invalid `updated` value {updated:?}: {e}"),
            )
        })?;

        let rating = require(self.rating, "im:rating", index)?;
        let rating = Rating::from_text(&rating).ok_or_else(|| {
            Error::parse(SURFACE, format!("entry {index} has an invalid rating {rating:?}"))
        })?;

        Ok(AppStoreReview {
            review_id: None,
            title: normalize_quotes(&require(self.title, "title", index)?),
            review_date: Some(review_date),
            author: require(self.author_name, "author/name", index)?,
            author_url: require(self.author_uri, "author/uri", index)?,
            version: require(self.version, "im:version", index)?,
            rating,
            review: normalize_quotes(&require(self.content, "content", index)?),
            vote_count: count(self.vote_count, "im:voteCount", index)?,
            vote_sum: Some(count(self.vote_sum, "im:voteSum", index)?),
        })
    }
}

fn require(value: Option<String>, field: &str, index: usize) -> Result<String> {
    value.ok_or_else(|| Error::missing(SURFACE, field, index))
}

fn count(value: Option<String>, field: &str, index: usize) -> Result<u32> {
    let value = require(value, field, index)?;
    value.trim().parse().map_err(|_| {
        Error::parse(
            SURFACE,
            format!("entry {index} has a non-numeric `{field}` value {value:?}"),
        )
    })
}

/// Collects the raw text of every `<entry>`, in document order.
fn read_entries(xml: &str) -> Result<Vec<EntryFields>> {
    let mut reader = Reader::from_str(xml);
    let mut entries = Vec::new();

    let mut current: Option<EntryFields> = None;
    // Element names below the current `<entry>`.
    let mut path: Vec<Vec<u8>> = Vec::new();
    let mut field: Option<Field> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = e.name().as_ref().to_vec();
                match current.as_mut() {
                    None if name == b"entry" => {
                        current = Some(EntryFields::default());
                        path.clear();
                    }
                    None => {}
                    Some(entry) => {
                        path.push(name);
                        field = Field::locate(&path).and_then(|f| entry.open(f));
                    }
                }
            }
            Ok(Event::Empty(e)) => {
                if let Some(entry) = current.as_mut() {
                    path.push(e.name().as_ref().to_vec());
                    if let Some(f) = Field::locate(&path) {
                        entry.open(f);
                    }
                    path.pop();
                }
            }
            Ok(Event::Text(t)) => {
                if let (Some(entry), Some(f)) = (current.as_mut(), field) {
                    let text = t.unescape().map_err(|e| Error::parse(SURFACE, e.to_string()))?;
                    entry.push(f, &text);
                }
            }
            Ok(Event::CData(c)) => {
                if let (Some(entry), Some(f)) = (current.as_mut(), field) {
                    entry.push(f, &String::from_utf8_lossy(&c.into_inner()));
                }
            }
            Ok(Event::End(_)) => {
                field = None;
                if current.is_some() && path.pop().is_none() {
                    // Closing `</entry>`.
                    entries.extend(current.take());
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::parse(
                    SURFACE,
                    format!("malformed XML at byte {}: {e}", reader.buffer_position()),
                ))
            }
            _ => {}
        }
    }
    Ok(entries)
}
