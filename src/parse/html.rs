use chrono::NaiveDate;
use regex::Regex;
use scraper::Html;
use tracing::warn;

use crate::row::{ascii_only, PlayStoreReview, Rating};
use crate::{Error, Result};

pub(crate) const SURFACE: &str = "play-html";

/// Every review block starts at this marker.
const BLOCK_MARKER: &str = "author-name";

/// A capture between two markers, with fixed-width boilerplate on both sides
/// of the value (counted in characters).
struct Marker {
    pattern: Regex,
    prefix: usize,
    suffix: usize,
}

impl Marker {
    fn new(pattern: &str, prefix: usize, suffix: usize) -> Result<Self> {
        let pattern = Regex::new(pattern)
            .map_err(|e| Error::Config(format!("bad review marker {pattern:?}: {e}")))?;
        Ok(Marker {
            pattern,
            prefix,
            suffix,
        })
    }

    fn extract<'a>(&self, block: &'a str) -> Option<&'a str> {
        let capture = self.pattern.captures(block)?.get(1)?.as_str();
        trim_chars(capture, self.prefix, self.suffix)
    }
}

/// Drops `prefix` characters from the front and `suffix` from the back.
fn trim_chars(s: &str, prefix: usize, suffix: usize) -> Option<&str> {
    let len = s.chars().count();
    let keep = len.checked_sub(prefix + suffix)?;
    let byte_at = |n: usize| s.char_indices().nth(n).map_or(s.len(), |(i, _)| i);
    Some(&s[byte_at(prefix)..byte_at(prefix + keep)])
}

/// Text content of an HTML fragment, with tags dropped and entities decoded.
fn fragment_text(fragment: &str) -> String {
    Html::parse_fragment(fragment)
        .root_element()
        .text()
        .collect::<String>()
        .trim()
        .to_string()
}

/// Scans the Play Store `getreviews` listing one review block at a time.
pub struct ReviewBlockParser {
    author: Marker,
    date: Marker,
    rating: Regex,
    content: Marker,
}

impl ReviewBlockParser {
    pub fn new() -> Result<Self> {
        let rating = r"Rated (.*?) stars out of five stars";
        Ok(ReviewBlockParser {
            author: Marker::new(r"author-name(.*?)review-date", 9, 44)?,
            date: Marker::new(r"review-date(.*?)reviews-permalink", 8, 39)?,
            rating: Regex::new(rating)
                .map_err(|e| Error::Config(format!("bad review marker {rating:?}: {e}")))?,
            content: Marker::new(r"review-title(.*?)review-link", 26, 24)?,
        })
    }

    /// A response without any review block is an empty page. Blocks missing a
    /// field are dropped on their own, never shifting fields between reviews.
    pub fn parse(&self, body: &str) -> Vec<PlayStoreReview> {
        let mut reviews = Vec::new();
        for (index, block) in blocks(body).enumerate() {
            match self.parse_block(block) {
                Ok(review) => reviews.push(review),
                Err(e) => warn!(block = index, "dropping review block: {e}"),
            }
        }
        reviews
    }

    fn parse_block(&self, block: &str) -> Result<PlayStoreReview> {
        let missing = |field: &str| Error::parse(SURFACE, format!("no {field} in block"));

        let author = self.author.extract(block).ok_or_else(|| missing("author"))?;
        let date = self.date.extract(block).ok_or_else(|| missing("review date"))?;
        let rating = self
            .rating
            .captures(block)
            .and_then(|c| c.get(1))
            .ok_or_else(|| missing("rating"))?
            .as_str();
        let content = self.content.extract(block).ok_or_else(|| missing("content"))?;

        let review_date = parse_date(date.trim())
            .ok_or_else(|| Error::parse(SURFACE, format!("unreadable review date {date:?}")))?;
        let rating = Rating::from_text(rating)
            .ok_or_else(|| Error::parse(SURFACE, format!("invalid rating {rating:?}")))?;
        let content = ascii_only(content).replace("\\\"", "\"");

        Ok(PlayStoreReview {
            author: fragment_text(author),
            review_date,
            rating,
            content: fragment_text(&content),
        })
    }
}

/// Splits the body at every block marker. Text before the first marker is not a review.
fn blocks(body: &str) -> impl Iterator<Item = &str> {
    let starts: Vec<usize> = body.match_indices(BLOCK_MARKER).map(|(i, _)| i).collect();
    let ends = starts
        .iter()
        .skip(1)
        .copied()
        .chain(std::iter::once(body.len()))
        .collect::<Vec<_>>();
    starts
        .into_iter()
        .zip(ends)
        .map(move |(start, end)| &body[start..end])
}

fn parse_date(date: &str) -> Option<NaiveDate> {
    ["%B %d, %Y", "%d %B %Y", "%Y-%m-%d"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(date, fmt).ok())
}
