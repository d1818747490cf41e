//! The three review surfaces and how each one is requested and parsed.

use serde::Serialize;

use crate::parse::{feed_json, feed_xml, ReviewBlockParser};
use crate::request::{PageRequest, RawPage};
use crate::row::{
    AppStoreReview, PlayStoreReview, FEED_JSON_COLUMNS, FEED_XML_COLUMNS, PLAY_COLUMNS,
};
use crate::{Result, APP_STORE_BASE_URL, DEFAULT_COUNTRY, PLAY_STORE_BASE_URL};

/// One upstream review listing: its request shape, page numbering and parser.
pub trait Surface: Send + Sync + 'static {
    type Row: Serialize + Clone + Send + 'static;

    fn name(&self) -> &'static str;

    /// Output columns, in the order rows serialize their fields.
    fn columns(&self) -> &'static [&'static str];

    /// Upstream number of the first page (0 or 1).
    fn first_page(&self) -> usize;

    fn request(&self, target: &str, page: usize) -> PageRequest;

    fn parse(&self, page: &RawPage) -> Result<Vec<Self::Row>>;
}

/// App Store customer reviews, Atom/XML flavour. Takes a country code.
#[derive(Debug, Clone)]
pub struct AppStoreXml {
    base_url: String,
    country: String,
}

impl AppStoreXml {
    pub fn new(country: impl Into<String>) -> Self {
        AppStoreXml {
            base_url: APP_STORE_BASE_URL.to_string(),
            country: country.into(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

impl Default for AppStoreXml {
    fn default() -> Self {
        AppStoreXml::new(DEFAULT_COUNTRY)
    }
}

impl Surface for AppStoreXml {
    type Row = AppStoreReview;

    fn name(&self) -> &'static str {
        feed_xml::SURFACE
    }

    fn columns(&self) -> &'static [&'static str] {
        FEED_XML_COLUMNS
    }

    fn first_page(&self) -> usize {
        1
    }

    fn request(&self, target: &str, page: usize) -> PageRequest {
        PageRequest::get(format!(
            "{}/rss/customerreviews/id={target}/page={page}/sortby=mostrecent/xml?country={}",
            self.base_url, self.country
        ))
    }

    fn parse(&self, page: &RawPage) -> Result<Vec<AppStoreReview>> {
        feed_xml::parse_feed(&page.body)
    }
}

/// App Store customer reviews, JSON flavour. Has no country parameter.
#[derive(Debug, Clone)]
pub struct AppStoreJson {
    base_url: String,
    escape_quotes: bool,
}

impl AppStoreJson {
    pub fn new() -> Self {
        AppStoreJson {
            base_url: APP_STORE_BASE_URL.to_string(),
            escape_quotes: false,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Double `"` in titles and review text while parsing.
    pub fn with_quote_doubling(mut self, escape_quotes: bool) -> Self {
        self.escape_quotes = escape_quotes;
        self
    }
}

impl Default for AppStoreJson {
    fn default() -> Self {
        AppStoreJson::new()
    }
}

impl Surface for AppStoreJson {
    type Row = AppStoreReview;

    fn name(&self) -> &'static str {
        feed_json::SURFACE
    }

    fn columns(&self) -> &'static [&'static str] {
        FEED_JSON_COLUMNS
    }

    fn first_page(&self) -> usize {
        1
    }

    fn request(&self, target: &str, page: usize) -> PageRequest {
        PageRequest::get(format!(
            "{}/rss/customerreviews/id={target}/page={page}/sortby=mostrecent/json",
            self.base_url
        ))
    }

    fn parse(&self, page: &RawPage) -> Result<Vec<AppStoreReview>> {
        feed_json::parse_feed(&page.body, self.escape_quotes)
    }
}

/// Play Store review listing, scraped from the `getreviews` HTML fragments.
pub struct PlayStore {
    base_url: String,
    language: String,
    parser: ReviewBlockParser,
}

impl PlayStore {
    const REVIEW_TYPE: u8 = 0;
    const SORT_NEWEST: u8 = 0;

    pub fn new() -> Result<Self> {
        Ok(PlayStore {
            base_url: PLAY_STORE_BASE_URL.to_string(),
            language: "en".to_string(),
            parser: ReviewBlockParser::new()?,
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }
}

impl Surface for PlayStore {
    type Row = PlayStoreReview;

    fn name(&self) -> &'static str {
        crate::parse::html::SURFACE
    }

    fn columns(&self) -> &'static [&'static str] {
        PLAY_COLUMNS
    }

    fn first_page(&self) -> usize {
        0
    }

    fn request(&self, target: &str, page: usize) -> PageRequest {
        let form = [
            ("reviewType", Self::REVIEW_TYPE.to_string()),
            ("pageNum", page.to_string()),
            ("id", target.to_string()),
            ("reviewSortOrder", Self::SORT_NEWEST.to_string()),
            ("xhr", "1".to_string()),
            ("hl", self.language.clone()),
        ];
        PageRequest::post_form(
            format!("{}/store/getreviews?authuser=0", self.base_url),
            form.into_iter().map(|(k, v)| (k.to_string(), v)).collect(),
        )
    }

    fn parse(&self, page: &RawPage) -> Result<Vec<PlayStoreReview>> {
        Ok(self.parser.parse(&page.body))
    }
}
