//! App review scraper.
//!
//! Pulls reviews page by page from the App Store feeds (XML or JSON) and the
//! Play Store review listing, normalizes them into rows and appends every
//! non-empty page to a CSV file as soon as it has been parsed.

mod error;
mod macros;
pub mod parse;
pub mod process;
pub mod request;
pub mod row;
pub mod sink;
pub mod surface;

pub use error::{Error, Result};
pub use process::{HarvestConfig, HarvestReport, Harvester, PageOutcome};
pub use request::{HttpFetcher, PageFetcher, PageRequest, RawPage};
pub use sink::CsvSink;
pub use surface::{AppStoreJson, AppStoreXml, PlayStore, Surface};

pub const DEFAULT_PAGES: usize = 5;
pub const DEFAULT_OUTPUT: &str = "output.csv";
/// Country code used by the App Store XML feed.
pub const DEFAULT_COUNTRY: &str = "ph";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

pub const APP_STORE_BASE_URL: &str = "https://itunes.apple.com";
pub const PLAY_STORE_BASE_URL: &str = "https://play.google.com";

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));
