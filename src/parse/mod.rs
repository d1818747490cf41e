//! Parsers turning one raw page into zero or more rows.
//!
//! All parsers are pure functions of the page body: parsing the same body
//! twice yields the same rows.

pub mod feed_json;
pub mod feed_xml;
pub mod html;

pub use html::ReviewBlockParser;
