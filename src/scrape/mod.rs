//! Scraping the transaction history table.
//!
//! `markup` says where things are on the page, `table` turns one page of
//! markup into transactions, and `extract` walks the pages.

mod extract;
pub mod markup;
pub mod table;

pub use extract::{Extraction, TableExtractor};
pub use markup::{LoginMarkup, PortalMarkup, TableLayout};
