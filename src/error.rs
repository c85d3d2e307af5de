//! Error taxonomy for scraping and export.
//!
//! Every variant is fatal to the target (account or card) being exported when
//! it reaches the session driver. Absence that is a normal signal (no loading
//! overlay, no next page) is modelled as `Option::None` and never becomes a
//! `NotFound`.

use std::time::Duration;

/// Failure while driving the portal or writing an export.
#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    /// A required element was not present on the page.
    #[error("element not found: {0}")]
    NotFound(String),

    /// A bounded wait expired before its condition held.
    #[error("timed out after {}ms waiting for {}", .after.as_millis(), .what)]
    Timeout { what: String, after: Duration },

    /// A click landed on another element covering the target.
    #[error("click on {0} was intercepted by another element")]
    Intercepted(String),

    /// Scraped text could not be turned into a transaction.
    #[error("parse error: {0}")]
    Parse(String),

    /// Writing the export file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The automation driver reported a failure.
    #[error("browser error: {0}")]
    Browser(String),

    /// The user stopped the run.
    #[error("aborted: {0}")]
    Aborted(String),
}

impl ScrapeError {
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }

    pub fn browser(err: impl std::fmt::Display) -> Self {
        Self::Browser(err.to_string())
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

pub type Result<T, E = ScrapeError> = std::result::Result<T, E>;
