//! Browser automation seam.
//!
//! The portal flow only needs a small remote-control surface: find elements,
//! check visibility, click, type, and read markup. `Driver` captures that so
//! the scraping logic can run against Chrome in production and against a
//! scripted portal in tests.

#[cfg(feature = "chrome")]
mod chrome;
mod wait;

#[cfg(feature = "chrome")]
pub use chrome::{find_chrome, ChromeDriver, ChromeOptions};
pub use wait::Waiter;

use async_trait::async_trait;
use tracing::debug;

use crate::error::{Result, ScrapeError};

/// Element lookup strategy.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Locator {
    /// Matches the `id` attribute exactly.
    Id(String),
    /// Matches the `name` attribute exactly.
    Name(String),
    /// Matches one entry of the `class` attribute.
    Class(String),
    Css(String),
    XPath(String),
}

impl Locator {
    pub fn id(v: impl Into<String>) -> Self {
        Self::Id(v.into())
    }

    pub fn name(v: impl Into<String>) -> Self {
        Self::Name(v.into())
    }

    pub fn class(v: impl Into<String>) -> Self {
        Self::Class(v.into())
    }

    pub fn css(v: impl Into<String>) -> Self {
        Self::Css(v.into())
    }

    pub fn xpath(v: impl Into<String>) -> Self {
        Self::XPath(v.into())
    }

    /// CSS form of this locator, or `None` for XPath.
    pub fn to_css(&self) -> Option<String> {
        match self {
            Locator::Id(id) => Some(format!("[id=\"{}\"]", escape_attr(id))),
            Locator::Name(name) => Some(format!("[name=\"{}\"]", escape_attr(name))),
            Locator::Class(class) => Some(format!("[class~=\"{}\"]", escape_attr(class))),
            Locator::Css(css) => Some(css.clone()),
            Locator::XPath(_) => None,
        }
    }
}

impl std::fmt::Display for Locator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Locator::Id(v) => write!(f, "id={v}"),
            Locator::Name(v) => write!(f, "name={v}"),
            Locator::Class(v) => write!(f, "class={v}"),
            Locator::Css(v) => write!(f, "css={v}"),
            Locator::XPath(v) => write!(f, "xpath={v}"),
        }
    }
}

fn escape_attr(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Quote a string for use as an XPath literal.
///
/// XPath 1.0 has no escape syntax, so values containing both quote kinds are
/// built with `concat()`.
pub fn xpath_literal(value: &str) -> String {
    if !value.contains('\'') {
        format!("'{value}'")
    } else if !value.contains('"') {
        format!("\"{value}\"")
    } else {
        let parts: Vec<String> = value
            .split('\'')
            .map(|p| format!("'{p}'"))
            .collect();
        format!("concat({})", parts.join(", \"'\", "))
    }
}

/// Remote control over a single browser page.
///
/// Lookups return `Ok(None)` / an empty list when nothing matches; `Err` is
/// reserved for failures of the driver itself.
#[async_trait]
pub trait Driver: Send + Sync {
    type Element: Send + Sync;

    /// Navigate the page to `url`.
    async fn goto(&self, url: &str) -> Result<()>;

    /// All elements matching `locator`, in document order.
    async fn find_all(&self, locator: &Locator) -> Result<Vec<Self::Element>>;

    /// The first element matching `locator`, if any.
    async fn find(&self, locator: &Locator) -> Result<Option<Self::Element>> {
        Ok(self.find_all(locator).await?.into_iter().next())
    }

    /// Whether the element is rendered and visible.
    async fn is_displayed(&self, element: &Self::Element) -> Result<bool>;

    /// Click the element.
    ///
    /// Returns `ScrapeError::Intercepted` when another element sits on top of
    /// the click point.
    async fn click(&self, element: &Self::Element) -> Result<()>;

    /// Type `text` into the element.
    async fn send_keys(&self, element: &Self::Element, text: &str) -> Result<()>;

    /// The element's inner markup.
    async fn inner_html(&self, element: &Self::Element) -> Result<String>;

    /// Markup of the whole current document.
    async fn page_source(&self) -> Result<String>;
}

/// Find a required element, turning absence into `NotFound`.
pub async fn require<D: Driver + ?Sized>(driver: &D, locator: &Locator) -> Result<D::Element> {
    driver
        .find(locator)
        .await?
        .ok_or_else(|| ScrapeError::NotFound(locator.to_string()))
}

/// Click, retrying exactly once if the click is intercepted.
///
/// A second interception is reported as `Intercepted(what)`.
pub async fn click_retrying_once<D: Driver + ?Sized>(
    driver: &D,
    element: &D::Element,
    what: &str,
) -> Result<()> {
    match driver.click(element).await {
        Err(ScrapeError::Intercepted(_)) => {
            debug!(what, "click intercepted, retrying once");
            driver.click(element).await.map_err(|err| match err {
                ScrapeError::Intercepted(_) => ScrapeError::Intercepted(what.to_string()),
                other => other,
            })
        }
        other => other,
    }
}
