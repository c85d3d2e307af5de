use std::future::Future;
use std::time::{Duration, Instant};

use tracing::debug;

use super::{Driver, Locator};
use crate::error::{Result, ScrapeError};

/// Bounded poll-until-ready waits against the browser.
#[derive(Debug, Clone, Copy)]
pub struct Waiter {
    timeout: Duration,
    poll: Duration,
}

impl Waiter {
    pub fn new(timeout: Duration, poll: Duration) -> Self {
        Self { timeout, poll }
    }

    /// Poll `check` until it yields `Some`, or fail with `Timeout`.
    ///
    /// `check` runs at least once, even with a zero timeout. Errors from
    /// `check` propagate immediately.
    pub async fn until<T, F, Fut>(&self, what: &str, mut check: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<Option<T>>>,
    {
        let start = Instant::now();
        loop {
            if let Some(value) = check().await? {
                return Ok(value);
            }
            if start.elapsed() >= self.timeout {
                return Err(ScrapeError::Timeout {
                    what: what.to_string(),
                    after: self.timeout,
                });
            }
            tokio::time::sleep(self.poll).await;
        }
    }

    /// Wait until an element matching `locator` exists and is displayed.
    pub async fn displayed<D: Driver + ?Sized>(
        &self,
        driver: &D,
        locator: &Locator,
    ) -> Result<D::Element> {
        self.until(&locator.to_string(), move || async move {
            match driver.find(locator).await? {
                Some(el) if driver.is_displayed(&el).await? => Ok(Some(el)),
                _ => Ok(None),
            }
        })
        .await
    }

    /// Wait until a specific element is displayed.
    pub async fn element_displayed<D: Driver + ?Sized>(
        &self,
        driver: &D,
        element: &D::Element,
        what: &str,
    ) -> Result<()> {
        self.until(what, move || async move {
            Ok(driver.is_displayed(element).await?.then_some(()))
        })
        .await
    }

    /// Wait until no element matches `locator`.
    ///
    /// Returns immediately when nothing matches on the first look.
    pub async fn gone<D: Driver + ?Sized>(&self, driver: &D, locator: &Locator) -> Result<()> {
        if driver.find(locator).await?.is_none() {
            return Ok(());
        }
        debug!(%locator, "waiting for element to disappear");
        self.until(&format!("{locator} to disappear"), move || async move {
            Ok(driver.find_all(locator).await?.is_empty().then_some(()))
        })
        .await
    }

    /// Wait until the page source contains `needle`.
    pub async fn page_contains<D: Driver + ?Sized>(&self, driver: &D, needle: &str) -> Result<()> {
        self.until(&format!("page text {needle:?}"), move || async move {
            Ok(driver.page_source().await?.contains(needle).then_some(()))
        })
        .await
    }
}

impl Default for Waiter {
    fn default() -> Self {
        Self::new(Duration::from_secs(15), Duration::from_millis(250))
    }
}
