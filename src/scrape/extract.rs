use tracing::{debug, info};

use super::markup::{PortalMarkup, TableLayout};
use super::table::parse_table;
use crate::browser::{click_retrying_once, Driver, Waiter};
use crate::error::Result;
use crate::models::{TargetKind, Transaction};

/// Transactions collected from every page of one account or card.
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    /// In (page, row) order; not yet sorted by date.
    pub transactions: Vec<Transaction>,
    pub pages: usize,
}

/// Reads the history table of the currently opened account or card.
pub struct TableExtractor<'a, D: Driver + ?Sized> {
    driver: &'a D,
    waiter: Waiter,
    portal: &'a PortalMarkup,
    layout: &'a TableLayout,
}

impl<'a, D: Driver + ?Sized> TableExtractor<'a, D> {
    pub fn new(
        driver: &'a D,
        waiter: Waiter,
        portal: &'a PortalMarkup,
        layout: &'a TableLayout,
    ) -> Self {
        Self {
            driver,
            waiter,
            portal,
            layout,
        }
    }

    /// Extract every page, starting from the one currently shown.
    pub async fn extract(&self, kind: TargetKind, lookback_days: Option<u32>) -> Result<Extraction> {
        let mut transactions = Vec::new();
        let pages = self
            .extract_into(kind, lookback_days, &mut transactions)
            .await?;
        info!(pages, count = transactions.len(), "Done parsing");
        Ok(Extraction {
            transactions,
            pages,
        })
    }

    /// Append every page's rows to `acc` and return the number of pages read.
    ///
    /// For accounts the lookback window is selected before the first read;
    /// cards show a single implicit range and skip that step.
    pub async fn extract_into(
        &self,
        kind: TargetKind,
        lookback_days: Option<u32>,
        acc: &mut Vec<Transaction>,
    ) -> Result<usize> {
        if let (TargetKind::Accounts, Some(days)) = (kind, lookback_days) {
            self.select_lookback(days).await?;
        }

        let mut page = 1;
        loop {
            let markup = self.read_table(page).await?;
            let rows = parse_table(&markup, self.layout)?;
            debug!(page, rows = rows.len(), "Parsed page");
            acc.extend(rows);

            let Some(next) = self.driver.find(&self.portal.next_page()).await? else {
                return Ok(page);
            };
            self.waiter
                .element_displayed(self.driver, &next, "next page control")
                .await?;
            click_retrying_once(self.driver, &next, "next page control").await?;
            self.wait_for_page_change(&markup).await?;
            page += 1;
        }
    }

    async fn select_lookback(&self, days: u32) -> Result<()> {
        info!(days, "Looking for {days} days of transactions");
        self.finish_loading().await?;

        let control = self
            .waiter
            .displayed(self.driver, &self.portal.lookback_control())
            .await?;
        click_retrying_once(self.driver, &control, "lookback window control").await?;

        let option = self
            .waiter
            .displayed(self.driver, &self.portal.lookback_option(days))
            .await?;
        click_retrying_once(self.driver, &option, "lookback window option").await
    }

    /// Wait out the loading overlay, if one is showing.
    pub async fn finish_loading(&self) -> Result<()> {
        self.waiter.gone(self.driver, &self.portal.overlay()).await
    }

    async fn read_table(&self, page: usize) -> Result<String> {
        self.finish_loading().await?;
        let table = self
            .waiter
            .displayed(self.driver, &self.portal.table())
            .await?;
        info!(page, "Parsing page {page}");
        self.driver.inner_html(&table).await
    }

    // Gives the portal time to swap in the next page when it does so without
    // the overlay. Consecutive pages can hold identical rows, so unchanged
    // markup after the bound is read as the next page rather than an error.
    async fn wait_for_page_change(&self, previous: &str) -> Result<()> {
        self.finish_loading().await?;
        let table = self.portal.table();
        let driver = self.driver;
        let table = &table;
        let changed = self
            .waiter
            .until("next page of transactions", move || async move {
                let Some(el) = driver.find(table).await? else {
                    return Ok(None);
                };
                Ok((driver.inner_html(&el).await? != previous).then_some(()))
            })
            .await;
        match changed {
            Err(err) if err.is_timeout() => {
                debug!("Table markup unchanged after page turn, reading it as is");
                Ok(())
            }
            other => other,
        }
    }
}
