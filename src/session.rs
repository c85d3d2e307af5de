//! Portal session: login, then one export per configured account or card.
//!
//! All operations go through one `Driver` handle and run strictly in
//! sequence. A failure while exporting one target is recorded in the
//! [`RunReport`] and the run moves on to the next target; a login failure
//! ends the run.

use std::path::PathBuf;

use secrecy::ExposeSecret;
use tracing::{info, warn};

use crate::browser::{click_retrying_once, require, Driver, Waiter};
use crate::config::ResolvedConfig;
use crate::credentials::Credentials;
use crate::error::{Result, ScrapeError};
use crate::export::write_qif;
use crate::models::{sort_by_date, ExportTarget};
use crate::scrape::TableExtractor;

/// What one successful target export produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportSummary {
    pub path: PathBuf,
    pub transactions: usize,
    pub pages: usize,
}

#[derive(Debug)]
pub struct TargetReport {
    pub target: ExportTarget,
    pub outcome: Result<ExportSummary>,
}

/// Per-target outcomes of a run, in processing order.
#[derive(Debug, Default)]
pub struct RunReport {
    pub targets: Vec<TargetReport>,
}

impl RunReport {
    pub fn succeeded(&self) -> usize {
        self.targets.iter().filter(|t| t.outcome.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.targets.len() - self.succeeded()
    }

    pub fn is_success(&self) -> bool {
        self.failed() == 0
    }
}

pub struct PortalSession<'a, D: Driver + ?Sized> {
    driver: &'a D,
    config: &'a ResolvedConfig,
    waiter: Waiter,
}

impl<'a, D: Driver + ?Sized> PortalSession<'a, D> {
    pub fn new(driver: &'a D, config: &'a ResolvedConfig) -> Self {
        Self {
            driver,
            config,
            waiter: config.waiter(),
        }
    }

    /// Perform the login handshake.
    ///
    /// `confirm_image` is consulted only when `login.confirm_security_image`
    /// is enabled; returning `false` aborts the login.
    pub async fn login<F>(&self, credentials: &Credentials, confirm_image: F) -> Result<()>
    where
        F: FnOnce() -> Result<bool>,
    {
        let markup = &self.config.login.markup;

        info!(url = %self.config.login_url, "Opening login page");
        self.driver.goto(&self.config.login_url).await?;

        let username = self.waiter.displayed(self.driver, &markup.username()).await?;
        info!("Username field visible");
        info!("Entering username");
        self.driver
            .send_keys(&username, credentials.username.expose_secret())
            .await?;
        let submit = require(self.driver, &markup.submit()).await?;
        click_retrying_once(self.driver, &submit, "username submit").await?;

        let confirm = self.waiter.displayed(self.driver, &markup.confirm()).await?;
        info!("Verification image loaded");
        if self.config.login.confirm_security_image && !confirm_image()? {
            return Err(ScrapeError::Aborted(
                "security image was not confirmed".to_string(),
            ));
        }
        click_retrying_once(self.driver, &confirm, "security image confirmation").await?;

        let password = self.waiter.displayed(self.driver, &markup.password()).await?;
        info!("Password field visible");
        info!("Entering password");
        self.driver
            .send_keys(&password, credentials.password.expose_secret())
            .await?;
        let submit = require(self.driver, &markup.confirm()).await?;
        click_retrying_once(self.driver, &submit, "password submit").await?;

        self.waiter
            .page_contains(self.driver, &markup.success_text)
            .await?;
        info!("Successful login");
        Ok(())
    }

    /// Switch to the target's tab and open it.
    pub async fn open_target(&self, target: &ExportTarget) -> Result<()> {
        let portal = &self.config.portal;
        let overlay = portal.overlay();

        self.waiter.gone(self.driver, &overlay).await?;
        let tab = self
            .waiter
            .displayed(self.driver, &portal.tab(target.kind))
            .await?;
        click_retrying_once(self.driver, &tab, target.kind.as_str()).await?;

        self.waiter.gone(self.driver, &overlay).await?;
        let link = self
            .waiter
            .displayed(self.driver, &portal.target_link(&target.name))
            .await?;
        click_retrying_once(self.driver, &link, &target.name).await
    }

    /// Export one target's full history to its `.qif` file.
    ///
    /// Nothing is written unless every page was read successfully.
    pub async fn export_target(&self, target: &ExportTarget) -> Result<ExportSummary> {
        info!(target = %target.name, kind = %target.kind, "Exporting {}", target.name);
        self.open_target(target).await?;

        let extractor = TableExtractor::new(
            self.driver,
            self.waiter,
            &self.config.portal,
            &self.config.table,
        );
        let extraction = extractor.extract(target.kind, target.lookback()).await?;

        let mut transactions = extraction.transactions;
        sort_by_date(&mut transactions);
        let path = write_qif(&self.config.output_dir, &target.name, &transactions)?;

        info!(
            target = %target.name,
            count = transactions.len(),
            path = %path.display(),
            "Exported {} transactions",
            transactions.len()
        );
        Ok(ExportSummary {
            path,
            transactions: transactions.len(),
            pages: extraction.pages,
        })
    }

    /// Export each target in order, continuing past failures.
    pub async fn export_all(&self, targets: &[ExportTarget]) -> RunReport {
        let mut report = RunReport::default();
        for target in targets {
            let outcome = self.export_target(target).await;
            if let Err(err) = &outcome {
                warn!(target = %target.name, error = %err, "Export failed");
            }
            report.targets.push(TargetReport {
                target: target.clone(),
                outcome,
            });
        }
        report
    }

    /// Log in and export every configured target.
    pub async fn run<F>(&self, credentials: &Credentials, confirm_image: F) -> Result<RunReport>
    where
        F: FnOnce() -> Result<bool>,
    {
        self.login(credentials, confirm_image).await?;
        Ok(self.export_all(&self.config.targets).await)
    }
}
