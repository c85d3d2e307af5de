//! `Driver` over the Chrome DevTools Protocol.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::element::Element;
use chromiumoxide::Page;
use futures::StreamExt;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::{Driver, Locator};
use crate::error::{Result, ScrapeError};

const DISPLAYED_JS: &str = r#"function() {
    const style = window.getComputedStyle(this);
    const rect = this.getBoundingClientRect();
    return style.display !== 'none'
        && style.visibility !== 'hidden'
        && rect.width > 0
        && rect.height > 0;
}"#;

// Scrolls the element into view and reports whether it would receive a click
// at its center point.
const CLICKABLE_JS: &str = r#"function() {
    this.scrollIntoView({ block: 'center', inline: 'center' });
    const rect = this.getBoundingClientRect();
    const hit = document.elementFromPoint(rect.left + rect.width / 2, rect.top + rect.height / 2);
    return hit === null || hit === this || this.contains(hit);
}"#;

/// Browser launch options.
#[derive(Debug, Clone, Default)]
pub struct ChromeOptions {
    /// Explicit browser binary. Discovered with [`find_chrome`] when unset.
    pub executable: Option<PathBuf>,
    pub headless: bool,
    /// Persistent profile directory. A throwaway profile is used when unset.
    pub profile_dir: Option<PathBuf>,
}

/// A launched Chrome with a single page under automation.
pub struct ChromeDriver {
    browser: Browser,
    page: Page,
    handler_task: JoinHandle<()>,
}

impl ChromeDriver {
    pub async fn launch(options: &ChromeOptions) -> anyhow::Result<Self> {
        use anyhow::Context;

        let executable = match &options.executable {
            Some(path) => path.clone(),
            None => find_chrome()
                .context("Chrome/Chromium not found. Install it or set browser.chrome_executable.")?,
        };
        debug!(executable = %executable.display(), "launching browser");

        let mut builder = BrowserConfig::builder()
            .chrome_executable(executable)
            .viewport(None)
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--disable-infobars")
            .arg("--no-first-run")
            .arg("--no-default-browser-check");
        if !options.headless {
            builder = builder.with_head();
        }
        if let Some(dir) = &options.profile_dir {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create profile dir: {}", dir.display()))?;
            builder = builder.user_data_dir(dir);
        }
        let config = builder
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to configure browser: {e}"))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .context("Failed to launch browser")?;
        let handler_task = tokio::spawn(async move { while (handler.next().await).is_some() {} });

        let page = match browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(err) => {
                handler_task.abort();
                return Err(anyhow::anyhow!("Failed to open browser page: {err}"));
            }
        };

        Ok(Self {
            browser,
            page,
            handler_task,
        })
    }

    /// Close the browser and stop the CDP handler.
    pub async fn close(mut self) {
        if let Err(err) = self.browser.close().await {
            warn!(error = %err, "Failed to close browser cleanly");
        }
        if let Err(err) = self.browser.wait().await {
            warn!(error = %err, "Failed waiting for browser exit");
        }
        self.handler_task.abort();
    }

    async fn xpath_count(&self, xpath: &str) -> Result<u64> {
        let literal = serde_json::to_string(xpath).map_err(ScrapeError::browser)?;
        let expr = format!(
            "document.evaluate({literal}, document, null, XPathResult.ORDERED_NODE_SNAPSHOT_TYPE, null).snapshotLength"
        );
        let result = self.page.evaluate(expr).await.map_err(ScrapeError::browser)?;
        result.into_value::<u64>().map_err(ScrapeError::browser)
    }

    async fn js_bool(&self, element: &Element, function: &str) -> Result<bool> {
        let returns = element
            .call_js_fn(function, false)
            .await
            .map_err(ScrapeError::browser)?;
        Ok(returns
            .result
            .value
            .and_then(|v| v.as_bool())
            .unwrap_or(false))
    }
}

#[async_trait]
impl Driver for ChromeDriver {
    type Element = Element;

    async fn goto(&self, url: &str) -> Result<()> {
        self.page.goto(url).await.map_err(ScrapeError::browser)?;
        Ok(())
    }

    async fn find_all(&self, locator: &Locator) -> Result<Vec<Element>> {
        let Locator::XPath(xpath) = locator else {
            let css = locator.to_css().unwrap_or_default();
            return self
                .page
                .find_elements(css)
                .await
                .map_err(ScrapeError::browser);
        };
        // Count first so "no match" is not confused with a CDP failure.
        if self.xpath_count(xpath).await? == 0 {
            return Ok(Vec::new());
        }
        self.page
            .find_xpaths(xpath.as_str())
            .await
            .map_err(ScrapeError::browser)
    }

    async fn is_displayed(&self, element: &Element) -> Result<bool> {
        self.js_bool(element, DISPLAYED_JS).await
    }

    async fn click(&self, element: &Element) -> Result<()> {
        if !self.js_bool(element, CLICKABLE_JS).await? {
            return Err(ScrapeError::Intercepted("element".to_string()));
        }
        element.click().await.map_err(ScrapeError::browser)?;
        Ok(())
    }

    async fn send_keys(&self, element: &Element, text: &str) -> Result<()> {
        element.focus().await.map_err(ScrapeError::browser)?;
        element.type_str(text).await.map_err(ScrapeError::browser)?;
        Ok(())
    }

    async fn inner_html(&self, element: &Element) -> Result<String> {
        Ok(element
            .inner_html()
            .await
            .map_err(ScrapeError::browser)?
            .unwrap_or_default())
    }

    async fn page_source(&self) -> Result<String> {
        self.page.content().await.map_err(ScrapeError::browser)
    }
}

/// Find a Chrome/Chromium executable on `PATH` or at a well-known location.
pub fn find_chrome() -> Option<PathBuf> {
    const NAMES: [&str; 4] = [
        "google-chrome",
        "google-chrome-stable",
        "chromium",
        "chromium-browser",
    ];
    const KNOWN: [&str; 5] = [
        "/snap/bin/chromium",
        "/run/current-system/sw/bin/google-chrome",
        "/run/current-system/sw/bin/chromium",
        "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
        "/Applications/Chromium.app/Contents/MacOS/Chromium",
    ];

    if let Some(path) = std::env::var_os("PATH") {
        for dir in std::env::split_paths(&path) {
            for name in NAMES {
                let candidate = dir.join(name);
                if candidate.is_file() {
                    return Some(candidate);
                }
            }
        }
    }

    KNOWN
        .iter()
        .map(Path::new)
        .find(|p| p.exists())
        .map(Path::to_path_buf)
}
