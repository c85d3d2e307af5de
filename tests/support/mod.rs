#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use m2u_export::browser::{Driver, Locator};
use m2u_export::config::{BrowserSettings, LoginSettings, ResolvedConfig};
use m2u_export::error::{Result, ScrapeError};
use m2u_export::models::{ExportTarget, TargetKind};
use m2u_export::scrape::{LoginMarkup, PortalMarkup, TableLayout};

/// Elements the scripted portal can hand out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum El {
    Username,
    Submit,
    Confirm,
    Password,
    Tab(TargetKind),
    Link(String),
    LookbackControl,
    LookbackOption(u32),
    Table,
    Next,
    Overlay,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoginStage {
    Username,
    Confirm,
    Password,
    LoggedIn,
}

#[derive(Debug, Clone)]
struct ScriptedTarget {
    kind: TargetKind,
    pages: Vec<String>,
}

#[derive(Debug)]
struct PortalState {
    stage: LoginStage,
    tab: Option<TargetKind>,
    open: Option<String>,
    page: usize,
    menu_open: bool,
    selected_days: Option<u32>,
    overlay_remaining: u32,
    next_intercepts: u32,
    visited: Vec<String>,
    typed: Vec<(El, String)>,
    clicks: Vec<El>,
    shown: Vec<(String, usize)>,
}

/// An in-memory stand-in for the banking portal.
///
/// It follows the real page flow: login stages, tabs, account links, the
/// lookback menu (accounts only), and a paginated table per target. The
/// history table of an account only appears once a lookback window has been
/// chosen.
pub struct ScriptedPortal {
    login: LoginMarkup,
    portal: PortalMarkup,
    targets: HashMap<String, ScriptedTarget>,
    lookback_options: Vec<u32>,
    never_loads: HashSet<String>,
    overlay_polls: u32,
    state: Mutex<PortalState>,
}

impl Default for ScriptedPortal {
    fn default() -> Self {
        Self {
            login: LoginMarkup::default(),
            portal: PortalMarkup::default(),
            targets: HashMap::new(),
            lookback_options: vec![30, 60, 90],
            never_loads: HashSet::new(),
            overlay_polls: 0,
            state: Mutex::new(PortalState {
                stage: LoginStage::Username,
                tab: None,
                open: None,
                page: 0,
                menu_open: false,
                selected_days: None,
                overlay_remaining: 0,
                next_intercepts: 0,
                visited: Vec::new(),
                typed: Vec::new(),
                clicks: Vec::new(),
                shown: Vec::new(),
            }),
        }
    }
}

impl ScriptedPortal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start already past the login handshake.
    pub fn logged_in(self) -> Self {
        self.state.lock().unwrap().stage = LoginStage::LoggedIn;
        self
    }

    pub fn with_account(mut self, name: &str, pages: Vec<String>) -> Self {
        self.targets.insert(
            name.to_string(),
            ScriptedTarget {
                kind: TargetKind::Accounts,
                pages,
            },
        );
        self
    }

    pub fn with_card(mut self, name: &str, pages: Vec<String>) -> Self {
        self.targets.insert(
            name.to_string(),
            ScriptedTarget {
                kind: TargetKind::Cards,
                pages,
            },
        );
        self
    }

    /// The target's table never shows up.
    pub fn never_loading(mut self, name: &str) -> Self {
        self.never_loads.insert(name.to_string());
        self
    }

    /// Show the loading overlay for `polls` lookups after each navigation.
    pub fn with_overlay(mut self, polls: u32) -> Self {
        self.overlay_polls = polls;
        self
    }

    /// Intercept the next `count` clicks on the next-page control.
    pub fn intercept_next_clicks(self, count: u32) -> Self {
        self.state.lock().unwrap().next_intercepts = count;
        self
    }

    pub fn clicks(&self) -> Vec<El> {
        self.state.lock().unwrap().clicks.clone()
    }

    pub fn typed(&self) -> Vec<(El, String)> {
        self.state.lock().unwrap().typed.clone()
    }

    /// (target, 1-based page) in the order pages were brought up.
    pub fn shown(&self) -> Vec<(String, usize)> {
        self.state.lock().unwrap().shown.clone()
    }

    pub fn selected_days(&self) -> Option<u32> {
        self.state.lock().unwrap().selected_days
    }

    pub fn visited(&self) -> Vec<String> {
        self.state.lock().unwrap().visited.clone()
    }

    fn matches(&self, locator: &Locator, state: &mut PortalState) -> Vec<El> {
        if *locator == self.portal.overlay() {
            if state.overlay_remaining > 0 {
                state.overlay_remaining -= 1;
                return vec![El::Overlay];
            }
            return Vec::new();
        }

        let stage = state.stage;
        let found = if *locator == self.login.username() {
            (stage == LoginStage::Username).then_some(El::Username)
        } else if *locator == self.login.submit() {
            (stage == LoginStage::Username).then_some(El::Submit)
        } else if *locator == self.login.confirm() {
            matches!(stage, LoginStage::Confirm | LoginStage::Password).then_some(El::Confirm)
        } else if *locator == self.login.password() {
            (stage == LoginStage::Password).then_some(El::Password)
        } else if stage != LoginStage::LoggedIn {
            None
        } else {
            self.match_portal(locator, state)
        };
        found.into_iter().collect()
    }

    fn match_portal(&self, locator: &Locator, state: &PortalState) -> Option<El> {
        for kind in [TargetKind::Accounts, TargetKind::Cards] {
            if *locator == self.portal.tab(kind) {
                return Some(El::Tab(kind));
            }
        }
        for (name, target) in &self.targets {
            if *locator == self.portal.target_link(name) {
                return (state.tab == Some(target.kind)).then(|| El::Link(name.clone()));
            }
        }

        let open = state.open.as_ref()?;
        let target = self.targets.get(open)?;

        if *locator == self.portal.lookback_control() {
            return (target.kind == TargetKind::Accounts).then_some(El::LookbackControl);
        }
        for days in &self.lookback_options {
            if *locator == self.portal.lookback_option(*days) {
                return state.menu_open.then_some(El::LookbackOption(*days));
            }
        }
        if *locator == self.portal.table() {
            let ready = target.kind == TargetKind::Cards || state.selected_days.is_some();
            return (ready && !self.never_loads.contains(open)).then_some(El::Table);
        }
        if *locator == self.portal.next_page() {
            return (state.page + 1 < target.pages.len()).then_some(El::Next);
        }
        None
    }
}

#[async_trait]
impl Driver for ScriptedPortal {
    type Element = El;

    async fn goto(&self, url: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.visited.push(url.to_string());
        state.stage = LoginStage::Username;
        Ok(())
    }

    async fn find_all(&self, locator: &Locator) -> Result<Vec<El>> {
        let mut state = self.state.lock().unwrap();
        Ok(self.matches(locator, &mut state))
    }

    async fn is_displayed(&self, _element: &El) -> Result<bool> {
        Ok(true)
    }

    async fn click(&self, element: &El) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.clicks.push(element.clone());
        match element {
            El::Submit => {
                if state.typed.iter().any(|(el, _)| *el == El::Username) {
                    state.stage = LoginStage::Confirm;
                }
            }
            El::Confirm => match state.stage {
                LoginStage::Confirm => state.stage = LoginStage::Password,
                LoginStage::Password if state.typed.iter().any(|(el, _)| *el == El::Password) => {
                    state.stage = LoginStage::LoggedIn
                }
                _ => {}
            },
            El::Tab(kind) => {
                state.tab = Some(*kind);
                state.open = None;
                state.overlay_remaining = self.overlay_polls;
            }
            El::Link(name) => {
                state.open = Some(name.clone());
                state.page = 0;
                state.menu_open = false;
                state.selected_days = None;
                state.overlay_remaining = self.overlay_polls;
                state.shown.push((name.clone(), 1));
            }
            El::LookbackControl => state.menu_open = true,
            El::LookbackOption(days) => {
                state.selected_days = Some(*days);
                state.menu_open = false;
                state.overlay_remaining = self.overlay_polls;
            }
            El::Next => {
                if state.next_intercepts > 0 {
                    state.next_intercepts -= 1;
                    return Err(ScrapeError::Intercepted("element".to_string()));
                }
                state.page += 1;
                state.overlay_remaining = self.overlay_polls;
                let name = state.open.clone().unwrap_or_default();
                let page = state.page + 1;
                state.shown.push((name, page));
            }
            El::Username | El::Password | El::Table | El::Overlay => {}
        }
        Ok(())
    }

    async fn send_keys(&self, element: &El, text: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.typed.push((element.clone(), text.to_string()));
        Ok(())
    }

    async fn inner_html(&self, element: &El) -> Result<String> {
        let state = self.state.lock().unwrap();
        match (element, &state.open) {
            (El::Table, Some(open)) => Ok(self.targets[open].pages[state.page].clone()),
            _ => Err(ScrapeError::Browser(format!("no markup for {element:?}"))),
        }
    }

    async fn page_source(&self) -> Result<String> {
        let state = self.state.lock().unwrap();
        Ok(if state.stage == LoginStage::LoggedIn {
            format!("<html><body>{}: today</body></html>", self.login.success_text)
        } else {
            "<html><body>Login</body></html>".to_string()
        })
    }
}

/// One history table row: date, description, amount text, debit marker.
pub type Row<'a> = (&'a str, &'a str, &'a str, bool);

/// Inner markup of a history table page.
pub fn table_page(rows: &[Row<'_>]) -> String {
    let mut html = String::from(
        "<thead><tr><th>Date</th><th>Description</th><th>Ref</th><th>Amount</th></tr></thead><tbody>",
    );
    for (date, memo, amount, negative) in rows {
        let class = if *negative {
            "AccountDetails---negativeAmount---2Lk1v"
        } else {
            "AccountDetails---amount---3aZ0x"
        };
        html.push_str(&format!(
            "<tr><td>{date}</td><td>  {memo}  </td><td>-</td><td><span class=\"{class}\">{amount}</span></td></tr>"
        ));
    }
    html.push_str("</tbody>");
    html
}

/// A resolved config with short waits, writing to `output_dir`.
pub fn test_config(output_dir: &Path, targets: Vec<ExportTarget>) -> ResolvedConfig {
    ResolvedConfig {
        output_dir: output_dir.to_path_buf(),
        login_url: "https://portal.test/login".to_string(),
        browser: BrowserSettings {
            wait_timeout: Duration::from_millis(100),
            poll_interval: Duration::from_millis(1),
            ..BrowserSettings::default()
        },
        login: LoginSettings::default(),
        portal: PortalMarkup::default(),
        table: TableLayout::default(),
        targets,
    }
}
