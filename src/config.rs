use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::browser::Waiter;
use crate::duration::deserialize_duration;
use crate::models::ExportTarget;
use crate::scrape::{LoginMarkup, PortalMarkup, TableLayout};

pub const CONFIG_FILE_NAME: &str = "m2u-export.toml";

pub const DEFAULT_LOGIN_URL: &str = "https://www.maybank2u.com.my/home/m2u/common/login.do";

fn default_login_url() -> String {
    DEFAULT_LOGIN_URL.to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("exports")
}

fn default_wait_timeout() -> Duration {
    Duration::from_secs(15)
}

fn default_poll_interval() -> Duration {
    Duration::from_millis(250)
}

/// Browser launch and wait settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserSettings {
    /// Run without a visible window.
    pub headless: bool,

    /// Path to the Chrome/Chromium binary. Discovered on `PATH` when unset.
    pub chrome_executable: Option<PathBuf>,

    /// Persistent browser profile directory. If relative, resolved from the
    /// config file location.
    pub profile_dir: Option<PathBuf>,

    /// Upper bound for every individual wait on the page.
    #[serde(
        default = "default_wait_timeout",
        deserialize_with = "deserialize_duration"
    )]
    pub wait_timeout: Duration,

    /// How often a wait re-checks its condition.
    #[serde(
        default = "default_poll_interval",
        deserialize_with = "deserialize_duration"
    )]
    pub poll_interval: Duration,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            headless: false,
            chrome_executable: None,
            profile_dir: None,
            wait_timeout: default_wait_timeout(),
            poll_interval: default_poll_interval(),
        }
    }
}

impl BrowserSettings {
    pub fn waiter(&self) -> Waiter {
        Waiter::new(self.wait_timeout, self.poll_interval)
    }
}

/// Login handshake settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoginSettings {
    /// Ask on the terminal whether the security image is correct before
    /// entering the password.
    pub confirm_security_image: bool,

    pub markup: LoginMarkup,
}

/// A bank account to export.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccountEntry {
    /// Display name, exactly as shown in the portal.
    pub name: String,
    /// Trailing days of history to request.
    pub days: u32,
}

/// A card to export. Cards have no lookback window.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CardEntry {
    pub name: String,
}

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory for `.qif` files. If relative, resolved from config file location.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    #[serde(default = "default_login_url")]
    pub login_url: String,

    pub browser: BrowserSettings,

    pub login: LoginSettings,

    /// Overrides for navigation markup.
    pub portal: PortalMarkup,

    /// Overrides for the history table layout.
    pub table: TableLayout,

    pub accounts: Vec<AccountEntry>,

    pub cards: Vec<CardEntry>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            login_url: default_login_url(),
            browser: BrowserSettings::default(),
            login: LoginSettings::default(),
            portal: PortalMarkup::default(),
            table: TableLayout::default(),
            accounts: Vec::new(),
            cards: Vec::new(),
        }
    }
}

impl Config {
    /// Load config from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config
            .validate()
            .with_context(|| format!("Invalid config file: {}", path.display()))?;

        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        for account in &self.accounts {
            if account.name.trim().is_empty() {
                anyhow::bail!("Account entries need a non-empty name");
            }
            if account.days == 0 {
                anyhow::bail!("Account {:?} must request at least one day", account.name);
            }
        }
        if self.cards.iter().any(|c| c.name.trim().is_empty()) {
            anyhow::bail!("Card entries need a non-empty name");
        }
        if self.table.date_formats.is_empty() {
            anyhow::bail!("table.date_formats must list at least one format");
        }
        Ok(())
    }

    /// Resolve a possibly relative path against `config_dir`.
    fn resolve_path(path: &Path, config_dir: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            config_dir.join(path)
        }
    }

    /// Export targets in processing order: accounts first, then cards.
    pub fn targets(&self) -> Vec<ExportTarget> {
        self.accounts
            .iter()
            .map(|a| ExportTarget::account(a.name.clone(), a.days))
            .chain(self.cards.iter().map(|c| ExportTarget::card(c.name.clone())))
            .collect()
    }

    fn resolve(mut self, config_dir: &Path) -> ResolvedConfig {
        let output_dir = Self::resolve_path(&self.output_dir, config_dir);
        self.browser.profile_dir = self
            .browser
            .profile_dir
            .take()
            .map(|dir| Self::resolve_path(&dir, config_dir));
        let targets = self.targets();

        ResolvedConfig {
            output_dir,
            login_url: self.login_url,
            browser: self.browser,
            login: self.login,
            portal: self.portal,
            table: self.table,
            targets,
        }
    }
}

/// Loaded configuration with resolved paths.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// The resolved output directory path.
    pub output_dir: PathBuf,

    pub login_url: String,

    pub browser: BrowserSettings,

    pub login: LoginSettings,

    pub portal: PortalMarkup,

    pub table: TableLayout,

    /// Accounts then cards, in config order.
    pub targets: Vec<ExportTarget>,
}

/// Returns the default config file path.
///
/// Resolution order:
/// 1. `./m2u-export.toml` if it exists in current directory
/// 2. `~/.config/m2u-export/m2u-export.toml` (XDG config directory)
pub fn default_config_path() -> PathBuf {
    let local_config = PathBuf::from(CONFIG_FILE_NAME);
    if local_config.exists() {
        return local_config;
    }

    if let Some(config_dir) = dirs::config_dir() {
        return config_dir.join("m2u-export").join(CONFIG_FILE_NAME);
    }

    local_config
}

impl ResolvedConfig {
    /// Load and resolve config from a file path.
    ///
    /// Relative paths are resolved against the config file's parent directory.
    pub fn load(config_path: &Path) -> Result<Self> {
        let config_path = config_path
            .canonicalize()
            .with_context(|| format!("Config file not found: {}", config_path.display()))?;

        let config_dir = config_path
            .parent()
            .context("Config file has no parent directory")?;

        let config = Config::load(&config_path)?;
        Ok(config.resolve(config_dir))
    }

    /// Load config, falling back to defaults if the file doesn't exist.
    ///
    /// Without a file there are no targets, and relative paths resolve
    /// against the directory the config file would live in.
    pub fn load_or_default(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            return Self::load(config_path);
        }

        let config_path = if config_path.is_relative() {
            std::env::current_dir()
                .context("Failed to get current directory")?
                .join(config_path)
        } else {
            config_path.to_path_buf()
        };
        let config_dir = config_path
            .parent()
            .context("Config path has no parent directory")?;

        Ok(Config::default().resolve(config_dir))
    }

    pub fn waiter(&self) -> Waiter {
        self.browser.waiter()
    }

    /// Keep only targets whose name is in `names`. An empty list keeps all.
    pub fn retain_targets(&mut self, names: &[String]) {
        if names.is_empty() {
            return;
        }
        self.targets.retain(|t| names.iter().any(|n| n == &t.name));
    }
}
