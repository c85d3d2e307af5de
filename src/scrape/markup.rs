//! Where things live in the portal's markup.
//!
//! Defaults match Maybank2u. Every value can be overridden from config when
//! the portal changes its class names or labels.

use serde::{Deserialize, Serialize};

use crate::browser::{xpath_literal, Locator};
use crate::models::TargetKind;

/// Elements of the login handshake.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoginMarkup {
    /// `id` of the username input.
    pub username_id: String,
    /// `name` of the button submitting the username.
    pub submit_name: String,
    /// Class of the button confirming the security image and, later,
    /// submitting the password.
    pub confirm_class: String,
    /// `id` of the password input.
    pub password_id: String,
    /// Text present in the page once login has succeeded.
    pub success_text: String,
}

impl Default for LoginMarkup {
    fn default() -> Self {
        Self {
            username_id: "username".to_string(),
            submit_name: "button".to_string(),
            confirm_class: "btn-success".to_string(),
            password_id: "my-password-input".to_string(),
            success_text: "Your last login was on".to_string(),
        }
    }
}

impl LoginMarkup {
    pub fn username(&self) -> Locator {
        Locator::id(&self.username_id)
    }

    pub fn submit(&self) -> Locator {
        Locator::name(&self.submit_name)
    }

    pub fn confirm(&self) -> Locator {
        Locator::class(&self.confirm_class)
    }

    pub fn password(&self) -> Locator {
        Locator::id(&self.password_id)
    }
}

/// Navigation and history-table elements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PortalMarkup {
    /// Class substring of the full-page loading overlay.
    pub overlay_class: String,
    /// `id` of the control that opens the lookback window menu.
    pub lookback_control_id: String,
    /// Label of a lookback option; `{days}` is replaced by the window.
    pub lookback_option_label: String,
    pub table_xpath: String,
    /// Class substring of the next-page link.
    pub next_page_class: String,
    pub accounts_tab_label: String,
    pub cards_tab_label: String,
}

impl Default for PortalMarkup {
    fn default() -> Self {
        Self {
            overlay_class: "LoaderNew---overlay".to_string(),
            lookback_control_id: "daysType".to_string(),
            lookback_option_label: "Last {days} days".to_string(),
            table_xpath: "//table".to_string(),
            next_page_class: "next_arrow".to_string(),
            accounts_tab_label: "ACCOUNTS".to_string(),
            cards_tab_label: "CARDS".to_string(),
        }
    }
}

impl PortalMarkup {
    pub fn overlay(&self) -> Locator {
        Locator::xpath(format!(
            "//div[contains(@class, {})]",
            xpath_literal(&self.overlay_class)
        ))
    }

    pub fn lookback_control(&self) -> Locator {
        Locator::id(&self.lookback_control_id)
    }

    pub fn lookback_option(&self, days: u32) -> Locator {
        let label = self
            .lookback_option_label
            .replace("{days}", &days.to_string());
        Locator::xpath(format!("//span[text()={}]", xpath_literal(&label)))
    }

    pub fn table(&self) -> Locator {
        Locator::xpath(&self.table_xpath)
    }

    pub fn next_page(&self) -> Locator {
        Locator::xpath(format!(
            "//a[contains(@class, {})]",
            xpath_literal(&self.next_page_class)
        ))
    }

    pub fn tab(&self, kind: TargetKind) -> Locator {
        let label = match kind {
            TargetKind::Accounts => &self.accounts_tab_label,
            TargetKind::Cards => &self.cards_tab_label,
        };
        Locator::xpath(format!("//div[text()={}]", xpath_literal(label)))
    }

    /// Link opening an account or card by its display name.
    pub fn target_link(&self, name: &str) -> Locator {
        Locator::xpath(format!("//span[text()={}]", xpath_literal(name)))
    }
}

fn default_date_formats() -> Vec<String> {
    ["%d/%m/%Y", "%d %b %Y", "%d %B %Y", "%Y-%m-%d"]
        .into_iter()
        .map(String::from)
        .collect()
}

/// Column layout and value conventions of the history table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TableLayout {
    pub date_column: usize,
    pub memo_column: usize,
    pub amount_column: usize,
    /// Substring of the amount cell markup that marks a debit.
    pub negative_marker: String,
    /// Currency text stripped from amounts before parsing.
    pub currency_prefix: String,
    /// `chrono` formats tried in order when parsing the date cell.
    pub date_formats: Vec<String>,
}

impl Default for TableLayout {
    fn default() -> Self {
        Self {
            date_column: 0,
            memo_column: 1,
            amount_column: 3,
            negative_marker: "negativeAmount".to_string(),
            currency_prefix: "RM".to_string(),
            date_formats: default_date_formats(),
        }
    }
}

impl TableLayout {
    /// Minimum number of cells a data row must have.
    pub fn required_cells(&self) -> usize {
        self.date_column
            .max(self.memo_column)
            .max(self.amount_column)
            + 1
    }
}
