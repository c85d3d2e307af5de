use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A transaction scraped from one row of the portal's history table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub date: NaiveDate,
    /// Whitespace-normalized description. May be empty.
    pub memo: String,
    /// Signed amount - negative for debits, positive for credits
    pub amount: Decimal,
}

impl Transaction {
    pub fn new(date: NaiveDate, memo: impl Into<String>, amount: Decimal) -> Self {
        Self {
            date,
            memo: memo.into(),
            amount,
        }
    }
}

/// Sort transactions by date ascending.
///
/// The sort is stable: transactions sharing a date keep the order they were
/// scraped in (page, then row).
pub fn sort_by_date(transactions: &mut [Transaction]) {
    transactions.sort_by_key(|t| t.date);
}
