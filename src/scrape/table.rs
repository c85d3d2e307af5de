//! Turn one page of the history table into transactions.

use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use scraper::{ElementRef, Html, Selector};

use super::markup::TableLayout;
use crate::error::{Result, ScrapeError};
use crate::models::Transaction;

/// Collapse whitespace runs and trim.
///
/// Any run of two or more whitespace characters, and any single tab or line
/// break, becomes one space. Single spaces between words are kept.
pub fn normalize_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_ws = false;
    for ch in text.trim().chars() {
        if ch.is_whitespace() {
            pending_ws = true;
            continue;
        }
        if pending_ws {
            out.push(' ');
            pending_ws = false;
        }
        out.push(ch);
    }
    out
}

/// Parse a date cell using the first matching format.
pub fn parse_date(text: &str, formats: &[String]) -> Result<NaiveDate> {
    let text = normalize_text(text);
    formats
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(&text, fmt).ok())
        .ok_or_else(|| ScrapeError::parse(format!("unrecognized date {text:?}")))
}

/// Parse an amount cell's text into a magnitude, then apply the debit sign.
///
/// The currency prefix, grouping commas, and any whitespace are removed
/// first. The scale of the source text is preserved. Zero is never negative.
pub fn parse_amount(text: &str, currency_prefix: &str, negative: bool) -> Result<Decimal> {
    let mut cleaned = normalize_text(text);
    if !currency_prefix.is_empty() {
        cleaned = cleaned.replace(currency_prefix, "");
    }
    let cleaned: String = cleaned
        .chars()
        .filter(|c| *c != ',' && !c.is_whitespace())
        .collect();

    let magnitude = Decimal::from_str(&cleaned)
        .map_err(|e| ScrapeError::parse(format!("invalid amount {text:?}: {e}")))?
        .abs();
    // A marked zero stays zero; QIF has no negative zero.
    Ok(if negative && !magnitude.is_zero() {
        -magnitude
    } else {
        magnitude
    })
}

fn cell_text(cell: &ElementRef<'_>) -> String {
    cell.text().collect()
}

/// Parse the inner markup of the history `<table>`.
///
/// Rows without `td` cells (headers, spacers) are skipped. Any other row must
/// carry a parseable date and amount.
pub fn parse_table(inner_html: &str, layout: &TableLayout) -> Result<Vec<Transaction>> {
    // Row and cell tags are dropped unless parsed inside a table context.
    let document = Html::parse_fragment(&format!("<table>{inner_html}</table>"));
    let row_sel = Selector::parse("tr").map_err(|e| ScrapeError::parse(e.to_string()))?;
    let cell_sel = Selector::parse("td").map_err(|e| ScrapeError::parse(e.to_string()))?;

    let mut transactions = Vec::new();
    for (index, row) in document.select(&row_sel).enumerate() {
        let cells: Vec<ElementRef<'_>> = row.select(&cell_sel).collect();
        if cells.is_empty() {
            continue;
        }
        if cells.len() < layout.required_cells() {
            return Err(ScrapeError::parse(format!(
                "row {index} has {} cells, expected at least {}",
                cells.len(),
                layout.required_cells()
            )));
        }

        let amount_cell = &cells[layout.amount_column];
        let negative = amount_cell.html().contains(&layout.negative_marker);

        let date = parse_date(&cell_text(&cells[layout.date_column]), &layout.date_formats)?;
        let memo = normalize_text(&cell_text(&cells[layout.memo_column]));
        let amount = parse_amount(&cell_text(amount_cell), &layout.currency_prefix, negative)?;

        transactions.push(Transaction::new(date, memo, amount));
    }

    Ok(transactions)
}
