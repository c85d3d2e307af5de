//! QIF (Quicken Interchange Format) bank export.
//!
//! Each transaction is written as its own `!Type:Bank` block:
//!
//! ```text
//! !Type:Bank
//! D2024-01-01
//! T-5.00
//! MRefund
//! ^
//! ```

use std::fmt::Write as _;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::models::Transaction;

/// Render transactions in the order given.
pub fn render_qif(transactions: &[Transaction]) -> String {
    let mut out = String::new();
    for t in transactions {
        // Writing to a String cannot fail.
        let _ = write!(
            out,
            "!Type:Bank\nD{}\nT{}\nM{}\n^\n",
            t.date.format("%Y-%m-%d"),
            t.amount,
            single_line(&t.memo),
        );
    }
    out
}

// QIF is line oriented; a line break in the memo would start a new field.
fn single_line(memo: &str) -> std::borrow::Cow<'_, str> {
    if memo.contains(['\n', '\r']) {
        memo.replace(['\n', '\r'], " ").into()
    } else {
        memo.into()
    }
}

/// File name for an account's export: the name with characters that are not
/// valid in file names replaced by `_`, plus `.qif`.
pub fn qif_file_name(account_name: &str) -> String {
    let stem: String = account_name
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    let stem = match stem.as_str() {
        "" | "." | ".." => "account".to_string(),
        _ => stem,
    };
    format!("{stem}.qif")
}

/// Write an account's transactions to `<dir>/<name>.qif`, replacing any
/// previous export. The directory is created if missing.
pub fn write_qif(dir: &Path, account_name: &str, transactions: &[Transaction]) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(qif_file_name(account_name));

    let mut writer = BufWriter::new(File::create(&path)?);
    writer.write_all(render_qif(transactions).as_bytes())?;
    writer.flush()?;
    writer.get_ref().sync_all()?;

    Ok(path)
}
