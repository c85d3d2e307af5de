//! Writing scraped transactions to interchange files.

pub mod qif;

pub use qif::{qif_file_name, render_qif, write_qif};
