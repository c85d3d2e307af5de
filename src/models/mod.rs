mod target;
mod transaction;

pub use target::{ExportTarget, TargetKind};
pub use transaction::{sort_by_date, Transaction};
