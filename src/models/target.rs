use serde::{Deserialize, Serialize};

/// Which portal tab a target lives under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetKind {
    Accounts,
    Cards,
}

impl TargetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetKind::Accounts => "accounts",
            TargetKind::Cards => "cards",
        }
    }
}

impl std::fmt::Display for TargetKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An account or card whose history should be exported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportTarget {
    /// Display name as shown in the portal; also names the output file.
    pub name: String,
    pub kind: TargetKind,
    /// Trailing days of history to request. Cards always show one implicit
    /// range, so this is `None` for them.
    pub lookback_days: Option<u32>,
}

impl ExportTarget {
    pub fn account(name: impl Into<String>, days: u32) -> Self {
        Self {
            name: name.into(),
            kind: TargetKind::Accounts,
            lookback_days: Some(days),
        }
    }

    pub fn card(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: TargetKind::Cards,
            lookback_days: None,
        }
    }

    /// The lookback window to select, if this target uses one.
    pub fn lookback(&self) -> Option<u32> {
        match self.kind {
            TargetKind::Accounts => self.lookback_days,
            TargetKind::Cards => None,
        }
    }
}
