//! Shared lifecycle status for projects and tasks.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Lifecycle state shared by projects and tasks.
///
/// External (JSON) labels are `Draft`, `In Progress` and `Done`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum WorkStatus {
    /// Created but not started.
    #[default]
    Draft,
    /// Work has started.
    #[serde(rename = "In Progress")]
    InProgress,
    /// Completed.
    Done,
}

impl WorkStatus {
    /// All values in declaration order.
    pub const ALL: [WorkStatus; 3] = [Self::Draft, Self::InProgress, Self::Done];

    /// Returns the external label used in API payloads.
    pub fn label(self) -> &'static str {
        match self {
            Self::Draft => "Draft",
            Self::InProgress => "In Progress",
            Self::Done => "Done",
        }
    }

    /// Comma-separated list of accepted external labels.
    pub fn allowed_labels() -> String {
        Self::ALL
            .iter()
            .map(|status| status.label())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl Display for WorkStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for WorkStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.label() == value)
            .ok_or_else(|| value.to_string())
    }
}
