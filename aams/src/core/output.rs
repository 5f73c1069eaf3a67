//! Outcome of running a single stage or vision check.

use super::StageStatus;
use serde::{Deserialize, Serialize};

/// The result of one stage.
///
/// The engine inspects this after every stage and stops at the first
/// `Failed`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", content = "reason", rename_all = "snake_case")]
pub enum StageOutcome {
    /// Stage completed successfully.
    Ok,
    /// Stage failed with a reason.
    Failed(String),
}

impl StageOutcome {
    /// Creates a failure outcome.
    #[must_use]
    pub fn fail(reason: impl Into<String>) -> Self {
        Self::Failed(reason.into())
    }

    /// Returns the matching status.
    #[must_use]
    pub const fn status(&self) -> StageStatus {
        match self {
            Self::Ok => StageStatus::Ok,
            Self::Failed(_) => StageStatus::Fail,
        }
    }

    /// Returns true if the stage succeeded.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Ok)
    }

    /// Returns the failure reason, if any.
    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Ok => None,
            Self::Failed(reason) => Some(reason),
        }
    }
}
