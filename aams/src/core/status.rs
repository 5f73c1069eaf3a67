//! Workflow mode and stage status enums.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The workflow variant a request resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkflowMode {
    /// Equipment leaves the station and is handed to a user.
    Dispatch,
    /// Equipment comes back and is inspected and stowed.
    Return,
}

impl Default for WorkflowMode {
    fn default() -> Self {
        Self::Return
    }
}

impl WorkflowMode {
    /// Returns the wire name of the mode.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Dispatch => "dispatch",
            Self::Return => "return",
        }
    }

    /// Returns true if this mode runs the vision-check sequence.
    #[must_use]
    pub const fn runs_vision_checks(&self) -> bool {
        matches!(self, Self::Return)
    }
}

impl fmt::Display for WorkflowMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The execution status of a single stage or vision check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    /// Stage completed successfully.
    Ok,
    /// Stage failed.
    Fail,
}

impl fmt::Display for StageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok => write!(f, "ok"),
            Self::Fail => write!(f, "fail"),
        }
    }
}

impl StageStatus {
    /// Returns true if the status indicates success.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Ok)
    }
}
