//! Per-stage execution records.

use crate::core::{StageOutcome, StageStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Record of one stage or vision check that ran.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageResult {
    /// Stage key.
    pub name: String,
    /// Stage status.
    pub status: StageStatus,
    /// When the stage started.
    pub started_at: DateTime<Utc>,
    /// When the stage ended.
    pub ended_at: DateTime<Utc>,
    /// Error message if failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StageResult {
    /// Creates a record from an outcome, ending now.
    #[must_use]
    pub fn from_outcome(
        name: impl Into<String>,
        started_at: DateTime<Utc>,
        outcome: &StageOutcome,
    ) -> Self {
        Self {
            name: name.into(),
            status: outcome.status(),
            started_at,
            ended_at: Utc::now(),
            error: outcome.reason().map(String::from),
        }
    }

    /// Returns the duration in milliseconds.
    #[must_use]
    pub fn duration_ms(&self) -> f64 {
        (self.ended_at - self.started_at).num_milliseconds() as f64
    }

    /// Returns true if the stage succeeded.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.status.is_success()
    }
}
