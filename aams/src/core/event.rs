//! Wire records written to the event stream.
//!
//! Every record serializes to a single JSON object carrying an `"event"` tag,
//! either `"progress"` or `"complete"`. The stream is line-delimited: one
//! record per line.

use super::value::{display_value, is_truthy};
use super::WorkflowMode;
use crate::stages::StageTemplate;
use serde::{Deserialize, Serialize};

/// Stage name used for the opening progress record.
pub const STARTING_STAGE: &str = "starting";
/// Stage name reported when the request payload is unusable.
pub const PAYLOAD_STAGE: &str = "payload";
/// Stage name reported when an injected failure matched no stage.
pub const UNKNOWN_STAGE: &str = "unknown";
/// Stage name reported on a successful run.
pub const COMPLETE_STAGE: &str = "complete";
/// Stage name reported when the engine itself faulted.
pub const INTERNAL_STAGE: &str = "internal";

const SUCCESS_MESSAGE: &str = "장비 동작 시뮬레이션 완료";

/// A record on the event stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum WorkflowEvent {
    /// Entry into a stage or vision check.
    Progress(ProgressEvent),
    /// The single terminal record of a run.
    Complete(CompleteEvent),
}

impl WorkflowEvent {
    /// Encodes the event as one line of JSON, without the trailing newline.
    pub fn to_json_line(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Returns the stage name carried by the event.
    #[must_use]
    pub fn stage(&self) -> &str {
        match self {
            Self::Progress(p) => &p.stage,
            Self::Complete(c) => &c.stage,
        }
    }

    /// Returns true if this is the terminal record.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete(_))
    }
}

impl From<ProgressEvent> for WorkflowEvent {
    fn from(event: ProgressEvent) -> Self {
        Self::Progress(event)
    }
}

impl From<CompleteEvent> for WorkflowEvent {
    fn from(event: CompleteEvent) -> Self {
        Self::Complete(event)
    }
}

/// Announces entry into a stage or vision check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressEvent {
    /// Stage or check key.
    pub stage: String,
    /// Human-readable label.
    pub message: String,
    /// Resolved mode. Vision checks omit it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<WorkflowMode>,
}

impl ProgressEvent {
    /// The opening record of a run.
    #[must_use]
    pub fn starting(request_id: &serde_json::Value, mode: WorkflowMode) -> Self {
        Self {
            stage: STARTING_STAGE.to_string(),
            message: format!("요청 {} 장비 명령 준비", display_request_id(request_id)),
            mode: Some(mode),
        }
    }

    /// Entry into a workflow stage.
    #[must_use]
    pub fn stage(template: &StageTemplate, mode: WorkflowMode) -> Self {
        Self {
            stage: template.key.to_string(),
            message: template.label.to_string(),
            mode: Some(mode),
        }
    }

    /// Entry into a vision check.
    #[must_use]
    pub fn check(template: &StageTemplate) -> Self {
        Self {
            stage: template.key.to_string(),
            message: template.label.to_string(),
            mode: None,
        }
    }
}

/// Overall outcome carried by the terminal record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompletionStatus {
    /// Every stage and check succeeded.
    Success,
    /// The run stopped on a failure.
    Error,
}

/// Correlation data echoed back on success.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// The request id exactly as supplied, or `null`.
    #[serde(rename = "requestId", default)]
    pub request_id: serde_json::Value,
    /// The opaque `dispatch.includes` value, or `null`.
    #[serde(default)]
    pub includes: serde_json::Value,
}

/// The single terminal record of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompleteEvent {
    /// Success or error.
    pub status: CompletionStatus,
    /// `complete` on success, else the failing stage.
    pub stage: String,
    /// Human-readable outcome.
    pub message: String,
    /// Resolved mode. Absent when the payload never parsed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<WorkflowMode>,
    /// Present on success only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<RunSummary>,
}

impl CompleteEvent {
    /// A successful run.
    #[must_use]
    pub fn success(mode: WorkflowMode, summary: RunSummary) -> Self {
        Self {
            status: CompletionStatus::Success,
            stage: COMPLETE_STAGE.to_string(),
            message: SUCCESS_MESSAGE.to_string(),
            mode: Some(mode),
            summary: Some(summary),
        }
    }

    /// A run that stopped at `stage`.
    #[must_use]
    pub fn failure(stage: impl Into<String>, message: impl Into<String>, mode: WorkflowMode) -> Self {
        Self {
            status: CompletionStatus::Error,
            stage: stage.into(),
            message: message.into(),
            mode: Some(mode),
            summary: None,
        }
    }

    /// A run that never started because the payload was unusable.
    #[must_use]
    pub fn payload_error(message: impl Into<String>) -> Self {
        Self {
            status: CompletionStatus::Error,
            stage: PAYLOAD_STAGE.to_string(),
            message: message.into(),
            mode: None,
            summary: None,
        }
    }

    /// A run aborted by a fault inside the engine.
    #[must_use]
    pub fn internal_error(message: impl Into<String>, mode: Option<WorkflowMode>) -> Self {
        Self {
            status: CompletionStatus::Error,
            stage: INTERNAL_STAGE.to_string(),
            message: message.into(),
            mode,
            summary: None,
        }
    }

    /// Returns true if the run succeeded.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.status == CompletionStatus::Success
    }
}

fn display_request_id(request_id: &serde_json::Value) -> String {
    if is_truthy(request_id) {
        display_value(request_id)
    } else {
        "-".to_string()
    }
}
