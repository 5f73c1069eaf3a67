//! Workflow request parsing and mode normalization.

use crate::core::{display_value, is_truthy, WorkflowMode};
use crate::errors::PayloadError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Modes accepted verbatim before falling back to the `type` field.
const RECOGNIZED_MODES: &[&str] = &["issue", "dispatch", "return"];

/// Raw modes that land in the dispatch bucket.
const DISPATCH_ALIASES: &[&str] = &["issue", "dispatch", "out", "불출"];

/// `type` values that imply an issue-like request.
const ISSUE_TYPES: &[&str] = &["DISPATCH", "ISSUE"];

/// Failure injection settings carried by a request.
///
/// Both fields accept any JSON value. Only a string key can match a stage;
/// other truthy values never match and end the run as `unknown`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimulateConfig {
    /// Stage or vision-check key at which to fail.
    #[serde(default, alias = "failStage")]
    pub fail_stage: Option<Value>,
    /// Failure message to report instead of the default.
    #[serde(default)]
    pub reason: Option<Value>,
}

impl SimulateConfig {
    /// Creates a config that fails at `stage`.
    #[must_use]
    pub fn fail_at(stage: impl Into<String>) -> Self {
        Self {
            fail_stage: Some(Value::String(stage.into())),
            reason: None,
        }
    }

    /// Sets the failure reason.
    #[must_use]
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(Value::String(reason.into()));
        self
    }

    /// Returns the configured fail key as text, ignoring falsy values.
    #[must_use]
    pub fn fail_stage(&self) -> Option<String> {
        truthy_text(self.fail_stage.as_ref())
    }

    /// Returns the configured reason as text, ignoring falsy values.
    #[must_use]
    pub fn reason(&self) -> Option<String> {
        truthy_text(self.reason.as_ref())
    }

    /// Returns true if this config targets `key`.
    #[must_use]
    pub fn targets(&self, key: &str) -> bool {
        matches!(&self.fail_stage, Some(Value::String(s)) if !s.is_empty() && s == key)
    }
}

fn truthy_text(value: Option<&Value>) -> Option<String> {
    value.filter(|v| is_truthy(v)).map(display_value)
}

/// A request to run one workflow.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorkflowRequest {
    /// Correlation id, echoed back verbatim. `Null` when absent.
    pub request_id: Value,
    /// The resolved workflow mode.
    pub mode: WorkflowMode,
    /// Failure injection settings.
    pub simulate: SimulateConfig,
    /// Opaque `dispatch.includes` value, passed through to the summary.
    pub dispatch_includes: Value,
}

impl WorkflowRequest {
    /// Creates a request for `mode` with no id and no injected failure.
    #[must_use]
    pub fn new(mode: WorkflowMode) -> Self {
        Self {
            mode,
            ..Self::default()
        }
    }

    /// Sets the request id.
    #[must_use]
    pub fn with_request_id(mut self, request_id: impl Into<Value>) -> Self {
        self.request_id = request_id.into();
        self
    }

    /// Sets the failure injection settings.
    #[must_use]
    pub fn with_simulate(mut self, simulate: SimulateConfig) -> Self {
        self.simulate = simulate;
        self
    }

    /// Sets the pass-through includes value.
    #[must_use]
    pub fn with_includes(mut self, includes: Value) -> Self {
        self.dispatch_includes = includes;
        self
    }

    /// Parses a request from the raw stdin payload.
    ///
    /// An empty payload is an empty request. Anything else must be a JSON
    /// object.
    pub fn parse(raw: &str) -> Result<Self, PayloadError> {
        if raw.is_empty() {
            return Self::from_object(&Map::new());
        }

        match serde_json::from_str::<Value>(raw)? {
            Value::Object(map) => Self::from_object(&map),
            other => Err(PayloadError::new(format!(
                "expected a JSON object, got {}",
                json_kind(&other)
            ))),
        }
    }

    /// Builds a request from an already-decoded JSON object.
    pub fn from_object(map: &Map<String, Value>) -> Result<Self, PayloadError> {
        let request_id = match map.get("requestId") {
            Some(id) if is_truthy(id) => id.clone(),
            _ => map.get("request_id").cloned().unwrap_or(Value::Null),
        };

        let mode = normalize_mode(map.get("mode"), map.get("type"));

        let simulate = match map.get("simulate") {
            Some(v) if is_truthy(v) => serde_json::from_value(v.clone())?,
            _ => SimulateConfig::default(),
        };

        let dispatch_includes = map
            .get("dispatch")
            .and_then(|d| d.get("includes"))
            .cloned()
            .unwrap_or(Value::Null);

        Ok(Self {
            request_id,
            mode,
            simulate,
            dispatch_includes,
        })
    }
}

/// Resolves the workflow mode from the request's `mode` and `type` fields.
///
/// Only `issue`, `dispatch` and `return` are taken from `mode` as-is. Any
/// other value (including `out`) is replaced by the `type`-derived mode before
/// bucketing. Unknown input ends up as `Return`.
#[must_use]
pub fn normalize_mode(mode: Option<&Value>, kind: Option<&Value>) -> WorkflowMode {
    let mut raw = match mode {
        Some(Value::String(s)) => s.to_lowercase(),
        Some(v) if is_truthy(v) => v.to_string().to_lowercase(),
        _ => String::new(),
    };

    if !RECOGNIZED_MODES.contains(&raw.as_str()) {
        let issue_like = kind
            .and_then(Value::as_str)
            .is_some_and(|t| ISSUE_TYPES.contains(&t));
        raw = if issue_like { "issue" } else { "return" }.to_string();
    }

    if DISPATCH_ALIASES.contains(&raw.as_str()) {
        WorkflowMode::Dispatch
    } else {
        WorkflowMode::Return
    }
}

const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
