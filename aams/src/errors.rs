//! Error types for the AAMS control plane.
//!
//! Injected workflow failures are not errors: they travel as
//! [`StageOutcome::Failed`](crate::core::StageOutcome) values. The types here
//! cover input that cannot be used, bridge faults and internal I/O faults.

use thiserror::Error;

/// Process exit code for a successful run.
pub const EXIT_SUCCESS: i32 = 0;
/// Process exit code for unusable input or an internal fault.
pub const EXIT_INPUT_ERROR: i32 = 1;
/// Process exit code for a workflow that ran and failed.
pub const EXIT_WORKFLOW_FAILED: i32 = 2;

/// The main error type for AAMS operations.
#[derive(Debug, Error)]
pub enum AamsError {
    /// The request payload could not be parsed into a workflow request.
    #[error("{0}")]
    Payload(#[from] PayloadError),

    /// A motion bridge error.
    #[error("{0}")]
    Bridge(#[from] BridgeError),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AamsError {
    /// Returns the process exit code this error maps to.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        EXIT_INPUT_ERROR
    }
}

/// Error raised when the request payload is unusable.
#[derive(Debug, Clone, Error)]
#[error("유효하지 않은 JSON 입력: {detail}")]
pub struct PayloadError {
    /// Parser diagnostic.
    pub detail: String,
}

impl PayloadError {
    /// Creates a new payload error.
    #[must_use]
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }
}

impl From<serde_json::Error> for PayloadError {
    fn from(err: serde_json::Error) -> Self {
        Self::new(err.to_string())
    }
}

/// Errors related to the motion bridge.
#[derive(Debug, Clone, Error)]
pub enum BridgeError {
    /// The controller endpoint could not be reached.
    #[error("bridge connection failed ({host}): {reason}")]
    Connection {
        /// The controller host.
        host: String,
        /// The reason for failure.
        reason: String,
    },

    /// The bridge rejected or failed a command.
    #[error("bridge command '{command}' failed: {reason}")]
    Command {
        /// The command name.
        command: String,
        /// The reason for failure.
        reason: String,
    },

    /// The bridge replied with something that is not a valid response.
    #[error("bridge protocol error: {0}")]
    Protocol(String),

    /// No bridge implementation is available in this build.
    #[error("bridge_unavailable: {0}")]
    Unavailable(String),
}

impl BridgeError {
    /// Creates a connection error.
    #[must_use]
    pub fn connection(host: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Connection {
            host: host.into(),
            reason: reason.into(),
        }
    }

    /// Creates a command error.
    #[must_use]
    pub fn command(command: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Command {
            command: command.into(),
            reason: reason.into(),
        }
    }
}
