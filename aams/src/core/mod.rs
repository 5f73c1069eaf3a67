//! Core domain model types.
//!
//! This module contains the fundamental types shared by both entry points:
//! - Workflow mode and stage status enums
//! - Stage outcome
//! - Wire events written to the event stream
//! - Loose JSON truthiness

pub mod event;
mod output;
mod status;
mod value;

pub use event::{
    CompleteEvent, CompletionStatus, ProgressEvent, RunSummary, WorkflowEvent,
};
pub use output::StageOutcome;
pub use status::{StageStatus, WorkflowMode};
pub use value::{display_value, is_truthy};
