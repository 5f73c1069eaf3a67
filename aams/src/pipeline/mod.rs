//! Workflow execution.
//!
//! This module provides:
//! - The stage engine that walks a mode's stage list
//! - Simulated delay ranges and the sleeper seam
//! - Run reports

mod engine;
#[cfg(test)]
mod integration_tests;
mod timing;

pub use engine::{EngineConfig, WorkflowEngine, WorkflowOutcome, WorkflowReport};
pub use timing::{DelayRange, RecordingSleeper, Sleeper, TimingConfig, TokioSleeper};
