//! Request context for workflow execution.
//!
//! This module provides:
//! - Parsing of the stdin payload into a typed request
//! - Mode normalization shared by every caller

mod request;

pub use request::{normalize_mode, SimulateConfig, WorkflowRequest};
