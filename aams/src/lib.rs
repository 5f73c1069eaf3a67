//! # AAMS
//!
//! Control plane for the AAMS equipment dispatch/return station.
//!
//! The crate provides:
//!
//! - **Stage engine**: runs a dispatch or return request through its fixed
//!   stage list and vision checks, with simulated delays and failure injection
//! - **Event stream**: newline-delimited JSON progress records ending in a
//!   single terminal record
//! - **Motion bridge**: one-shot rail commands over a scoped bridge session
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use aams::prelude::*;
//! use std::sync::Arc;
//!
//! let request = WorkflowRequest::parse(r#"{"mode":"return","requestId":"R1"}"#)?;
//! let sink = Arc::new(JsonLinesEventSink::stdout());
//! let report = WorkflowEngine::new(&EngineConfig::new(), sink)
//!     .run(&request)
//!     .await?;
//! std::process::exit(report.exit_code());
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod bridge;
pub mod cli;
pub mod context;
pub mod core;
pub mod errors;
pub mod events;
pub mod observability;
pub mod pipeline;
pub mod stages;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::bridge::{
        execute, with_session, BridgeConnector, BridgeSession, MotionAction, MotionReport,
        MotionRequest,
    };
    pub use crate::context::{SimulateConfig, WorkflowRequest};
    pub use crate::core::{CompleteEvent, ProgressEvent, StageOutcome, WorkflowEvent, WorkflowMode};
    pub use crate::errors::{AamsError, BridgeError, PayloadError};
    pub use crate::events::{
        CollectingEventSink, EventSink, JsonLinesEventSink, LoggingEventSink, TeeEventSink,
    };
    pub use crate::pipeline::{EngineConfig, TimingConfig, WorkflowEngine, WorkflowReport};
    pub use crate::stages::{StageResult, StageTemplate};
}
