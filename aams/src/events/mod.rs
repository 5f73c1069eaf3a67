//! Event sink system.
//!
//! This module provides the emission infrastructure that carries progress
//! and terminal records out of the engine.

mod sink;

pub use sink::{
    CollectingEventSink, EventSink, JsonLinesEventSink, LoggingEventSink, TeeEventSink,
};
