//! Event sink trait and implementations.

use crate::core::WorkflowEvent;
use crate::errors::AamsError;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::io::Write;
use std::sync::Arc;
use tracing::{debug, info, warn, Level};

/// Trait for sinks that receive workflow events.
///
/// The engine writes every progress and terminal record through a sink.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Emits an event, reporting delivery failures.
    async fn emit(&self, event: &WorkflowEvent) -> Result<(), AamsError>;

    /// Tries to emit an event without reporting failure.
    ///
    /// Errors are logged but suppressed.
    fn try_emit(&self, event: &WorkflowEvent);
}

/// Writes each event as one line of JSON and flushes after every line.
pub struct JsonLinesEventSink {
    writer: Mutex<Box<dyn Write + Send>>,
}

impl JsonLinesEventSink {
    /// Creates a sink over an arbitrary writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    /// Creates a sink writing to stdout.
    #[must_use]
    pub fn stdout() -> Self {
        Self::new(Box::new(std::io::stdout()))
    }

    fn write_line(&self, event: &WorkflowEvent) -> Result<(), AamsError> {
        let line = event.to_json_line()?;
        let mut writer = self.writer.lock();
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    }
}

impl std::fmt::Debug for JsonLinesEventSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonLinesEventSink").finish_non_exhaustive()
    }
}

#[async_trait]
impl EventSink for JsonLinesEventSink {
    async fn emit(&self, event: &WorkflowEvent) -> Result<(), AamsError> {
        self.write_line(event)
    }

    fn try_emit(&self, event: &WorkflowEvent) {
        if let Err(e) = self.write_line(event) {
            warn!(error = %e, stage = event.stage(), "Failed to write event");
        }
    }
}

/// An event sink that logs events using the tracing framework.
#[derive(Debug, Clone)]
pub struct LoggingEventSink {
    /// The log level to use.
    level: Level,
}

impl Default for LoggingEventSink {
    fn default() -> Self {
        Self { level: Level::INFO }
    }
}

impl LoggingEventSink {
    /// Creates a new logging event sink with the specified level.
    #[must_use]
    pub const fn new(level: Level) -> Self {
        Self { level }
    }

    /// Creates a debug-level logging sink.
    #[must_use]
    pub const fn debug() -> Self {
        Self::new(Level::DEBUG)
    }

    fn log_event(&self, event: &WorkflowEvent) {
        if self.level == Level::DEBUG {
            debug!(stage = event.stage(), terminal = event.is_terminal(), event = ?event, "Event");
        } else {
            info!(stage = event.stage(), terminal = event.is_terminal(), event = ?event, "Event");
        }
    }
}

#[async_trait]
impl EventSink for LoggingEventSink {
    async fn emit(&self, event: &WorkflowEvent) -> Result<(), AamsError> {
        self.log_event(event);
        Ok(())
    }

    fn try_emit(&self, event: &WorkflowEvent) {
        self.log_event(event);
    }
}

/// Writes to a primary sink and mirrors every event to a secondary one.
///
/// Only the primary sink's failures are reported. The mirror is fed through
/// `try_emit`.
pub struct TeeEventSink {
    primary: Arc<dyn EventSink>,
    mirror: Arc<dyn EventSink>,
}

impl TeeEventSink {
    /// Creates a tee over two sinks.
    #[must_use]
    pub fn new(primary: Arc<dyn EventSink>, mirror: Arc<dyn EventSink>) -> Self {
        Self { primary, mirror }
    }

    /// Mirrors `primary` into debug-level tracing.
    #[must_use]
    pub fn with_logging(primary: Arc<dyn EventSink>) -> Self {
        Self::new(primary, Arc::new(LoggingEventSink::debug()))
    }
}

impl std::fmt::Debug for TeeEventSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TeeEventSink").finish_non_exhaustive()
    }
}

#[async_trait]
impl EventSink for TeeEventSink {
    async fn emit(&self, event: &WorkflowEvent) -> Result<(), AamsError> {
        self.mirror.try_emit(event);
        self.primary.emit(event).await
    }

    fn try_emit(&self, event: &WorkflowEvent) {
        self.mirror.try_emit(event);
        self.primary.try_emit(event);
    }
}

/// A collecting event sink for testing purposes.
#[derive(Debug, Default)]
pub struct CollectingEventSink {
    events: Mutex<Vec<WorkflowEvent>>,
}

impl CollectingEventSink {
    /// Creates a new collecting sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all collected events.
    #[must_use]
    pub fn events(&self) -> Vec<WorkflowEvent> {
        self.events.lock().clone()
    }

    /// Returns the stage names of all collected events, in order.
    #[must_use]
    pub fn stages(&self) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .map(|e| e.stage().to_string())
            .collect()
    }

    /// Returns the number of collected events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    /// Returns true if no events have been collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    /// Returns the last collected event.
    #[must_use]
    pub fn last(&self) -> Option<WorkflowEvent> {
        self.events.lock().last().cloned()
    }
}

#[async_trait]
impl EventSink for CollectingEventSink {
    async fn emit(&self, event: &WorkflowEvent) -> Result<(), AamsError> {
        self.events.lock().push(event.clone());
        Ok(())
    }

    fn try_emit(&self, event: &WorkflowEvent) {
        self.events.lock().push(event.clone());
    }
}
