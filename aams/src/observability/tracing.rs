//! Tracing setup and timing helpers.
//!
//! Diagnostics always go to stderr. Stdout is reserved for the event stream
//! and the motion report.

use crate::pipeline::{WorkflowOutcome, WorkflowReport};
use std::time::Instant;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Log line format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Pretty,
    /// One JSON object per line.
    Json,
}

/// Installs the global subscriber.
///
/// The filter comes from `RUST_LOG` and defaults to `warn`. Calling this
/// twice is an error.
pub fn init_tracing(format: LogFormat) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()?,
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_writer(std::io::stderr),
            )
            .try_init()?,
    }

    Ok(())
}

/// Simple span timing helper.
#[derive(Debug)]
pub struct SpanTimer {
    start: Instant,
    name: String,
}

impl SpanTimer {
    /// Starts a new span timer.
    #[must_use]
    pub fn start(name: impl Into<String>) -> Self {
        Self {
            start: Instant::now(),
            name: name.into(),
        }
    }

    /// Returns the elapsed time in milliseconds.
    #[must_use]
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }

    /// Logs the elapsed time and returns it.
    pub fn finish(self) -> f64 {
        let duration_ms = self.elapsed_ms();
        tracing::debug!(span_name = %self.name, duration_ms, "Span finished");
        duration_ms
    }
}

/// Logs one line per stage of a finished run, then a summary line.
pub fn log_report(report: &WorkflowReport) {
    for stage in &report.stages {
        tracing::debug!(
            run_id = %report.run_id,
            stage = %stage.name,
            status = %stage.status,
            duration_ms = stage.duration_ms(),
            error = stage.error.as_deref(),
            "Stage record"
        );
    }

    match &report.outcome {
        WorkflowOutcome::Succeeded => tracing::info!(
            run_id = %report.run_id,
            mode = %report.mode,
            "Workflow succeeded"
        ),
        WorkflowOutcome::Failed { stage, message } => tracing::warn!(
            run_id = %report.run_id,
            mode = %report.mode,
            stage = %stage,
            message = %message,
            "Workflow failed"
        ),
    }
}
