//! Observability utilities.

mod tracing;

pub use self::tracing::{init_tracing, log_report, LogFormat, SpanTimer};
