//! Station workflow simulator.
//!
//! Reads one JSON request from stdin and streams progress events to stdout.

use aams::cli::{run_simulator, SimulatorArgs};
use aams::events::{JsonLinesEventSink, TeeEventSink};
use aams::observability::init_tracing;
use aams::pipeline::WorkflowEngine;
use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = SimulatorArgs::parse();
    if let Err(e) = init_tracing(args.log_format()) {
        eprintln!("tracing setup failed: {e:#}");
    }

    let sink = Arc::new(TeeEventSink::with_logging(Arc::new(JsonLinesEventSink::stdout())));
    let engine = WorkflowEngine::new(&args.engine_config(), sink.clone());
    let code = run_simulator(std::io::stdin().lock(), engine, &*sink).await;

    ExitCode::from(u8::try_from(code).unwrap_or(1))
}
