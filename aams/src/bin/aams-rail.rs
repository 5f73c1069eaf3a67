//! Rail motion command line tool.
//!
//! Sends one command to the rail controller and prints a single JSON report.

use aams::cli::{run_rail, RailArgs};
use aams::observability::init_tracing;
use clap::Parser;
use std::process::ExitCode;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = RailArgs::parse();
    if let Err(e) = init_tracing(args.log_format()) {
        eprintln!("tracing setup failed: {e:#}");
    }

    let request = args.request();
    let code = run_rail(args.connector(), &request, &mut std::io::stdout().lock()).await;

    ExitCode::from(u8::try_from(code).unwrap_or(1))
}
