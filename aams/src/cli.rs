//! Command-line front ends for the two binaries.
//!
//! The binaries are thin: they parse flags, set up tracing and hand off to
//! [`run_simulator`] or [`run_rail`], which own every exit-code decision.

use crate::bridge::executor::{DEFAULT_HOST, DEFAULT_POSITION, DEFAULT_SPEED};
use crate::bridge::{execute, BridgeConnector, MotionAction, MotionReport, MotionRequest};
use crate::bridge::{DEFAULT_PORT, DEFAULT_TIMEOUT_SECS};
use crate::context::WorkflowRequest;
use crate::core::CompleteEvent;
use crate::errors::{BridgeError, PayloadError, EXIT_INPUT_ERROR};
use crate::events::EventSink;
use crate::observability::{log_report, LogFormat, SpanTimer};
use crate::pipeline::{EngineConfig, WorkflowEngine};
use clap::Parser;
use std::io::{Read, Write};
use tracing::{error, warn};

/// Runs the station workflow for one request read from stdin.
#[derive(Debug, Parser)]
#[command(name = "aams-simulator", version, about)]
pub struct SimulatorArgs {
    /// Seed for the simulated delays.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Emit diagnostics on stderr as JSON.
    #[arg(long)]
    pub log_json: bool,
}

impl SimulatorArgs {
    /// Engine configuration with the default timing.
    #[must_use]
    pub fn engine_config(&self) -> EngineConfig {
        let config = EngineConfig::new();
        match self.seed {
            Some(seed) => config.with_seed(seed),
            None => config,
        }
    }

    /// Selected log format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        log_format(self.log_json)
    }
}

/// Sends one motion command to the rail controller.
#[derive(Debug, Parser)]
#[command(name = "aams-rail", version, about)]
pub struct RailArgs {
    /// Command to run.
    #[arg(long, value_enum)]
    pub action: MotionAction,

    /// Controller host.
    #[arg(long, default_value = DEFAULT_HOST)]
    pub host: String,

    /// Target position for extend and position.
    #[arg(long, default_value_t = DEFAULT_POSITION)]
    pub position: f64,

    /// Rail speed.
    #[arg(long, default_value_t = DEFAULT_SPEED)]
    pub speed: f64,

    /// Bridge service port.
    #[arg(long, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Per-request timeout in seconds.
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout_secs: u64,

    /// Emit diagnostics on stderr as JSON.
    #[arg(long)]
    pub log_json: bool,
}

impl RailArgs {
    /// The motion request described by the flags.
    #[must_use]
    pub fn request(&self) -> MotionRequest {
        MotionRequest::new(self.action)
            .with_host(self.host.clone())
            .with_position(self.position)
            .with_speed(self.speed)
    }

    /// Selected log format.
    #[must_use]
    pub const fn log_format(&self) -> LogFormat {
        log_format(self.log_json)
    }

    /// Builds the bridge connector for these flags.
    #[cfg(feature = "http-bridge")]
    pub fn connector(&self) -> Result<Box<dyn BridgeConnector>, BridgeError> {
        let connector = crate::bridge::HttpBridgeConnector::new()
            .with_port(self.port)
            .with_timeout(std::time::Duration::from_secs(self.timeout_secs));
        Ok(Box::new(connector))
    }

    /// Builds the bridge connector for these flags.
    #[cfg(not(feature = "http-bridge"))]
    pub fn connector(&self) -> Result<Box<dyn BridgeConnector>, BridgeError> {
        Err(BridgeError::Unavailable(
            "built without the http-bridge feature".to_string(),
        ))
    }
}

const fn log_format(json: bool) -> LogFormat {
    if json {
        LogFormat::Json
    } else {
        LogFormat::Pretty
    }
}

/// Reads one request from `input`, runs it on `engine` and returns the exit
/// code.
///
/// Malformed input produces a single `payload` error record on `sink`. An
/// internal fault produces a best-effort `internal` record.
pub async fn run_simulator<R: Read>(mut input: R, mut engine: WorkflowEngine, sink: &dyn EventSink) -> i32 {
    let mut raw = String::new();
    let parsed = input
        .read_to_string(&mut raw)
        .map_err(|e| PayloadError::new(e.to_string()))
        .and_then(|_| WorkflowRequest::parse(&raw));

    let request = match parsed {
        Ok(request) => request,
        Err(e) => {
            warn!(error = %e, "Rejected request payload");
            sink.try_emit(&CompleteEvent::payload_error(e.to_string()).into());
            return EXIT_INPUT_ERROR;
        }
    };

    match engine.run(&request).await {
        Ok(report) => {
            log_report(&report);
            report.exit_code()
        }
        Err(e) => {
            error!(error = %e, "Workflow aborted");
            sink.try_emit(&CompleteEvent::internal_error(e.to_string(), Some(request.mode)).into());
            e.exit_code()
        }
    }
}

/// Executes one motion command and writes its report line to `out`.
pub async fn run_rail<W: Write>(
    connector: Result<Box<dyn BridgeConnector>, BridgeError>,
    request: &MotionRequest,
    out: &mut W,
) -> i32 {
    let timer = SpanTimer::start(format!("rail.{}", request.action));
    let report = match connector {
        Ok(connector) => execute(connector.as_ref(), request).await,
        Err(e) => {
            warn!(error = %e, "No bridge connector");
            MotionReport::failed(request, &e)
        }
    };
    timer.finish();

    match write_report(&report, out) {
        Ok(()) => report.exit_code(),
        Err(e) => {
            error!(error = %e, "Failed to write motion report");
            EXIT_INPUT_ERROR
        }
    }
}

fn write_report<W: Write>(report: &MotionReport, out: &mut W) -> std::io::Result<()> {
    let line = report.to_json_line()?;
    writeln!(out, "{line}")?;
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::{BridgeResponse, BridgeStatus, MockBridgeConnector, MockBridgeSession};
    use crate::core::WorkflowEvent;
    use crate::events::{CollectingEventSink, JsonLinesEventSink};
    use crate::pipeline::TimingConfig;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::sync::Arc;

    fn engine(sink: Arc<dyn EventSink>) -> WorkflowEngine {
        let config = EngineConfig::new().with_timing(TimingConfig::instant());
        WorkflowEngine::new(&config, sink)
    }

    #[test]
    fn test_simulator_args() {
        let args = SimulatorArgs::parse_from(["aams-simulator", "--seed", "7", "--log-json"]);
        assert_eq!(args.engine_config().seed, Some(7));
        assert_eq!(args.log_format(), LogFormat::Json);

        let args = SimulatorArgs::parse_from(["aams-simulator"]);
        assert_eq!(args.engine_config(), EngineConfig::new());
        assert_eq!(args.log_format(), LogFormat::Pretty);
    }

    #[test]
    fn test_rail_args_defaults() {
        let args = RailArgs::parse_from(["aams-rail", "--action", "home"]);

        assert_eq!(args.request(), MotionRequest::new(MotionAction::Home));
        assert_eq!(args.port, 8765);
        assert_eq!(args.timeout_secs, 30);
    }

    #[test]
    fn test_rail_args_rejects_unknown_action() {
        assert!(RailArgs::try_parse_from(["aams-rail", "--action", "spin"]).is_err());
        assert!(RailArgs::try_parse_from(["aams-rail"]).is_err());
    }

    #[tokio::test]
    async fn test_simulator_success_exit_code() {
        let sink = Arc::new(CollectingEventSink::new());
        let code = run_simulator(
            r#"{"mode":"dispatch","requestId":"D1"}"#.as_bytes(),
            engine(sink.clone()),
            &*sink,
        )
        .await;

        assert_eq!(code, 0);
        assert_eq!(sink.len(), 6);
    }

    #[tokio::test]
    async fn test_simulator_workflow_failure_exit_code() {
        let sink = Arc::new(CollectingEventSink::new());
        let code = run_simulator(
            r#"{"mode":"return","simulate":{"fail_stage":"prepare"}}"#.as_bytes(),
            engine(sink.clone()),
            &*sink,
        )
        .await;

        assert_eq!(code, 2);
    }

    #[tokio::test]
    async fn test_simulator_invalid_json() {
        let sink = Arc::new(CollectingEventSink::new());
        let code = run_simulator("{oops".as_bytes(), engine(sink.clone()), &*sink).await;

        assert_eq!(code, 1);
        assert_eq!(sink.len(), 1);
        let Some(WorkflowEvent::Complete(event)) = sink.last() else {
            panic!("expected a terminal event");
        };
        assert_eq!(event.stage, "payload");
        assert!(event.message.starts_with("유효하지 않은 JSON 입력: "));
        assert_eq!(event.mode, None);
    }

    #[tokio::test]
    async fn test_simulator_write_failure_is_internal_error() {
        struct Closed;

        impl Write for Closed {
            fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
                Err(std::io::Error::from(std::io::ErrorKind::BrokenPipe))
            }

            fn flush(&mut self) -> std::io::Result<()> {
                Ok(())
            }
        }

        let sink = Arc::new(JsonLinesEventSink::new(Box::new(Closed)));
        let code = run_simulator("{}".as_bytes(), engine(sink.clone()), &*sink).await;

        assert_eq!(code, 1);
    }

    #[tokio::test]
    async fn test_rail_writes_one_line() {
        let mut session = MockBridgeSession::new();
        session
            .expect_home()
            .returning(|_, _| Ok(BridgeResponse::ok()));
        session.expect_status().returning(|| Ok(BridgeStatus::at(0.0)));
        session.expect_close().returning(|| Ok(()));
        let mut connector = MockBridgeConnector::new();
        connector
            .expect_open()
            .return_once(move |_| Ok(Box::new(session)));

        let mut out = Vec::new();
        let request = MotionRequest::new(MotionAction::Home).with_speed(150.0);
        let code = run_rail(Ok(Box::new(connector)), &request, &mut out).await;

        assert_eq!(code, 0);
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().count(), 1);
        let value: serde_json::Value = serde_json::from_str(text.trim_end()).unwrap();
        assert_eq!(
            value,
            json!({"action":"home","position":0.0,"speed":150.0,"ok":true})
        );
    }

    #[tokio::test]
    async fn test_rail_without_connector() {
        let mut out = Vec::new();
        let request = MotionRequest::new(MotionAction::Extend);
        let code = run_rail(
            Err(BridgeError::Unavailable("no adapter".to_string())),
            &request,
            &mut out,
        )
        .await;

        assert_eq!(code, 1);
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["ok"], false);
        assert_eq!(value["error"], "bridge_unavailable: no adapter");
        assert_eq!(value["position"], 800.0);
    }
}
