//! Motion command executor.
//!
//! Translates one rail command into bridge calls and flattens the outcome
//! into a single report record.

use super::session::{with_session, BridgeConnector, BridgeResponse};
use crate::errors::{BridgeError, EXIT_INPUT_ERROR, EXIT_SUCCESS};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use tracing::{info, warn};

/// Default target position for move commands.
pub const DEFAULT_POSITION: f64 = 800.0;
/// Default rail speed.
pub const DEFAULT_SPEED: f64 = 200.0;
/// Default controller host.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Report fields that bridge extras may not overwrite.
const RESERVED_FIELDS: &[&str] = &["action", "position", "speed", "ok", "error", "current_position"];

/// A discrete rail command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum MotionAction {
    /// Extend the rail to the target position.
    Extend,
    /// Return the rail to home.
    Home,
    /// Move the rail to the target position.
    Position,
}

impl fmt::Display for MotionAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Extend => write!(f, "extend"),
            Self::Home => write!(f, "home"),
            Self::Position => write!(f, "position"),
        }
    }
}

/// One motion command to execute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotionRequest {
    /// What to do.
    pub action: MotionAction,
    /// Controller host.
    pub host: String,
    /// Target position for move commands.
    pub position: f64,
    /// Rail speed.
    pub speed: f64,
}

impl MotionRequest {
    /// Creates a request with the default host, position and speed.
    #[must_use]
    pub fn new(action: MotionAction) -> Self {
        Self {
            action,
            host: DEFAULT_HOST.to_string(),
            position: DEFAULT_POSITION,
            speed: DEFAULT_SPEED,
        }
    }

    /// Sets the host.
    #[must_use]
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Sets the target position.
    #[must_use]
    pub fn with_position(mut self, position: f64) -> Self {
        self.position = position;
        self
    }

    /// Sets the speed.
    #[must_use]
    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = speed;
        self
    }
}

/// The single output record of a motion command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MotionReport {
    /// The requested action.
    pub action: MotionAction,
    /// Reported position, or the requested one when nothing was reported.
    pub position: f64,
    /// The requested speed.
    pub speed: f64,
    /// Whether the command succeeded.
    pub ok: bool,
    /// Failure message.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Position under the controller's alternate field name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_position: Option<f64>,
    /// Extra fields reported by the bridge.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MotionReport {
    /// Builds the report for a command the bridge answered.
    ///
    /// Position precedence: reply, then status (already merged into the
    /// reply), then `current_position`, then the requested value.
    #[must_use]
    pub fn from_response(request: &MotionRequest, response: BridgeResponse) -> Self {
        let mut extra = response.extra;
        extra.retain(|k, _| !RESERVED_FIELDS.contains(&k.as_str()));

        Self {
            action: request.action,
            position: response
                .position
                .or(response.current_position)
                .unwrap_or(request.position),
            speed: request.speed,
            ok: response.ok.unwrap_or(true),
            error: response.error,
            current_position: response.current_position,
            extra,
        }
    }

    /// Builds the report for a command that raised a bridge error.
    #[must_use]
    pub fn failed(request: &MotionRequest, error: &BridgeError) -> Self {
        Self {
            action: request.action,
            position: request.position,
            speed: request.speed,
            ok: false,
            error: Some(error.to_string()),
            current_position: None,
            extra: Map::new(),
        }
    }

    /// Returns the process exit code for this report.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        if self.ok {
            EXIT_SUCCESS
        } else {
            EXIT_INPUT_ERROR
        }
    }

    /// Encodes the report as one line of JSON.
    pub fn to_json_line(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Runs `request` against a session opened through `connector`.
///
/// Never returns an error: bridge faults land in the report with
/// `ok = false`.
pub async fn execute(connector: &dyn BridgeConnector, request: &MotionRequest) -> MotionReport {
    let MotionRequest {
        action,
        position,
        speed,
        ..
    } = *request;

    info!(%action, host = %request.host, position, speed, "Executing motion command");

    let result = with_session(connector, &request.host, move |session| {
        Box::pin(async move {
            let response = match action {
                MotionAction::Home => session.home(speed, true).await?,
                MotionAction::Extend | MotionAction::Position => {
                    session.move_to(position, speed, true).await?
                }
            };
            let status = session.status().await?;
            Ok::<_, BridgeError>(response.merge_status(&status))
        })
    })
    .await;

    match result {
        Ok(response) => {
            let report = MotionReport::from_response(request, response);
            info!(ok = report.ok, position = report.position, "Motion command finished");
            report
        }
        Err(e) => {
            warn!(error = %e, "Motion command failed");
            MotionReport::failed(request, &e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::session::{BridgeStatus, MockBridgeConnector, MockBridgeSession};
    use mockall::predicate::eq;
    use pretty_assertions::assert_eq;

    fn connector_with(session: MockBridgeSession) -> MockBridgeConnector {
        let mut connector = MockBridgeConnector::new();
        connector
            .expect_open()
            .with(eq("rail-host"))
            .times(1)
            .return_once(move |_| Ok(Box::new(session)));
        connector
    }

    fn request(action: MotionAction) -> MotionRequest {
        MotionRequest::new(action).with_host("rail-host")
    }

    #[tokio::test]
    async fn test_home_reports_status_position() {
        let mut session = MockBridgeSession::new();
        session
            .expect_home()
            .with(eq(150.0), eq(true))
            .times(1)
            .returning(|_, _| Ok(BridgeResponse::default()));
        session.expect_status().returning(|| Ok(BridgeStatus::at(0.0)));
        session.expect_close().times(1).returning(|| Ok(()));

        let report = execute(&connector_with(session), &request(MotionAction::Home).with_speed(150.0)).await;

        assert!(report.ok);
        assert_eq!(report.position, 0.0);
        assert_eq!(report.exit_code(), 0);

        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"action": "home", "position": 0.0, "speed": 150.0, "ok": true})
        );
    }

    #[tokio::test]
    async fn test_extend_and_position_both_move() {
        for action in [MotionAction::Extend, MotionAction::Position] {
            let mut session = MockBridgeSession::new();
            session
                .expect_move_to()
                .with(eq(640.0), eq(200.0), eq(true))
                .times(1)
                .returning(|target, _, _| Ok(BridgeResponse::ok().with_position(target)));
            session.expect_status().returning(|| Ok(BridgeStatus::at(1.0)));
            session.expect_close().times(1).returning(|| Ok(()));

            let report = execute(&connector_with(session), &request(action).with_position(640.0)).await;

            assert!(report.ok);
            assert_eq!(report.position, 640.0);
        }
    }

    #[tokio::test]
    async fn test_explicit_not_ok_is_kept() {
        let mut session = MockBridgeSession::new();
        session.expect_move_to().returning(|_, _, _| {
            Ok(BridgeResponse {
                ok: Some(false),
                error: Some("limit switch".to_string()),
                ..BridgeResponse::default()
            })
        });
        session.expect_status().returning(|| Ok(BridgeStatus::default()));
        session.expect_close().times(1).returning(|| Ok(()));

        let report = execute(&connector_with(session), &request(MotionAction::Position)).await;

        assert!(!report.ok);
        assert_eq!(report.error.as_deref(), Some("limit switch"));
        assert_eq!(report.position, DEFAULT_POSITION);
        assert_eq!(report.exit_code(), 1);
    }

    #[tokio::test]
    async fn test_current_position_alias() {
        let mut session = MockBridgeSession::new();
        session.expect_move_to().returning(|_, _, _| {
            Ok(BridgeResponse {
                current_position: Some(799.5),
                ..BridgeResponse::default()
            })
        });
        session.expect_status().returning(|| Ok(BridgeStatus::default()));
        session.expect_close().returning(|| Ok(()));

        let report = execute(&connector_with(session), &request(MotionAction::Extend)).await;

        assert_eq!(report.position, 799.5);
        assert_eq!(report.current_position, Some(799.5));
    }

    #[tokio::test]
    async fn test_command_error_still_closes() {
        let mut session = MockBridgeSession::new();
        session
            .expect_move_to()
            .returning(|_, _, _| Err(BridgeError::command("move_to", "servo fault")));
        session.expect_close().times(1).returning(|| Ok(()));

        let report = execute(&connector_with(session), &request(MotionAction::Extend)).await;

        assert!(!report.ok);
        assert!(report.error.unwrap().contains("servo fault"));
    }

    #[tokio::test]
    async fn test_connection_error() {
        let mut connector = MockBridgeConnector::new();
        connector
            .expect_open()
            .returning(|host| Err(BridgeError::connection(host, "connection refused")));

        let report = execute(&connector, &request(MotionAction::Home)).await;

        assert!(!report.ok);
        assert_eq!(report.position, DEFAULT_POSITION);
        assert_eq!(report.speed, DEFAULT_SPEED);
        assert!(report.error.as_deref().unwrap().contains("connection refused"));
        assert_eq!(report.exit_code(), 1);
    }

    #[test]
    fn test_extras_cannot_shadow_report_fields() {
        let mut response = BridgeResponse::ok().with_position(5.0);
        response.extra.insert("action".to_string(), serde_json::json!("bogus"));
        response.extra.insert("temperature".to_string(), serde_json::json!(41));

        let report = MotionReport::from_response(&request(MotionAction::Home), response);
        let line = report.to_json_line().unwrap();

        assert_eq!(line.matches("\"action\"").count(), 1);
        assert!(line.contains("\"temperature\":41"));
    }
}
