//! Bridge session capability contract and scoped-session helper.

use crate::errors::BridgeError;
use async_trait::async_trait;
use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// Reply to a motion command.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BridgeResponse {
    /// Explicit success flag, if the bridge sent one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ok: Option<bool>,
    /// Reported rail position.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<f64>,
    /// Alternate name some controllers use for the position.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_position: Option<f64>,
    /// Error reported by the bridge.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Any other fields, kept as-is.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl BridgeResponse {
    /// A bare successful reply.
    #[must_use]
    pub fn ok() -> Self {
        Self {
            ok: Some(true),
            ..Self::default()
        }
    }

    /// Sets the reported position.
    #[must_use]
    pub fn with_position(mut self, position: f64) -> Self {
        self.position = Some(position);
        self
    }

    /// Fills the position from `status` when the reply has none.
    #[must_use]
    pub fn merge_status(mut self, status: &BridgeStatus) -> Self {
        if self.position.is_none() {
            self.position = status.position;
        }
        self
    }
}

/// Rail state reported by the bridge.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BridgeStatus {
    /// Current rail position.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<f64>,
    /// Any other fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl BridgeStatus {
    /// A status reporting `position`.
    #[must_use]
    pub fn at(position: f64) -> Self {
        Self {
            position: Some(position),
            extra: Map::new(),
        }
    }
}

/// An open connection to the motion controller.
///
/// With `wait = true` a command returns only after the controller reports
/// the motion complete.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BridgeSession: Send {
    /// Moves the rail to an absolute position.
    async fn move_to(&mut self, target: f64, speed: f64, wait: bool) -> Result<BridgeResponse, BridgeError>;

    /// Returns the rail to its home position.
    async fn home(&mut self, speed: f64, wait: bool) -> Result<BridgeResponse, BridgeError>;

    /// Queries the current rail state.
    async fn status(&mut self) -> Result<BridgeStatus, BridgeError>;

    /// Disconnects. Calling it more than once is harmless.
    async fn close(&mut self) -> Result<(), BridgeError>;
}

/// Opens bridge sessions.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BridgeConnector: Send + Sync {
    /// Connects to the controller at `host`.
    async fn open(&self, host: &str) -> Result<Box<dyn BridgeSession>, BridgeError>;
}

/// Opens a session, runs `op` on it and always closes it.
///
/// A failed close is logged and does not replace the result of `op`.
pub async fn with_session<T, F>(
    connector: &dyn BridgeConnector,
    host: &str,
    op: F,
) -> Result<T, BridgeError>
where
    F: for<'s> FnOnce(&'s mut dyn BridgeSession) -> BoxFuture<'s, Result<T, BridgeError>>,
{
    let mut session = connector.open(host).await?;
    debug!(host, "Bridge session opened");

    let result = op(session.as_mut()).await;

    if let Err(e) = session.close().await {
        warn!(host, error = %e, "Bridge session close failed");
    } else {
        debug!(host, "Bridge session closed");
    }

    result
}
