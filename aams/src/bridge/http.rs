//! HTTP adapter for the rail motion bridge.
//!
//! Talks JSON to a bridge service at `http://{host}:{port}`:
//!
//! | call       | request                                     |
//! |------------|---------------------------------------------|
//! | `move_to`  | `POST /rail/move` `{position, speed, wait}` |
//! | `home`     | `POST /rail/home` `{speed, wait}`           |
//! | `status`   | `GET /rail/status`                          |
//!
//! Opening a session issues one status request to prove the bridge is
//! reachable.

use super::session::{BridgeConnector, BridgeResponse, BridgeSession, BridgeStatus};
use super::{DEFAULT_PORT, DEFAULT_TIMEOUT_SECS};
use crate::errors::BridgeError;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

/// Opens HTTP bridge sessions.
#[derive(Debug, Clone)]
pub struct HttpBridgeConnector {
    port: u16,
    timeout: Duration,
}

impl Default for HttpBridgeConnector {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl HttpBridgeConnector {
    /// Creates a connector with the default port and timeout.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the port.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the per-request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn base_url(&self, host: &str) -> String {
        if host.starts_with("http://") || host.starts_with("https://") {
            host.trim_end_matches('/').to_string()
        } else {
            format!("http://{host}:{}", self.port)
        }
    }
}

#[async_trait]
impl BridgeConnector for HttpBridgeConnector {
    async fn open(&self, host: &str) -> Result<Box<dyn BridgeSession>, BridgeError> {
        let client = reqwest::Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|e| BridgeError::connection(host, e.to_string()))?;

        let mut session = HttpBridgeSession {
            client,
            base_url: self.base_url(host),
            closed: false,
        };
        session
            .status()
            .await
            .map_err(|e| BridgeError::connection(host, e.to_string()))?;

        debug!(base_url = %session.base_url, "HTTP bridge reachable");
        Ok(Box::new(session))
    }
}

/// A session against an HTTP bridge service.
#[derive(Debug)]
pub struct HttpBridgeSession {
    client: reqwest::Client,
    base_url: String,
    closed: bool,
}

impl HttpBridgeSession {
    fn ensure_open(&self, command: &str) -> Result<(), BridgeError> {
        if self.closed {
            Err(BridgeError::command(command, "session closed"))
        } else {
            Ok(())
        }
    }

    async fn send<T: DeserializeOwned>(
        &self,
        command: &str,
        request: reqwest::RequestBuilder,
    ) -> Result<T, BridgeError> {
        self.ensure_open(command)?;

        let response = request
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(|e| BridgeError::command(command, e.to_string()))?;

        response
            .json::<T>()
            .await
            .map_err(|e| BridgeError::Protocol(format!("{command}: {e}")))
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

#[async_trait]
impl BridgeSession for HttpBridgeSession {
    async fn move_to(&mut self, target: f64, speed: f64, wait: bool) -> Result<BridgeResponse, BridgeError> {
        let body = serde_json::json!({"position": target, "speed": speed, "wait": wait});
        let request = self.client.post(self.url("/rail/move")).json(&body);
        self.send("move_to", request).await
    }

    async fn home(&mut self, speed: f64, wait: bool) -> Result<BridgeResponse, BridgeError> {
        let body = serde_json::json!({"speed": speed, "wait": wait});
        let request = self.client.post(self.url("/rail/home")).json(&body);
        self.send("home", request).await
    }

    async fn status(&mut self) -> Result<BridgeStatus, BridgeError> {
        let request = self.client.get(self.url("/rail/status"));
        self.send("status", request).await
    }

    async fn close(&mut self) -> Result<(), BridgeError> {
        self.closed = true;
        Ok(())
    }
}
