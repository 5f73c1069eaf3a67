//! Motion bridge integration.
//!
//! This module provides:
//! - The bridge session capability contract and scoped-session helper
//! - The motion command executor
//! - An HTTP adapter for the bridge service (`http-bridge` feature)

pub mod executor;
#[cfg(feature = "http-bridge")]
pub mod http;
mod session;

pub use executor::{execute, MotionAction, MotionReport, MotionRequest};
#[cfg(feature = "http-bridge")]
pub use http::{HttpBridgeConnector, HttpBridgeSession};
pub use session::{with_session, BridgeConnector, BridgeResponse, BridgeSession, BridgeStatus};
#[cfg(test)]
pub(crate) use session::{MockBridgeConnector, MockBridgeSession};

/// Default bridge service port.
pub const DEFAULT_PORT: u16 = 8765;
/// Default per-request timeout in seconds. Covers the longest `wait = true` motion.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
