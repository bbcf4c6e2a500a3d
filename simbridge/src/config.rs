//! Bridge configuration.

use std::time::Duration;

use crate::hub::HubTransportConfig;
use crate::poll::{PollLoopConfig, DEFAULT_POLL_INTERVAL, DEFAULT_SAMPLE_TIMEOUT};

/// Default hub endpoint.
pub const DEFAULT_HUB_URL: &str = "ws://localhost:5233/flightsimhub";

/// Default host endpoint.
pub const DEFAULT_HOST_ADDR: &str = "127.0.0.1:49010";

/// Strip whitespace and surrounding quote characters from a raw token.
///
/// Tokens handed over by the login collaborator sometimes arrive still
/// wrapped in the quotes of their JSON response body.
pub fn trim_token(raw: &str) -> String {
    raw.trim().trim_matches('"').to_string()
}

/// Construction-time configuration of the bridge.
///
/// The hub address and bearer token are the only values the external
/// collaborator must supply; everything else has workable defaults.
#[derive(Debug, Clone)]
pub struct BridgeConfig {
    /// WebSocket endpoint of the remote hub.
    pub hub_url: String,

    /// Bearer token for the hub connection (already trimmed).
    pub access_token: String,

    /// UDP endpoint of the local host.
    pub host_addr: String,

    /// Interval between poll cycles.
    pub poll_interval: Duration,

    /// Bound on the wait for each cycle's telemetry answer.
    pub sample_timeout: Duration,

    /// Skip publishing while the simulation is paused.
    pub suppress_publish_while_paused: bool,

    /// Accept the historical one-bool brake payload.
    pub legacy_single_brake: bool,

    /// Reconnect attempts before the hub connection is abandoned.
    pub max_reconnect_attempts: u32,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            hub_url: DEFAULT_HUB_URL.to_string(),
            access_token: String::new(),
            host_addr: DEFAULT_HOST_ADDR.to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            sample_timeout: DEFAULT_SAMPLE_TIMEOUT,
            suppress_publish_while_paused: false,
            legacy_single_brake: true,
            max_reconnect_attempts: 10,
        }
    }
}

impl BridgeConfig {
    /// Create a configuration from the two collaborator-supplied values.
    ///
    /// The token is trimmed of whitespace and surrounding quotes here, once,
    /// so downstream code never sees the raw form.
    pub fn new(hub_url: impl Into<String>, raw_token: &str) -> Self {
        Self {
            hub_url: hub_url.into(),
            access_token: trim_token(raw_token),
            ..Self::default()
        }
    }

    /// Derive the hub transport configuration.
    pub fn hub(&self) -> HubTransportConfig {
        HubTransportConfig {
            hub_url: self.hub_url.clone(),
            access_token: self.access_token.clone(),
            max_reconnect_attempts: self.max_reconnect_attempts,
            ..HubTransportConfig::default()
        }
    }

    /// Derive the poll loop configuration.
    pub fn poll(&self) -> PollLoopConfig {
        PollLoopConfig {
            poll_interval: self.poll_interval,
            sample_timeout: self.sample_timeout,
            suppress_publish_while_paused: self.suppress_publish_while_paused,
        }
    }
}
