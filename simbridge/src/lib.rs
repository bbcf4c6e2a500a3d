//! SimBridge - bidirectional bridge between a local flight simulator host
//! and a remote realtime hub.
//!
//! The bridge continuously polls the host for telemetry and republishes it
//! to the hub at a bounded rate, while remote commands arriving from the hub
//! are translated into host writes and command events. The host's native
//! protocol is asynchronous and correlation-based (a read is requested and
//! answered later on a callback), so every poll cycle pairs a request with a
//! bounded wait.
//!
//! # High-Level API
//!
//! The [`bridge`] module provides the facade wiring everything together:
//!
//! ```ignore
//! use simbridge::bridge::Bridge;
//! use simbridge::config::BridgeConfig;
//!
//! let config = BridgeConfig::new("ws://hub:5233/flightsimhub", raw_token);
//! let bridge = Bridge::start(config).await?;
//! // ... runs until shutdown
//! bridge.shutdown().await;
//! ```
//!
//! # Components
//!
//! - [`host`] - the host session: data definitions, reads, writes, events
//! - [`telemetry`] - samples, request correlation, pause detection
//! - [`poll`] - the outbound poll loop daemon
//! - [`hub`] - the hub transport: lifecycle, publish, subscribe
//! - [`router`] - inbound command routing to the host session

pub mod bridge;
pub mod config;
pub mod host;
pub mod hub;
pub mod logging;
pub mod poll;
pub mod router;
pub mod telemetry;

/// Version of the SimBridge library and CLI.
///
/// This is synchronized across all components in the workspace.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
