//! Error types for the hub transport.

use thiserror::Error;

/// Errors surfaced by the hub transport.
///
/// Only the initial connect reports an error to the caller; everything after
/// that (transient disconnects, dropped publishes) is absorbed locally and
/// logged per the bridge's error policy.
#[derive(Debug, Error)]
pub enum HubError {
    /// The initial connection attempt failed.
    #[error("failed to connect to hub: {0}")]
    Connect(String),
}
