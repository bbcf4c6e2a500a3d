//! Error types for the host session.

use thiserror::Error;

/// Errors raised by the host link and session.
#[derive(Debug, Error)]
pub enum HostError {
    /// The host endpoint could not be reached at startup.
    #[error("failed to reach host at {addr}: {source}")]
    Unreachable {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// A datagram could not be handed to the socket.
    #[error("failed to send to host: {0}")]
    Send(String),
}
