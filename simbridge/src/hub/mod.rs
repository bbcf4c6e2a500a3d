//! Hub transport - the connection to the remote realtime hub.
//!
//! - [`HubTransport`] - connection lifecycle, publish, subscribe
//! - [`ConnectionState`] - the transport's lifecycle enumeration
//! - [`protocol`] - the JSON invocation frame format

pub mod protocol;

mod error;
mod state;
mod transport;

pub use error::HubError;
pub use protocol::{HubMessage, TELEMETRY_TARGET};
pub use state::ConnectionState;
pub use transport::{CommandHandler, HubTransport, HubTransportConfig};
