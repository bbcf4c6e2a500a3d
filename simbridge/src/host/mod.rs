//! Host session - the connection to the local simulation host.
//!
//! The host speaks an asynchronous, correlation-based protocol: reads are
//! requested and answered later on a callback, writes and events are
//! fire-and-forget. This module owns that whole surface:
//!
//! - [`registry`] - closed registry of struct/field/event identifiers
//! - [`protocol`] - the datagram codec behind the [`HostLink`] seam
//! - [`HostLink`] / [`UdpHostLink`] - the frame transport
//! - [`HostSession`] - definitions, reads, writes, events, callbacks

pub mod registry;

mod error;
mod link;
mod protocol;
mod session;

pub use error::HostError;
pub use link::{HostLink, UdpHostLink};
pub use protocol::{parse_datagram, HostDatagram, MAX_DATAGRAM_SIZE};
pub use registry::{FieldDef, FieldKind, HostEvent, StructId};
pub use session::HostSession;
