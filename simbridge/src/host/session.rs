//! Host session - data definitions, reads, writes, and callbacks.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::error::HostError;
use super::link::HostLink;
use super::protocol::{self, HostDatagram};
use super::registry::{HostEvent, StructId};
use crate::telemetry::{TelemetryCorrelator, TelemetrySample};

/// Client name announced to the host during the handshake.
const CLIENT_NAME: &str = "SimBridge";

/// Owns the connection to the host.
///
/// One instance is shared by the poll loop (reads) and the command router
/// (writes and events); the underlying link tolerates concurrent calls
/// without further coordination. Writes and events are fire-and-forget:
/// failures are logged and abandoned, never retried - the host's own
/// exception channel is the only confirmation surface.
pub struct HostSession {
    link: Arc<dyn HostLink>,
    correlator: TelemetryCorrelator,
    opened: AtomicBool,
}

impl HostSession {
    /// Create a session over an established link.
    pub fn new(link: Arc<dyn HostLink>) -> Self {
        Self {
            link,
            correlator: TelemetryCorrelator::new(),
            opened: AtomicBool::new(false),
        }
    }

    /// Register every struct field with the host and announce the client.
    ///
    /// Must run before any read or write. A send failure here is a fatal
    /// configuration error: the bridge must not start its poll loop against
    /// a host that could not accept the definitions.
    pub fn define_all(&self) -> Result<(), HostError> {
        self.link.send(protocol::encode_hello(CLIENT_NAME))?;

        let mut registered = 0usize;
        for &struct_id in StructId::ALL {
            for field in struct_id.fields() {
                self.link.send(protocol::encode_define(struct_id, field))?;
                registered += 1;
            }
        }

        debug!(
            structs = StructId::ALL.len(),
            fields = registered,
            "host data definitions registered"
        );
        Ok(())
    }

    /// Issue an asynchronous telemetry read.
    ///
    /// Returns the receiver for this request's answer; pair it with
    /// [`TelemetryCorrelator::await_sample`] to bound the wait. The answer
    /// arrives later on the host's callback context, never synchronously.
    pub fn request_telemetry(&self) -> Result<oneshot::Receiver<TelemetrySample>, HostError> {
        let (request_id, rx) = self.correlator.begin();
        self.link
            .send(protocol::encode_read(request_id, StructId::Telemetry))?;
        Ok(rx)
    }

    /// Write values to a host struct, fire-and-forget.
    ///
    /// Values are positional against the struct's fields; fewer values than
    /// fields writes a prefix (e.g. two throttle values on a four-engine
    /// definition). A count that cannot fit the struct is dropped loudly.
    pub fn write(&self, struct_id: StructId, values: &[f64]) {
        let max = struct_id.fields().len();
        if values.is_empty() || values.len() > max {
            warn!(
                structure = struct_id.name(),
                got = values.len(),
                max,
                "write dropped: value count does not fit struct"
            );
            return;
        }

        if let Err(e) = self.link.send(protocol::encode_write(struct_id, values)) {
            warn!(structure = struct_id.name(), error = %e, "host write failed");
        }
    }

    /// Transmit a discrete command event, fire-and-forget.
    pub fn transmit_event(&self, event: HostEvent, value: u32) {
        if let Err(e) = self.link.send(protocol::encode_event(event, value)) {
            warn!(event = event.name(), error = %e, "host event transmission failed");
        }
    }

    /// Whether the host has acknowledged the connection.
    pub fn is_opened(&self) -> bool {
        self.opened.load(Ordering::Relaxed)
    }

    /// Start the callback pump: host datagrams in, session callbacks out.
    ///
    /// Runs on its own task (the host's callback context) concurrently with
    /// the poll loop and the command dispatch contexts.
    pub fn spawn_callback_pump(
        self: &Arc<Self>,
        mut inbound: mpsc::Receiver<HostDatagram>,
        cancel: CancellationToken,
    ) -> tokio::task::JoinHandle<()> {
        let session = Arc::clone(self);
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    datagram = inbound.recv() => match datagram {
                        Some(HostDatagram::Opened) => session.on_opened(),
                        Some(HostDatagram::Closed) => session.on_closed(),
                        Some(HostDatagram::Data { request_id, sample }) => {
                            session.on_data_received(request_id, sample);
                        }
                        Some(HostDatagram::Rejected { field }) => {
                            error!(field = %field, "host rejected a field definition");
                        }
                        None => {
                            debug!("host link closed its callback channel");
                            break;
                        }
                    }
                }
            }
            debug!("host callback pump stopped");
        })
    }

    fn on_opened(&self) {
        self.opened.store(true, Ordering::Relaxed);
        info!("host connection opened");
    }

    fn on_closed(&self) {
        self.opened.store(false, Ordering::Relaxed);
        warn!("host connection closed");
    }

    fn on_data_received(&self, request_id: u32, sample: TelemetrySample) {
        self.correlator.resolve(request_id, sample);
    }
}
