//! Request/response correlation for the host's asynchronous protocol.
//!
//! The host never answers a read synchronously: a request goes out, and the
//! answer arrives later on the data callback with a request identifier. The
//! correlator bridges that callback into a value a synchronous waiter can
//! obtain, holding exactly one pending-completion slot.
//!
//! A new slot replaces (never reuses) the old one on each request, so a late
//! answer for a timed-out request cannot be cross-wired to a newer waiter.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use tokio::sync::oneshot;
use tracing::{debug, warn};

use super::sample::TelemetrySample;

/// Identifier correlating a telemetry read with its answer.
pub type RequestId = u32;

/// A telemetry read in flight: the id it was issued under and the
/// one-shot sender that completes the waiter.
struct PendingRequest {
    request_id: RequestId,
    tx: oneshot::Sender<TelemetrySample>,
}

/// Single-slot correlator between the host callback context and the poll loop.
///
/// The slot is written by the host's callback task and consumed by the poll
/// loop; the hand-off itself goes through a `oneshot` channel so no sample is
/// ever observed half-written.
pub struct TelemetryCorrelator {
    pending: Mutex<Option<PendingRequest>>,
    next_id: AtomicU32,
}

impl Default for TelemetryCorrelator {
    fn default() -> Self {
        Self::new()
    }
}

impl TelemetryCorrelator {
    /// Create a correlator with no outstanding request.
    pub fn new() -> Self {
        Self {
            pending: Mutex::new(None),
            next_id: AtomicU32::new(1),
        }
    }

    /// Open a fresh pending slot and return its id plus the receiver to wait on.
    ///
    /// Any prior unresolved slot is dropped. The poll loop sequences requests
    /// (await or time out before the next `begin`), so a live slot here means
    /// the previous cycle timed out and its waiter is already gone.
    pub fn begin(&self) -> (RequestId, oneshot::Receiver<TelemetrySample>) {
        let request_id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();

        let mut slot = self.pending.lock().unwrap();
        if let Some(stale) = slot.take() {
            debug!(
                stale_request_id = stale.request_id,
                request_id, "replacing unresolved telemetry request"
            );
        }
        *slot = Some(PendingRequest { request_id, tx });

        (request_id, rx)
    }

    /// Complete the pending slot if `request_id` matches it.
    ///
    /// Called from the host callback context. An answer for a request that is
    /// no longer pending (timed out, superseded) is discarded.
    pub fn resolve(&self, request_id: RequestId, sample: TelemetrySample) {
        let mut slot = self.pending.lock().unwrap();
        match slot.take() {
            Some(pending) if pending.request_id == request_id => {
                drop(slot);
                if pending.tx.send(sample).is_err() {
                    debug!(request_id, "waiter gone before delivery, sample dropped");
                }
            }
            Some(pending) => {
                debug!(
                    received = request_id,
                    pending = pending.request_id,
                    "discarding answer for a stale request"
                );
                *slot = Some(pending);
            }
            None => {
                debug!(request_id, "no outstanding waiter, late answer discarded");
            }
        }
    }

    /// Wait for a pending read to resolve, bounded by `timeout`.
    ///
    /// On timeout the zero-valued sample is substituted and a warning logged;
    /// the caller never sees an error, keeping the poll cadence deterministic
    /// even when the host stalls.
    pub async fn await_sample(
        rx: oneshot::Receiver<TelemetrySample>,
        timeout: Duration,
    ) -> TelemetrySample {
        match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(sample)) => sample,
            Ok(Err(_)) => {
                warn!("pending telemetry slot dropped before resolution");
                TelemetrySample::zeroed()
            }
            Err(_) => {
                warn!(
                    timeout_ms = timeout.as_millis() as u64,
                    "timed out waiting for telemetry, substituting zero sample"
                );
                TelemetrySample::zeroed()
            }
        }
    }
}
