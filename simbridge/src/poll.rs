//! Poll loop - the outbound half of the bridge.
//!
//! A single task started at bridge construction and never restarted. Each
//! cycle requests a telemetry read, waits (bounded) for the correlated
//! answer, runs pause detection, and forwards the sample to the hub,
//! best-effort. The loop never exits on transport disconnection: publishes
//! during an outage are dropped, not queued, and resume by themselves once
//! the transport reconnects.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use crate::host::HostSession;
use crate::hub::HubTransport;
use crate::telemetry::{PauseDetector, TelemetryCorrelator};

/// Default interval between poll cycles.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Default bound on the wait for a correlated answer.
///
/// Kept below the poll interval so a stalled host degrades to zero samples
/// instead of piling up outstanding requests.
pub const DEFAULT_SAMPLE_TIMEOUT: Duration = Duration::from_millis(800);

/// Poll loop configuration.
#[derive(Debug, Clone)]
pub struct PollLoopConfig {
    /// Interval between poll cycles.
    pub poll_interval: Duration,

    /// Bound on the wait for each cycle's telemetry answer.
    pub sample_timeout: Duration,

    /// Skip publishing while the simulation is paused.
    ///
    /// Off by default: pause detection stays informational, matching the
    /// host's observed behavior.
    pub suppress_publish_while_paused: bool,
}

impl Default for PollLoopConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            sample_timeout: DEFAULT_SAMPLE_TIMEOUT,
            suppress_publish_while_paused: false,
        }
    }
}

impl PollLoopConfig {
    /// Sample timeout clamped to the poll interval.
    fn effective_sample_timeout(&self) -> Duration {
        if self.sample_timeout > self.poll_interval {
            warn!(
                sample_timeout_ms = self.sample_timeout.as_millis() as u64,
                poll_interval_ms = self.poll_interval.as_millis() as u64,
                "sample timeout exceeds poll interval, clamping"
            );
            self.poll_interval
        } else {
            self.sample_timeout
        }
    }
}

/// The telemetry poll daemon.
pub struct PollLoop {
    session: Arc<HostSession>,
    transport: HubTransport,
    config: PollLoopConfig,
    cancel: CancellationToken,
}

impl PollLoop {
    /// Create a poll loop over the shared session and transport.
    pub fn new(
        session: Arc<HostSession>,
        transport: HubTransport,
        config: PollLoopConfig,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            session,
            transport,
            config,
            cancel,
        }
    }

    /// Start the loop as an async task.
    pub fn start(self) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            self.run().await;
        })
    }

    /// Run until cancelled.
    async fn run(self) {
        let sample_timeout = self.config.effective_sample_timeout();
        info!(
            poll_interval_ms = self.config.poll_interval.as_millis() as u64,
            sample_timeout_ms = sample_timeout.as_millis() as u64,
            "poll loop started"
        );

        let mut pause = PauseDetector::new();
        let mut interval = tokio::time::interval(self.config.poll_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => break,
                _ = interval.tick() => {}
            }

            let rx = match self.session.request_telemetry() {
                Ok(rx) => rx,
                Err(e) => {
                    warn!(error = %e, "telemetry read request failed");
                    continue;
                }
            };

            let sample = tokio::select! {
                _ = self.cancel.cancelled() => break,
                sample = TelemetryCorrelator::await_sample(rx, sample_timeout) => sample,
            };

            let paused = pause.update(&sample);
            if paused {
                trace!("simulation clock frozen, host paused");
                if self.config.suppress_publish_while_paused {
                    debug!("publish suppressed while paused");
                    continue;
                }
            }

            self.transport.publish_telemetry(&sample);
        }

        info!("poll loop stopped");
    }
}
