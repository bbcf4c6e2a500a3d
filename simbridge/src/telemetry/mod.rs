//! Telemetry sampling types.
//!
//! The host answers reads asynchronously on its own callback context, so
//! every poll tick pairs a read with a bounded wait:
//!
//! - [`TelemetrySample`] - immutable snapshot of host state at one tick
//! - [`TelemetryCorrelator`] - matches asynchronous answers to the read that
//!   triggered them, with timeout fallback
//! - [`PauseDetector`] - derives "simulation paused" from the sample stream

mod correlator;
mod pause;
mod sample;

pub use correlator::{RequestId, TelemetryCorrelator};
pub use pause::PauseDetector;
pub use sample::TelemetrySample;
