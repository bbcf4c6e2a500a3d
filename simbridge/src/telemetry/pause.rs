//! Pause detection from successive telemetry samples.

use super::sample::TelemetrySample;

/// Detects a frozen simulation clock.
///
/// The host offers no direct "is paused" field, but its simulation clock
/// stops advancing while paused. Comparing the clock across consecutive
/// samples is enough: the values are bit-equal iff the clock is frozen.
///
/// Only the poll loop touches this; no cross-thread access.
#[derive(Debug, Default)]
pub struct PauseDetector {
    last_elapsed: Option<f64>,
}

impl PauseDetector {
    /// Create a detector with no baseline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the next sample and report whether the simulation is paused.
    ///
    /// The first call always returns `false`: with no prior baseline we
    /// treat the simulation as running. Afterwards, returns `true` iff the
    /// current and previous clock values are exactly equal.
    pub fn update(&mut self, sample: &TelemetrySample) -> bool {
        let paused = match self.last_elapsed {
            Some(prev) => prev.to_bits() == sample.elapsed_seconds.to_bits(),
            None => false,
        };
        self.last_elapsed = Some(sample.elapsed_seconds);
        paused
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_at(elapsed: f64) -> TelemetrySample {
        TelemetrySample {
            elapsed_seconds: elapsed,
            ..TelemetrySample::zeroed()
        }
    }

    #[test]
    fn test_first_call_is_never_paused() {
        let mut detector = PauseDetector::new();
        assert!(!detector.update(&sample_at(0.0)));

        let mut detector = PauseDetector::new();
        assert!(!detector.update(&sample_at(5.0)));
    }

    #[test]
    fn test_frozen_clock_reports_paused() {
        let mut detector = PauseDetector::new();
        assert!(!detector.update(&sample_at(5.0)));
        assert!(detector.update(&sample_at(5.0)));
    }

    #[test]
    fn test_advancing_clock_reports_running() {
        let mut detector = PauseDetector::new();
        assert!(!detector.update(&sample_at(5.0)));
        assert!(!detector.update(&sample_at(5.1)));
        assert!(!detector.update(&sample_at(5.2)));
    }

    #[test]
    fn test_resume_after_pause() {
        let mut detector = PauseDetector::new();
        detector.update(&sample_at(5.0));
        assert!(detector.update(&sample_at(5.0)));
        assert!(!detector.update(&sample_at(5.5)));
    }

    #[test]
    fn test_near_equal_values_are_not_paused() {
        let mut detector = PauseDetector::new();
        detector.update(&sample_at(5.0));
        assert!(!detector.update(&sample_at(5.0 + f64::EPSILON)));
    }
}
