//! Telemetry snapshot type.

/// One snapshot of host state, produced per poll tick.
///
/// Each sample fully supersedes the previous one; there is no history and
/// no persistent storage. The zero value doubles as the timeout fallback
/// when the host never answers a read within the bound.
///
/// # Units
///
/// Units follow the host's data definitions (see [`crate::host::registry`]):
/// degrees for position and heading, feet for altitude, knots for indicated
/// speed, seconds for the simulation clock.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TelemetrySample {
    /// Latitude in degrees (-90 to 90).
    pub latitude: f64,

    /// Longitude in degrees (-180 to 180).
    pub longitude: f64,

    /// Altitude in feet MSL.
    pub altitude: f64,

    /// Indicated airspeed in knots.
    pub indicated_speed: f64,

    /// Magnetic heading in degrees (0-360).
    pub heading: f64,

    /// Monotonic simulation clock in seconds.
    ///
    /// Expected to advance every tick while the simulation runs; a frozen
    /// value across two consecutive samples means the simulation is paused.
    pub elapsed_seconds: f64,

    /// Autopilot master switch state.
    pub autopilot_master: bool,
}

impl TelemetrySample {
    /// The fallback sample substituted when a telemetry read times out.
    pub fn zeroed() -> Self {
        Self::default()
    }
}
