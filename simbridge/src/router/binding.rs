//! Static command binding table.
//!
//! Maps each remote command name to exactly one host effect. Built into the
//! binary, registered once at startup, read-only thereafter. Unknown names
//! simply never appear here, so they are never subscribed - no-ops by
//! absence rather than runtime errors.

/// What a command does on the host side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    /// Per-engine throttle positions (1 to 4 doubles).
    Throttle,
    /// Wheel brakes: (left, right) doubles, or a legacy single bool.
    Brake,
    /// Flaps handle (one double).
    Flap,
    /// Elevator position (one double).
    Pitch,
    /// Aileron position (one double).
    Bank,
    /// Autopilot master toggle (bool).
    AutopilotMaster,
    /// Autopilot altitude hold toggle (bool).
    AltitudeHold,
    /// Autopilot speed hold toggle (bool).
    SpeedHold,
    /// Autopilot approach hold toggle (bool).
    ApproachHold,
    /// Autopilot attitude hold toggle (bool).
    AttitudeHold,
    /// Autopilot heading hold toggle (bool).
    HeadingHold,
    /// Autopilot vertical speed hold toggle (bool).
    VerticalSpeedHold,
    /// Autopilot altitude target (one double).
    TargetAltitude,
    /// Autopilot speed target (one double).
    TargetSpeed,
    /// Autopilot heading target (one double).
    TargetHeading,
    /// Autopilot vertical speed target (one double).
    TargetVerticalSpeed,
    /// Simulation pause toggle (bool).
    Pause,
    /// Parking brake toggle (bool).
    ParkingBrake,
}

/// One entry of the binding table: remote name to host effect.
#[derive(Debug, Clone, Copy)]
pub struct CommandBinding {
    pub command: &'static str,
    pub kind: CommandKind,
}

const fn binding(command: &'static str, kind: CommandKind) -> CommandBinding {
    CommandBinding { command, kind }
}

/// Every recognized remote command.
pub const BINDINGS: &[CommandBinding] = &[
    binding("throttle", CommandKind::Throttle),
    binding("brake", CommandKind::Brake),
    binding("flap", CommandKind::Flap),
    binding("pitch", CommandKind::Pitch),
    binding("bank", CommandKind::Bank),
    binding("autopilotMaster", CommandKind::AutopilotMaster),
    binding("autopilotAltHold", CommandKind::AltitudeHold),
    binding("autopilotSpeedHold", CommandKind::SpeedHold),
    binding("autopilotApprHold", CommandKind::ApproachHold),
    binding("autopilotAttHold", CommandKind::AttitudeHold),
    binding("autopilotHdgHold", CommandKind::HeadingHold),
    binding("autopilotVsHold", CommandKind::VerticalSpeedHold),
    binding("targetAltitude", CommandKind::TargetAltitude),
    binding("targetSpeed", CommandKind::TargetSpeed),
    binding("targetHeading", CommandKind::TargetHeading),
    binding("targetVerticalSpeed", CommandKind::TargetVerticalSpeed),
    binding("pause", CommandKind::Pause),
    binding("parkingBrake", CommandKind::ParkingBrake),
];
