//! Closed registry of host fields, structs, and command events.
//!
//! The host addresses data by named struct definitions (an ordered set of
//! fields read or written as one unit) and discrete command events. Both
//! registries are closed enums with static tables: built into the binary,
//! registered once at startup, never mutated. The same identifiers are used
//! at registration time and at callback dispatch time.

/// Numeric kind of a host field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// 64-bit float.
    Float64,
    /// 32-bit integer (also used for boolean flags).
    Int32,
}

impl FieldKind {
    /// Wire tag used when registering the field with the host.
    pub fn tag(self) -> &'static str {
        match self {
            Self::Float64 => "F64",
            Self::Int32 => "I32",
        }
    }
}

/// One host field: simulation variable name, unit string, numeric kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDef {
    pub name: &'static str,
    pub unit: &'static str,
    pub kind: FieldKind,
}

const fn field(name: &'static str, unit: &'static str, kind: FieldKind) -> FieldDef {
    FieldDef { name, unit, kind }
}

/// Named struct definitions the bridge reads from or writes to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StructId {
    /// The telemetry struct polled every cycle.
    Telemetry,
    /// Engine throttle lever positions (up to four engines).
    Throttle,
    /// Left and right wheel brake positions.
    Brake,
    /// Flaps handle position.
    Flap,
    /// Elevator position.
    Pitch,
    /// Aileron position.
    Bank,
    /// Autopilot altitude target.
    TargetAltitude,
    /// Autopilot airspeed target.
    TargetSpeed,
    /// Autopilot heading target.
    TargetHeading,
    /// Autopilot vertical speed target.
    TargetVerticalSpeed,
}

/// Fields of the telemetry struct, in wire order.
///
/// The order here is the order values appear in a `DATA` answer.
const TELEMETRY_FIELDS: &[FieldDef] = &[
    field("PLANE LATITUDE", "degrees", FieldKind::Float64),
    field("PLANE LONGITUDE", "degrees", FieldKind::Float64),
    field("PLANE ALTITUDE", "feet", FieldKind::Float64),
    field("AIRSPEED INDICATED", "knots", FieldKind::Float64),
    field("PLANE HEADING DEGREES MAGNETIC", "degrees", FieldKind::Float64),
    field("ABSOLUTE TIME", "seconds", FieldKind::Float64),
    field("AUTOPILOT MASTER", "bool", FieldKind::Int32),
];

const THROTTLE_FIELDS: &[FieldDef] = &[
    field(
        "GENERAL ENG THROTTLE LEVER POSITION:1",
        "percent",
        FieldKind::Float64,
    ),
    field(
        "GENERAL ENG THROTTLE LEVER POSITION:2",
        "percent",
        FieldKind::Float64,
    ),
    field(
        "GENERAL ENG THROTTLE LEVER POSITION:3",
        "percent",
        FieldKind::Float64,
    ),
    field(
        "GENERAL ENG THROTTLE LEVER POSITION:4",
        "percent",
        FieldKind::Float64,
    ),
];

const BRAKE_FIELDS: &[FieldDef] = &[
    field("BRAKE LEFT POSITION", "position", FieldKind::Float64),
    field("BRAKE RIGHT POSITION", "position", FieldKind::Float64),
];

const FLAP_FIELDS: &[FieldDef] = &[field("FLAPS HANDLE INDEX", "number", FieldKind::Float64)];

const PITCH_FIELDS: &[FieldDef] = &[field("ELEVATOR POSITION", "position", FieldKind::Float64)];

const BANK_FIELDS: &[FieldDef] = &[field("AILERON POSITION", "position", FieldKind::Float64)];

const TARGET_ALTITUDE_FIELDS: &[FieldDef] =
    &[field("AUTOPILOT ALTITUDE LOCK VAR", "feet", FieldKind::Float64)];

const TARGET_SPEED_FIELDS: &[FieldDef] = &[field(
    "AUTOPILOT AIRSPEED HOLD VAR",
    "knots",
    FieldKind::Float64,
)];

const TARGET_HEADING_FIELDS: &[FieldDef] = &[field(
    "AUTOPILOT HEADING LOCK DIR",
    "degrees",
    FieldKind::Float64,
)];

const TARGET_VERTICAL_SPEED_FIELDS: &[FieldDef] = &[field(
    "AUTOPILOT VERTICAL HOLD VAR",
    "feet/minute",
    FieldKind::Float64,
)];

impl StructId {
    /// Every struct definition, in registration order.
    pub const ALL: &'static [StructId] = &[
        StructId::Telemetry,
        StructId::Throttle,
        StructId::Brake,
        StructId::Flap,
        StructId::Pitch,
        StructId::Bank,
        StructId::TargetAltitude,
        StructId::TargetSpeed,
        StructId::TargetHeading,
        StructId::TargetVerticalSpeed,
    ];

    /// Stable wire name of this struct.
    pub fn name(self) -> &'static str {
        match self {
            Self::Telemetry => "TELEMETRY",
            Self::Throttle => "THROTTLE",
            Self::Brake => "BRAKE",
            Self::Flap => "FLAP",
            Self::Pitch => "PITCH",
            Self::Bank => "BANK",
            Self::TargetAltitude => "TARGET_ALTITUDE",
            Self::TargetSpeed => "TARGET_SPEED",
            Self::TargetHeading => "TARGET_HEADING",
            Self::TargetVerticalSpeed => "TARGET_VERTICAL_SPEED",
        }
    }

    /// Fields of this struct, in wire order.
    pub fn fields(self) -> &'static [FieldDef] {
        match self {
            Self::Telemetry => TELEMETRY_FIELDS,
            Self::Throttle => THROTTLE_FIELDS,
            Self::Brake => BRAKE_FIELDS,
            Self::Flap => FLAP_FIELDS,
            Self::Pitch => PITCH_FIELDS,
            Self::Bank => BANK_FIELDS,
            Self::TargetAltitude => TARGET_ALTITUDE_FIELDS,
            Self::TargetSpeed => TARGET_SPEED_FIELDS,
            Self::TargetHeading => TARGET_HEADING_FIELDS,
            Self::TargetVerticalSpeed => TARGET_VERTICAL_SPEED_FIELDS,
        }
    }
}

/// Discrete command events the bridge can transmit to the host.
///
/// Events carry a single integer value; boolean toggles send 0 or 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostEvent {
    AutopilotMaster,
    AltitudeHold,
    SpeedHold,
    ApproachHold,
    AttitudeHold,
    HeadingHold,
    VerticalSpeedHold,
    PauseSet,
    ParkingBrake,
}

impl HostEvent {
    /// Every command event.
    pub const ALL: &'static [HostEvent] = &[
        HostEvent::AutopilotMaster,
        HostEvent::AltitudeHold,
        HostEvent::SpeedHold,
        HostEvent::ApproachHold,
        HostEvent::AttitudeHold,
        HostEvent::HeadingHold,
        HostEvent::VerticalSpeedHold,
        HostEvent::PauseSet,
        HostEvent::ParkingBrake,
    ];

    /// Stable wire name of this event.
    pub fn name(self) -> &'static str {
        match self {
            Self::AutopilotMaster => "AP_MASTER",
            Self::AltitudeHold => "AP_ALT_HOLD",
            Self::SpeedHold => "AP_AIRSPEED_HOLD",
            Self::ApproachHold => "AP_APR_HOLD",
            Self::AttitudeHold => "AP_ATT_HOLD",
            Self::HeadingHold => "AP_HDG_HOLD",
            Self::VerticalSpeedHold => "AP_VS_HOLD",
            Self::PauseSet => "PAUSE_SET",
            Self::ParkingBrake => "PARKING_BRAKES",
        }
    }
}
