//! Hub wire format.
//!
//! Every hub exchange is one JSON text frame carrying a named invocation:
//! `{"target": "<message name>", "arguments": [<values>]}`. Outbound
//! telemetry and inbound commands share the shape; only the target name and
//! argument list differ.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::telemetry::TelemetrySample;

/// Message name for outbound telemetry publishes.
pub const TELEMETRY_TARGET: &str = "SendAltitudeAndSpeed";

/// One hub invocation frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HubMessage {
    /// Name of the invoked message.
    pub target: String,

    /// Positional arguments.
    #[serde(default)]
    pub arguments: Vec<Value>,
}

impl HubMessage {
    /// Build a frame from a target name and arguments.
    pub fn new(target: impl Into<String>, arguments: Vec<Value>) -> Self {
        Self {
            target: target.into(),
            arguments,
        }
    }

    /// Serialize to a JSON text frame.
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from a JSON text frame.
    pub fn decode(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

/// Build the telemetry publish frame.
///
/// Argument order is fixed by the hub contract: altitude, latitude,
/// longitude, speed, heading.
pub fn telemetry_message(sample: &TelemetrySample) -> HubMessage {
    HubMessage::new(
        TELEMETRY_TARGET,
        vec![
            Value::from(sample.altitude),
            Value::from(sample.latitude),
            Value::from(sample.longitude),
            Value::from(sample.indicated_speed),
            Value::from(sample.heading),
        ],
    )
}
