//! Host datagram codec.
//!
//! The host's native wire encoding is owned by the host collaborator; the
//! bridge only needs "register field", "read struct", "write struct", and
//! "transmit event" capabilities. This codec renders those as compact text
//! datagrams, one per line:
//!
//! - `SYN,<client>` - handshake, host answers `OPEN`
//! - `DEF,<struct>,<field>,<unit>,<kind>` - register one field
//! - `REQ,<request_id>,<struct>` - asynchronous read
//! - `SET,<struct>,<v1>[,<v2>...]` - fire-and-forget write
//! - `EVT,<event>,<value>` - fire-and-forget command event
//!
//! Inbound datagrams: `OPEN`, `QUIT`, `NAK,<field>` (definition rejected),
//! and `DATA,<request_id>,<lat>,<lon>,<alt>,<speed>,<heading>,<elapsed>,<ap>`
//! with values in telemetry field order.

use tracing::trace;

use super::registry::{FieldDef, HostEvent, StructId};
use crate::telemetry::{RequestId, TelemetrySample};

/// Maximum datagram size we expect from the host.
pub const MAX_DATAGRAM_SIZE: usize = 512;

/// Encode the startup handshake.
pub fn encode_hello(client: &str) -> String {
    format!("SYN,{client}")
}

/// Encode one field registration.
pub fn encode_define(struct_id: StructId, field: &FieldDef) -> String {
    format!(
        "DEF,{},{},{},{}",
        struct_id.name(),
        field.name,
        field.unit,
        field.kind.tag()
    )
}

/// Encode an asynchronous struct read.
pub fn encode_read(request_id: RequestId, struct_id: StructId) -> String {
    format!("REQ,{request_id},{}", struct_id.name())
}

/// Encode a struct write. Values are positional against the struct's fields.
pub fn encode_write(struct_id: StructId, values: &[f64]) -> String {
    let mut frame = format!("SET,{}", struct_id.name());
    for v in values {
        frame.push(',');
        frame.push_str(&v.to_string());
    }
    frame
}

/// Encode a command event transmission.
pub fn encode_event(event: HostEvent, value: u32) -> String {
    format!("EVT,{},{value}", event.name())
}

/// A decoded inbound host datagram.
#[derive(Debug, Clone, PartialEq)]
pub enum HostDatagram {
    /// The host acknowledged the connection.
    Opened,
    /// The host is shutting down or dropped the connection.
    Closed,
    /// The host rejected a field definition (fatal configuration error).
    Rejected { field: String },
    /// Answer to a telemetry read.
    Data {
        request_id: RequestId,
        sample: TelemetrySample,
    },
}

/// Parse one inbound datagram. Unrecognized traffic yields `None`.
pub fn parse_datagram(data: &[u8]) -> Option<HostDatagram> {
    let text = std::str::from_utf8(data).ok()?.trim_end();

    if text == "OPEN" {
        return Some(HostDatagram::Opened);
    }
    if text == "QUIT" {
        return Some(HostDatagram::Closed);
    }
    if let Some(field) = text.strip_prefix("NAK,") {
        return Some(HostDatagram::Rejected {
            field: field.to_string(),
        });
    }
    if let Some(rest) = text.strip_prefix("DATA,") {
        return parse_data(rest);
    }

    None
}

/// Parse the payload of a `DATA` answer.
///
/// Values arrive in telemetry field order; the autopilot flag is the final
/// integer (non-zero means engaged).
fn parse_data(rest: &str) -> Option<HostDatagram> {
    let parts: Vec<&str> = rest.split(',').collect();
    if parts.len() < 8 {
        trace!(parts = parts.len(), "DATA datagram too short");
        return None;
    }

    let request_id: RequestId = parts[0].parse().ok()?;
    let latitude: f64 = parts[1].parse().ok()?;
    let longitude: f64 = parts[2].parse().ok()?;
    let altitude: f64 = parts[3].parse().ok()?;
    let indicated_speed: f64 = parts[4].parse().ok()?;
    let heading: f64 = parts[5].parse().ok()?;
    let elapsed_seconds: f64 = parts[6].parse().ok()?;
    let autopilot_master: i32 = parts[7].parse().ok()?;

    Some(HostDatagram::Data {
        request_id,
        sample: TelemetrySample {
            latitude,
            longitude,
            altitude,
            indicated_speed,
            heading,
            elapsed_seconds,
            autopilot_master: autopilot_master != 0,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::registry::FieldKind;

    #[test]
    fn test_encode_define() {
        let frame = encode_define(StructId::Telemetry, &StructId::Telemetry.fields()[0]);
        assert_eq!(frame, "DEF,TELEMETRY,PLANE LATITUDE,degrees,F64");

        let ap = StructId::Telemetry.fields()[6];
        assert_eq!(ap.kind, FieldKind::Int32);
        assert_eq!(
            encode_define(StructId::Telemetry, &ap),
            "DEF,TELEMETRY,AUTOPILOT MASTER,bool,I32"
        );
    }

    #[test]
    fn test_encode_read() {
        assert_eq!(encode_read(7, StructId::Telemetry), "REQ,7,TELEMETRY");
    }

    #[test]
    fn test_encode_write() {
        assert_eq!(
            encode_write(StructId::Throttle, &[0.75, 0.5]),
            "SET,THROTTLE,0.75,0.5"
        );
        assert_eq!(encode_write(StructId::Flap, &[2.0]), "SET,FLAP,2");
    }

    #[test]
    fn test_encode_event() {
        assert_eq!(encode_event(HostEvent::AutopilotMaster, 1), "EVT,AP_MASTER,1");
        assert_eq!(encode_event(HostEvent::PauseSet, 0), "EVT,PAUSE_SET,0");
    }

    #[test]
    fn test_parse_lifecycle_datagrams() {
        assert_eq!(parse_datagram(b"OPEN"), Some(HostDatagram::Opened));
        assert_eq!(parse_datagram(b"QUIT"), Some(HostDatagram::Closed));
        assert_eq!(
            parse_datagram(b"NAK,PLANE LATITUDE"),
            Some(HostDatagram::Rejected {
                field: "PLANE LATITUDE".to_string()
            })
        );
    }

    #[test]
    fn test_parse_data_answer() {
        let parsed = parse_datagram(b"DATA,3,10,20,3000,250,90,5.0,1");
        match parsed {
            Some(HostDatagram::Data { request_id, sample }) => {
                assert_eq!(request_id, 3);
                assert_eq!(sample.latitude, 10.0);
                assert_eq!(sample.longitude, 20.0);
                assert_eq!(sample.altitude, 3000.0);
                assert_eq!(sample.indicated_speed, 250.0);
                assert_eq!(sample.heading, 90.0);
                assert_eq!(sample.elapsed_seconds, 5.0);
                assert!(sample.autopilot_master);
            }
            other => panic!("unexpected parse result: {other:?}"),
        }
    }

    #[test]
    fn test_parse_rejects_malformed_traffic() {
        assert_eq!(parse_datagram(b"DATA,3,10,20"), None);
        assert_eq!(parse_datagram(b"DATA,x,10,20,3000,250,90,5.0,1"), None);
        assert_eq!(parse_datagram(b"BOGUS"), None);
        assert_eq!(parse_datagram(&[0xff, 0xfe]), None);
    }

    #[test]
    fn test_parse_trailing_newline_tolerated() {
        assert_eq!(parse_datagram(b"OPEN\n"), Some(HostDatagram::Opened));
    }
}
