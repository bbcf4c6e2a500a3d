//! Command router - inbound remote commands to host writes and events.
//!
//! For each entry of the static binding table, the router subscribes a
//! handler that validates the payload's arity and types, then makes exactly
//! one host session call. Malformed payloads are logged and dropped; nothing
//! may propagate out of the dispatch context, since a fault there would tear
//! down that command's subscription path.

mod binding;

use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::host::{HostEvent, HostSession, StructId};
use crate::hub::HubTransport;

pub use binding::{CommandBinding, CommandKind, BINDINGS};

/// Maximum number of engines a throttle command may address.
const MAX_ENGINES: usize = 4;

/// Payload validation failures.
///
/// Validation fails loudly rather than coercing: a silently mangled payload
/// would send corrupt values to the host.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Wrong number of arguments.
    #[error("expected {expected} argument(s), got {got}")]
    Arity { expected: &'static str, got: usize },

    /// An argument has the wrong JSON type.
    #[error("argument {index} has wrong type (expected {expected})")]
    Type {
        index: usize,
        expected: &'static str,
    },

    /// Throttle addressed an unsupported engine count.
    #[error("throttle accepts 1 to 4 engine values, got {0}")]
    EngineCount(usize),
}

/// Routes inbound remote commands to the host session.
pub struct CommandRouter {
    session: Arc<HostSession>,
    legacy_single_brake: bool,
}

impl CommandRouter {
    /// Create a router over a shared host session.
    ///
    /// `legacy_single_brake` accepts the historical one-bool brake payload
    /// alongside the (left, right) pair.
    pub fn new(session: Arc<HostSession>, legacy_single_brake: bool) -> Self {
        Self {
            session,
            legacy_single_brake,
        }
    }

    /// Subscribe every binding on the transport.
    ///
    /// Call before `connect()` so no inbound frame finds its name
    /// unsubscribed.
    pub fn install(self: &Arc<Self>, transport: &HubTransport) {
        for binding in BINDINGS {
            let router = Arc::clone(self);
            let kind = binding.kind;
            let name = binding.command;
            transport.subscribe(
                name,
                Box::new(move |args| {
                    if let Err(e) = router.dispatch(kind, &args) {
                        warn!(command = name, error = %e, "dropping malformed command payload");
                    }
                }),
            );
        }
        debug!(commands = BINDINGS.len(), "command routes installed");
    }

    /// Apply one validated command to the host.
    pub fn dispatch(&self, kind: CommandKind, args: &[Value]) -> Result<(), CommandError> {
        match kind {
            CommandKind::Throttle => self.throttle(args),
            CommandKind::Brake => self.brake(args),
            CommandKind::Flap => self.single_write(StructId::Flap, args),
            CommandKind::Pitch => self.single_write(StructId::Pitch, args),
            CommandKind::Bank => self.single_write(StructId::Bank, args),
            CommandKind::TargetAltitude => self.single_write(StructId::TargetAltitude, args),
            CommandKind::TargetSpeed => self.single_write(StructId::TargetSpeed, args),
            CommandKind::TargetHeading => self.single_write(StructId::TargetHeading, args),
            CommandKind::TargetVerticalSpeed => {
                self.single_write(StructId::TargetVerticalSpeed, args)
            }
            CommandKind::AutopilotMaster => self.toggle(HostEvent::AutopilotMaster, args),
            CommandKind::AltitudeHold => self.toggle(HostEvent::AltitudeHold, args),
            CommandKind::SpeedHold => self.toggle(HostEvent::SpeedHold, args),
            CommandKind::ApproachHold => self.toggle(HostEvent::ApproachHold, args),
            CommandKind::AttitudeHold => self.toggle(HostEvent::AttitudeHold, args),
            CommandKind::HeadingHold => self.toggle(HostEvent::HeadingHold, args),
            CommandKind::VerticalSpeedHold => self.toggle(HostEvent::VerticalSpeedHold, args),
            CommandKind::Pause => self.toggle(HostEvent::PauseSet, args),
            CommandKind::ParkingBrake => self.toggle(HostEvent::ParkingBrake, args),
        }
    }

    /// One double per engine, up to the host's four-engine definition.
    fn throttle(&self, args: &[Value]) -> Result<(), CommandError> {
        if args.is_empty() || args.len() > MAX_ENGINES {
            return Err(CommandError::EngineCount(args.len()));
        }
        let values = all_f64(args)?;
        self.session.write(StructId::Throttle, &values);
        Ok(())
    }

    /// (left, right) doubles, or a legacy single bool mapping to both wheels.
    fn brake(&self, args: &[Value]) -> Result<(), CommandError> {
        match args.len() {
            2 => {
                let left = f64_arg(args, 0)?;
                let right = f64_arg(args, 1)?;
                self.session.write(StructId::Brake, &[left, right]);
                Ok(())
            }
            1 if self.legacy_single_brake => {
                let engaged = bool_arg(args, 0)?;
                let position = if engaged { 1.0 } else { 0.0 };
                self.session.write(StructId::Brake, &[position, position]);
                Ok(())
            }
            got => Err(CommandError::Arity {
                expected: "2 doubles (or 1 legacy bool)",
                got,
            }),
        }
    }

    /// One double written to a single-field struct.
    fn single_write(&self, struct_id: StructId, args: &[Value]) -> Result<(), CommandError> {
        if args.len() != 1 {
            return Err(CommandError::Arity {
                expected: "1 double",
                got: args.len(),
            });
        }
        let value = f64_arg(args, 0)?;
        self.session.write(struct_id, &[value]);
        Ok(())
    }

    /// One bool transmitted as a 0/1 event.
    fn toggle(&self, event: HostEvent, args: &[Value]) -> Result<(), CommandError> {
        if args.len() != 1 {
            return Err(CommandError::Arity {
                expected: "1 bool",
                got: args.len(),
            });
        }
        let engaged = bool_arg(args, 0)?;
        self.session.transmit_event(event, engaged as u32);
        Ok(())
    }
}

fn f64_arg(args: &[Value], index: usize) -> Result<f64, CommandError> {
    args[index].as_f64().ok_or(CommandError::Type {
        index,
        expected: "double",
    })
}

fn bool_arg(args: &[Value], index: usize) -> Result<bool, CommandError> {
    args[index].as_bool().ok_or(CommandError::Type {
        index,
        expected: "bool",
    })
}

fn all_f64(args: &[Value]) -> Result<Vec<f64>, CommandError> {
    args.iter()
        .enumerate()
        .map(|(index, v)| {
            v.as_f64().ok_or(CommandError::Type {
                index,
                expected: "double",
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{HostError, HostLink};
    use serde_json::json;
    use std::sync::Mutex;

    struct RecordingLink {
        frames: Mutex<Vec<String>>,
    }

    impl RecordingLink {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                frames: Mutex::new(Vec::new()),
            })
        }

        fn frames(&self) -> Vec<String> {
            self.frames.lock().unwrap().clone()
        }
    }

    impl HostLink for RecordingLink {
        fn send(&self, frame: String) -> Result<(), HostError> {
            self.frames.lock().unwrap().push(frame);
            Ok(())
        }
    }

    fn router_with_link() -> (CommandRouter, Arc<RecordingLink>) {
        let link = RecordingLink::new();
        let session = Arc::new(HostSession::new(link.clone()));
        (CommandRouter::new(session, true), link)
    }

    #[test]
    fn test_throttle_routes_to_throttle_struct_only() {
        let (router, link) = router_with_link();
        router
            .dispatch(CommandKind::Throttle, &[json!(0.75), json!(0.5)])
            .unwrap();
        assert_eq!(link.frames(), vec!["SET,THROTTLE,0.75,0.5"]);
    }

    #[test]
    fn test_throttle_rejects_bad_engine_counts() {
        let (router, link) = router_with_link();
        assert!(router.dispatch(CommandKind::Throttle, &[]).is_err());
        let five = vec![json!(0.1); 5];
        assert!(router.dispatch(CommandKind::Throttle, &five).is_err());
        assert!(link.frames().is_empty());
    }

    #[test]
    fn test_brake_pair() {
        let (router, link) = router_with_link();
        router
            .dispatch(CommandKind::Brake, &[json!(0.3), json!(0.7)])
            .unwrap();
        assert_eq!(link.frames(), vec!["SET,BRAKE,0.3,0.7"]);
    }

    #[test]
    fn test_brake_legacy_bool() {
        let (router, link) = router_with_link();
        router.dispatch(CommandKind::Brake, &[json!(true)]).unwrap();
        router.dispatch(CommandKind::Brake, &[json!(false)]).unwrap();
        assert_eq!(link.frames(), vec!["SET,BRAKE,1,1", "SET,BRAKE,0,0"]);
    }

    #[test]
    fn test_brake_legacy_bool_rejected_when_disabled() {
        let link = RecordingLink::new();
        let session = Arc::new(HostSession::new(link.clone()));
        let router = CommandRouter::new(session, false);

        assert!(router.dispatch(CommandKind::Brake, &[json!(true)]).is_err());
        assert!(link.frames().is_empty());
    }

    #[test]
    fn test_autopilot_master_transmits_one_event() {
        let (router, link) = router_with_link();
        router
            .dispatch(CommandKind::AutopilotMaster, &[json!(true)])
            .unwrap();
        assert_eq!(link.frames(), vec!["EVT,AP_MASTER,1"]);
    }

    #[test]
    fn test_pause_toggle() {
        let (router, link) = router_with_link();
        router.dispatch(CommandKind::Pause, &[json!(false)]).unwrap();
        assert_eq!(link.frames(), vec!["EVT,PAUSE_SET,0"]);
    }

    #[test]
    fn test_target_writes() {
        let (router, link) = router_with_link();
        router
            .dispatch(CommandKind::TargetAltitude, &[json!(12000.0)])
            .unwrap();
        router
            .dispatch(CommandKind::TargetHeading, &[json!(270.0)])
            .unwrap();
        assert_eq!(
            link.frames(),
            vec!["SET,TARGET_ALTITUDE,12000", "SET,TARGET_HEADING,270"]
        );
    }

    #[test]
    fn test_wrong_types_fail_loudly_without_host_traffic() {
        let (router, link) = router_with_link();
        assert!(router
            .dispatch(CommandKind::Flap, &[json!("not a number")])
            .is_err());
        assert!(router
            .dispatch(CommandKind::Pause, &[json!(1.0)])
            .is_err());
        assert!(router
            .dispatch(CommandKind::Throttle, &[json!(0.5), json!(null)])
            .is_err());
        assert!(link.frames().is_empty());
    }

    #[test]
    fn test_integers_are_accepted_as_doubles() {
        let (router, link) = router_with_link();
        router.dispatch(CommandKind::Flap, &[json!(2)]).unwrap();
        assert_eq!(link.frames(), vec!["SET,FLAP,2"]);
    }
}
