//! Integration tests for the host/hub bridge.
//!
//! These tests verify the complete bridge data flows:
//! - Host → PollLoop → HubTransport (telemetry publishing)
//! - HubTransport → CommandRouter → Host (inbound commands)
//! - Correlation timeout fallback (silent host)
//! - Reconnection (publishes drop during an outage and resume after)
//! - Pause gating policy
//!
//! A plain UDP socket plays the host; a tokio-tungstenite listener plays the
//! hub. Run with: `cargo test --test bridge_integration`

use std::sync::{Arc, Mutex};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, UdpSocket};
use tokio::sync::mpsc;
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tokio_util::sync::CancellationToken;

use simbridge::bridge::Bridge;
use simbridge::config::BridgeConfig;
use simbridge::hub::{ConnectionState, HubMessage, HubTransport, HubTransportConfig};

// ============================================================================
// Test Helpers
// ============================================================================

/// How long tests wait for an expected message before failing.
const DEADLINE: Duration = Duration::from_secs(5);

/// Telemetry values a fake host answers with, per request count.
type SampleFn = Box<dyn Fn(u64) -> (f64, f64, f64, f64, f64, f64, i32) + Send>;

/// A UDP socket playing the host: records every frame, answers `SYN` with
/// `OPEN`, and (when given a sample function) answers `REQ` with `DATA`.
struct FakeHost {
    addr: String,
    frames: Arc<Mutex<Vec<String>>>,
}

impl FakeHost {
    async fn spawn(sample_fn: Option<SampleFn>) -> Self {
        let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = socket.local_addr().unwrap().to_string();
        let frames = Arc::new(Mutex::new(Vec::new()));

        let recorded = Arc::clone(&frames);
        tokio::spawn(async move {
            let mut buf = [0u8; 512];
            let mut requests: u64 = 0;
            loop {
                let Ok((len, peer)) = socket.recv_from(&mut buf).await else {
                    break;
                };
                let frame = String::from_utf8_lossy(&buf[..len]).to_string();
                recorded.lock().unwrap().push(frame.clone());

                if frame.starts_with("SYN,") {
                    let _ = socket.send_to(b"OPEN", peer).await;
                } else if let Some(rest) = frame.strip_prefix("REQ,") {
                    let Some(sample_fn) = sample_fn.as_ref() else {
                        continue; // silent host: never answers reads
                    };
                    let Some(id) = rest.split(',').next() else {
                        continue;
                    };
                    let (lat, lon, alt, speed, heading, elapsed, ap) = sample_fn(requests);
                    requests += 1;
                    let answer =
                        format!("DATA,{id},{lat},{lon},{alt},{speed},{heading},{elapsed},{ap}");
                    let _ = socket.send_to(answer.as_bytes(), peer).await;
                }
            }
        });

        Self { addr, frames }
    }

    fn frames(&self) -> Vec<String> {
        self.frames.lock().unwrap().clone()
    }

    /// Wait until a frame matching `predicate` shows up.
    async fn wait_for_frame(&self, predicate: impl Fn(&str) -> bool) -> String {
        let deadline = tokio::time::Instant::now() + DEADLINE;
        loop {
            if let Some(frame) = self.frames().into_iter().find(|f| predicate(f)) {
                return frame;
            }
            assert!(
                tokio::time::Instant::now() < deadline,
                "timed out waiting for host frame; saw: {:?}",
                self.frames()
            );
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    }
}

/// A WebSocket listener playing the hub: forwards every received invocation
/// to the test, injects commands on request, and can drop the live
/// connection to exercise reconnection. Accepts connections sequentially.
struct FakeHub {
    url: String,
    seen: mpsc::UnboundedReceiver<HubMessage>,
    commands: mpsc::UnboundedSender<HubMessage>,
    drop_conn: mpsc::UnboundedSender<()>,
}

impl FakeHub {
    async fn spawn() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("ws://{}/flightsimhub", listener.local_addr().unwrap());

        let (seen_tx, seen) = mpsc::unbounded_channel();
        let (commands, mut cmd_rx) = mpsc::unbounded_channel::<HubMessage>();
        let (drop_conn, mut drop_rx) = mpsc::unbounded_channel::<()>();

        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let Ok(mut ws) = accept_async(stream).await else {
                    continue;
                };
                loop {
                    tokio::select! {
                        _ = drop_rx.recv() => {
                            let _ = ws.close(None).await;
                            break;
                        }
                        cmd = cmd_rx.recv() => match cmd {
                            Some(msg) => {
                                let frame = msg.encode().unwrap();
                                if ws.send(Message::Text(frame)).await.is_err() {
                                    break;
                                }
                            }
                            None => return,
                        },
                        incoming = ws.next() => match incoming {
                            Some(Ok(Message::Text(text))) => {
                                if let Ok(msg) = HubMessage::decode(&text) {
                                    let _ = seen_tx.send(msg);
                                }
                            }
                            Some(Ok(_)) => {}
                            _ => break,
                        }
                    }
                }
            }
        });

        Self {
            url,
            seen,
            commands,
            drop_conn,
        }
    }

    /// Wait for the next invocation with the given target name.
    async fn wait_for(&mut self, target: &str) -> HubMessage {
        let deadline = tokio::time::Instant::now() + DEADLINE;
        loop {
            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            let msg = tokio::time::timeout(remaining, self.seen.recv())
                .await
                .expect("timed out waiting for hub message")
                .expect("hub channel closed");
            if msg.target == target {
                return msg;
            }
        }
    }
}

fn args_as_f64(msg: &HubMessage) -> Vec<f64> {
    msg.arguments.iter().map(|v| v.as_f64().unwrap()).collect()
}

fn fast_config(hub_url: &str, host_addr: &str) -> BridgeConfig {
    let mut config = BridgeConfig::new(hub_url, "\"test-token\"");
    config.host_addr = host_addr.to_string();
    config.poll_interval = Duration::from_millis(100);
    config.sample_timeout = Duration::from_millis(80);
    config
}

/// Poll until the transport reaches `expected` or the deadline passes.
async fn wait_for_state(transport: &HubTransport, expected: ConnectionState) {
    let deadline = tokio::time::Instant::now() + DEADLINE;
    while transport.state() != expected {
        assert!(
            tokio::time::Instant::now() < deadline,
            "timed out waiting for state {expected}, still {}",
            transport.state()
        );
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

// ============================================================================
// Host → Hub Telemetry Tests
// ============================================================================

/// The canonical outbound flow: the host answers a read, the correlator
/// resolves within the timeout, and the hub receives the sample's values in
/// publish argument order (altitude, latitude, longitude, speed, heading).
#[tokio::test]
async fn test_telemetry_flows_from_host_to_hub() {
    let host = FakeHost::spawn(Some(Box::new(|n| {
        (10.0, 20.0, 3000.0, 250.0, 90.0, 5.0 + n as f64, 0)
    })))
    .await;
    let mut hub = FakeHub::spawn().await;

    let bridge = Bridge::start(fast_config(&hub.url, &host.addr))
        .await
        .expect("bridge failed to start");

    let msg = hub.wait_for("SendAltitudeAndSpeed").await;
    assert_eq!(args_as_f64(&msg), vec![3000.0, 10.0, 20.0, 250.0, 90.0]);

    bridge.shutdown().await;
}

/// A silent host: every read times out and the zero-valued fallback sample
/// still goes out, keeping the cadence alive.
#[tokio::test]
async fn test_silent_host_publishes_zero_samples() {
    let host = FakeHost::spawn(None).await;
    let mut hub = FakeHub::spawn().await;

    let bridge = Bridge::start(fast_config(&hub.url, &host.addr))
        .await
        .expect("bridge failed to start");

    let msg = hub.wait_for("SendAltitudeAndSpeed").await;
    assert_eq!(args_as_f64(&msg), vec![0.0, 0.0, 0.0, 0.0, 0.0]);

    bridge.shutdown().await;
}

/// With gating opted in, a frozen simulation clock suppresses publishing
/// from the second cycle on.
#[tokio::test]
async fn test_pause_gating_suppresses_publishes() {
    let host = FakeHost::spawn(Some(Box::new(|_| {
        (10.0, 20.0, 3000.0, 250.0, 90.0, 5.0, 0)
    })))
    .await;
    let mut hub = FakeHub::spawn().await;

    let mut config = fast_config(&hub.url, &host.addr);
    config.suppress_publish_while_paused = true;

    let bridge = Bridge::start(config).await.expect("bridge failed to start");

    // The first cycle has no baseline and publishes; every later cycle sees
    // the frozen clock and is suppressed.
    hub.wait_for("SendAltitudeAndSpeed").await;
    let extra = tokio::time::timeout(Duration::from_millis(600), hub.seen.recv()).await;
    assert!(extra.is_err(), "expected no publishes while paused");

    bridge.shutdown().await;
}

// ============================================================================
// Hub → Host Command Tests
// ============================================================================

/// A remote autopilot-master command becomes exactly one host event.
#[tokio::test]
async fn test_autopilot_master_command_reaches_host_once() {
    let host = FakeHost::spawn(Some(Box::new(|n| {
        (10.0, 20.0, 3000.0, 250.0, 90.0, 5.0 + n as f64, 0)
    })))
    .await;
    let mut hub = FakeHub::spawn().await;

    let bridge = Bridge::start(fast_config(&hub.url, &host.addr))
        .await
        .expect("bridge failed to start");

    // First publish proves the hub connection is live before injecting.
    hub.wait_for("SendAltitudeAndSpeed").await;
    hub.commands
        .send(HubMessage::new(
            "autopilotMaster",
            vec![serde_json::Value::Bool(true)],
        ))
        .unwrap();

    host.wait_for_frame(|f| f == "EVT,AP_MASTER,1").await;
    tokio::time::sleep(Duration::from_millis(200)).await;
    let events = host
        .frames()
        .into_iter()
        .filter(|f| f == "EVT,AP_MASTER,1")
        .count();
    assert_eq!(events, 1, "event must be transmitted exactly once");

    bridge.shutdown().await;
}

/// A throttle command writes the throttle struct and nothing else.
#[tokio::test]
async fn test_throttle_command_writes_throttle_struct() {
    let host = FakeHost::spawn(Some(Box::new(|n| {
        (10.0, 20.0, 3000.0, 250.0, 90.0, 5.0 + n as f64, 0)
    })))
    .await;
    let mut hub = FakeHub::spawn().await;

    let bridge = Bridge::start(fast_config(&hub.url, &host.addr))
        .await
        .expect("bridge failed to start");

    hub.wait_for("SendAltitudeAndSpeed").await;
    hub.commands
        .send(HubMessage::new(
            "throttle",
            vec![serde_json::json!(0.75), serde_json::json!(0.5)],
        ))
        .unwrap();

    host.wait_for_frame(|f| f == "SET,THROTTLE,0.75,0.5").await;
    let writes = host
        .frames()
        .into_iter()
        .filter(|f| f.starts_with("SET,") && !f.starts_with("SET,THROTTLE"))
        .count();
    assert_eq!(writes, 0, "no other struct may be written");

    bridge.shutdown().await;
}

/// A malformed payload is dropped without disturbing later commands.
#[tokio::test]
async fn test_malformed_payload_does_not_poison_dispatch() {
    let host = FakeHost::spawn(Some(Box::new(|n| {
        (10.0, 20.0, 3000.0, 250.0, 90.0, 5.0 + n as f64, 0)
    })))
    .await;
    let mut hub = FakeHub::spawn().await;

    let bridge = Bridge::start(fast_config(&hub.url, &host.addr))
        .await
        .expect("bridge failed to start");

    hub.wait_for("SendAltitudeAndSpeed").await;

    // Wrong type, then a valid command on the same name.
    hub.commands
        .send(HubMessage::new("pause", vec![serde_json::json!(1.0)]))
        .unwrap();
    hub.commands
        .send(HubMessage::new("pause", vec![serde_json::json!(true)]))
        .unwrap();

    host.wait_for_frame(|f| f == "EVT,PAUSE_SET,1").await;
    assert!(
        !host.frames().iter().any(|f| f == "EVT,PAUSE_SET,0"),
        "the malformed payload must not have produced an event"
    );

    bridge.shutdown().await;
}

// ============================================================================
// Reconnection Tests
// ============================================================================

/// After an established connection drops, publishes become no-ops, the
/// transport reconnects on its own, and publishing resumes without restart.
#[tokio::test]
async fn test_publish_drops_during_outage_and_resumes_after_reconnect() {
    let mut hub = FakeHub::spawn().await;

    let config = HubTransportConfig {
        hub_url: hub.url.clone(),
        access_token: "tok".to_string(),
        initial_backoff: Duration::from_millis(50),
        max_backoff: Duration::from_millis(200),
        max_reconnect_attempts: 20,
    };
    let transport = HubTransport::new(config, CancellationToken::new());

    transport.connect().await.expect("initial connect failed");
    wait_for_state(&transport, ConnectionState::Connected).await;

    transport.publish("ping", vec![serde_json::json!(1)]);
    let msg = hub.wait_for("ping").await;
    assert_eq!(args_as_f64(&msg), vec![1.0]);

    // Server-side drop: the transport must notice and leave Connected.
    hub.drop_conn.send(()).unwrap();
    let deadline = tokio::time::Instant::now() + DEADLINE;
    while transport.state() == ConnectionState::Connected {
        assert!(tokio::time::Instant::now() < deadline, "drop unnoticed");
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    // Publishes during the outage are silent no-ops.
    transport.publish("ping", vec![serde_json::json!(2)]);

    // The listener is still accepting, so reconnection succeeds by itself.
    wait_for_state(&transport, ConnectionState::Connected).await;
    transport.publish("ping", vec![serde_json::json!(3)]);

    let msg = hub.wait_for("ping").await;
    assert_eq!(
        args_as_f64(&msg),
        vec![3.0],
        "the outage publish must not have been queued"
    );
}

/// When the endpoint disappears for good, the transport exhausts its
/// reconnect attempts, moves to Closed, and fires the closed notification.
#[tokio::test]
async fn test_abandoned_reconnection_fires_closed_notification() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    // Accept exactly one connection, then tear everything down.
    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(stream).await.unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;
        let _ = ws.close(None).await;
        // ws and listener drop here: no further accepts.
    });

    let config = HubTransportConfig {
        hub_url: format!("ws://{addr}/flightsimhub"),
        access_token: String::new(),
        initial_backoff: Duration::from_millis(30),
        max_backoff: Duration::from_millis(60),
        max_reconnect_attempts: 2,
    };
    let transport = HubTransport::new(config, CancellationToken::new());
    let mut closed = transport.subscribe_closed();

    transport.connect().await.expect("initial connect failed");

    tokio::time::timeout(DEADLINE, closed.recv())
        .await
        .expect("timed out waiting for closed notification")
        .expect("closed channel dropped");
    assert_eq!(transport.state(), ConnectionState::Closed);

    let _ = server.await;
}

/// An initial connect against a dead endpoint fails, leaves the transport
/// Disconnected, and is never retried automatically.
#[tokio::test]
async fn test_initial_connect_failure_leaves_disconnected() {
    // Grab a port and close the listener so the first connect fails.
    let dead = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let dead_addr = dead.local_addr().unwrap();
    drop(dead);

    let config = HubTransportConfig {
        hub_url: format!("ws://{dead_addr}/flightsimhub"),
        access_token: String::new(),
        initial_backoff: Duration::from_millis(50),
        max_backoff: Duration::from_millis(200),
        max_reconnect_attempts: 3,
    };
    let transport = HubTransport::new(config, CancellationToken::new());

    assert!(transport.connect().await.is_err());
    assert_eq!(transport.state(), ConnectionState::Disconnected);

    // No auto-retry of a failed initial connect.
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(transport.state(), ConnectionState::Disconnected);
}
