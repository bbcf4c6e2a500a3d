//! Hub transport - WebSocket connection lifecycle, publish, subscribe.
//!
//! One transport instance owns the connection to the remote hub. Outbound
//! publishes are fire-and-forget and only go out while the connection is
//! live; nothing is buffered across disconnections (freshness over
//! completeness). Inbound frames are routed to per-command dispatch workers:
//! one worker per subscribed name, so handlers for the same name run in
//! arrival order while distinct names dispatch concurrently.
//!
//! After an established connection drops, the transport reconnects on its
//! own with exponential backoff (2^n, capped). Only when the attempts are
//! exhausted does it move to `Closed` and fire the closed notification; a
//! failed *initial* connect is reported to the caller and never retried
//! automatically.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use tokio::net::TcpStream;
use tokio::sync::{broadcast, mpsc};
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use super::error::HubError;
use super::protocol::{telemetry_message, HubMessage};
use super::state::ConnectionState;
use crate::telemetry::TelemetrySample;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// Handler invoked for each inbound frame of a subscribed command.
///
/// Runs on the command's dispatch worker, concurrently with the poll loop
/// and with other commands' handlers. Handlers must absorb their own
/// failures; a panic tears down only that command's worker, never the
/// shared read path.
pub type CommandHandler = Box<dyn Fn(Vec<Value>) + Send + Sync>;

/// Default first reconnect delay.
const DEFAULT_INITIAL_BACKOFF: Duration = Duration::from_secs(2);

/// Default reconnect delay cap.
const DEFAULT_MAX_BACKOFF: Duration = Duration::from_secs(60);

/// Default number of reconnect attempts before giving up.
const DEFAULT_MAX_RECONNECT_ATTEMPTS: u32 = 10;

/// Hub transport configuration.
#[derive(Debug, Clone)]
pub struct HubTransportConfig {
    /// WebSocket endpoint of the hub (e.g. `ws://host:port/flightsimhub`).
    pub hub_url: String,

    /// Bearer credential appended as the `access_token` query parameter.
    pub access_token: String,

    /// Delay before the first reconnect attempt.
    pub initial_backoff: Duration,

    /// Upper bound on the reconnect delay.
    pub max_backoff: Duration,

    /// Reconnect attempts before the connection is abandoned.
    pub max_reconnect_attempts: u32,
}

impl Default for HubTransportConfig {
    fn default() -> Self {
        Self {
            hub_url: "ws://localhost:5233/flightsimhub".to_string(),
            access_token: String::new(),
            initial_backoff: DEFAULT_INITIAL_BACKOFF,
            max_backoff: DEFAULT_MAX_BACKOFF,
            max_reconnect_attempts: DEFAULT_MAX_RECONNECT_ATTEMPTS,
        }
    }
}

/// Connection to the remote realtime hub.
///
/// Cheap to clone; clones share the connection, state, and subscriptions.
#[derive(Clone)]
pub struct HubTransport {
    config: HubTransportConfig,
    state: Arc<RwLock<ConnectionState>>,
    outbound: Arc<RwLock<Option<mpsc::UnboundedSender<String>>>>,
    routes: Arc<RwLock<HashMap<String, mpsc::UnboundedSender<Vec<Value>>>>>,
    closed_tx: broadcast::Sender<()>,
    cancel: CancellationToken,
}

impl HubTransport {
    /// Create a transport; no connection is attempted until [`connect`].
    ///
    /// [`connect`]: HubTransport::connect
    pub fn new(config: HubTransportConfig, cancel: CancellationToken) -> Self {
        let (closed_tx, _) = broadcast::channel(4);
        Self {
            config,
            state: Arc::new(RwLock::new(ConnectionState::Disconnected)),
            outbound: Arc::new(RwLock::new(None)),
            routes: Arc::new(RwLock::new(HashMap::new())),
            closed_tx,
            cancel,
        }
    }

    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        *self.state.read().unwrap()
    }

    /// Receiver fired when reconnection is abandoned and the transport closes.
    pub fn subscribe_closed(&self) -> broadcast::Receiver<()> {
        self.closed_tx.subscribe()
    }

    /// Establish the connection and start the socket pump.
    ///
    /// A failure here leaves the transport `Disconnected`; the caller may
    /// invoke `connect()` again, but the transport does not retry an initial
    /// failed connect by itself.
    pub async fn connect(&self) -> Result<(), HubError> {
        self.set_state(ConnectionState::Connecting);

        let (ws, _response) = match connect_async(self.endpoint_url()).await {
            Ok(ok) => ok,
            Err(e) => {
                self.set_state(ConnectionState::Disconnected);
                warn!(error = %e, "hub connect failed");
                return Err(HubError::Connect(e.to_string()));
            }
        };

        info!(hub_url = %self.config.hub_url, "connected to hub");
        let outbound_rx = self.install_outbound();
        self.set_state(ConnectionState::Connected);

        let transport = self.clone();
        tokio::spawn(async move {
            transport.run_connection(ws, outbound_rx).await;
        });

        Ok(())
    }

    /// Register a handler for a named inbound command.
    ///
    /// Spawns the command's dispatch worker. Must be called before frames
    /// for that name arrive; in practice the router installs every binding
    /// before the first `connect()`.
    pub fn subscribe(&self, command: &str, handler: CommandHandler) {
        let (tx, mut rx) = mpsc::unbounded_channel::<Vec<Value>>();
        let cancel = self.cancel.clone();
        let name = command.to_string();

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    args = rx.recv() => match args {
                        Some(args) => handler(args),
                        None => break,
                    }
                }
            }
            trace!(command = %name, "dispatch worker stopped");
        });

        let replaced = self.routes.write().unwrap().insert(command.to_string(), tx);
        if replaced.is_some() {
            warn!(command, "subscription replaced an existing handler");
        }
        debug!(command, "hub subscription registered");
    }

    /// Publish a named message, fire-and-forget.
    ///
    /// A no-op (with a log line) unless the state is `Connected`; outbound
    /// telemetry is never queued across disconnections.
    pub fn publish(&self, message: &str, arguments: Vec<Value>) {
        self.publish_message(HubMessage::new(message, arguments));
    }

    /// Publish one telemetry sample in the hub's argument order.
    pub fn publish_telemetry(&self, sample: &TelemetrySample) {
        self.publish_message(telemetry_message(sample));
    }

    fn publish_message(&self, msg: HubMessage) {
        let state = self.state();
        if !state.is_connected() {
            debug!(message = %msg.target, %state, "hub not connected, dropping publish");
            return;
        }

        let frame = match msg.encode() {
            Ok(frame) => frame,
            Err(e) => {
                warn!(message = %msg.target, error = %e, "failed to encode hub message");
                return;
            }
        };

        let sender = self.outbound.read().unwrap().clone();
        match sender {
            Some(tx) => {
                if tx.send(frame).is_err() {
                    debug!(message = %msg.target, "hub writer gone, publish dropped");
                } else {
                    trace!(message = %msg.target, "published to hub");
                }
            }
            None => debug!(message = %msg.target, "no hub connection installed, publish dropped"),
        }
    }

    fn endpoint_url(&self) -> String {
        if self.config.access_token.is_empty() {
            self.config.hub_url.clone()
        } else {
            format!(
                "{}?access_token={}",
                self.config.hub_url, self.config.access_token
            )
        }
    }

    fn set_state(&self, state: ConnectionState) {
        *self.state.write().unwrap() = state;
        trace!(%state, "hub state changed");
    }

    fn install_outbound(&self) -> mpsc::UnboundedReceiver<String> {
        let (tx, rx) = mpsc::unbounded_channel();
        *self.outbound.write().unwrap() = Some(tx);
        rx
    }

    fn clear_outbound(&self) {
        *self.outbound.write().unwrap() = None;
    }

    /// Drive one established connection, reconnecting as needed.
    async fn run_connection(
        self,
        mut ws: WsStream,
        mut outbound_rx: mpsc::UnboundedReceiver<String>,
    ) {
        loop {
            let lost = self.pump(&mut ws, &mut outbound_rx).await;
            if !lost {
                let _ = ws.close(None).await;
                debug!("hub connection task cancelled");
                return;
            }

            match self.reconnect().await {
                Some((new_ws, new_rx)) => {
                    ws = new_ws;
                    outbound_rx = new_rx;
                }
                None => return,
            }
        }
    }

    /// Pump frames both ways until the connection is lost or cancelled.
    ///
    /// Returns true if the connection was lost, false on cancellation.
    async fn pump(
        &self,
        ws: &mut WsStream,
        outbound_rx: &mut mpsc::UnboundedReceiver<String>,
    ) -> bool {
        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => return false,
                frame = outbound_rx.recv() => match frame {
                    Some(text) => {
                        if let Err(e) = ws.send(Message::Text(text)).await {
                            warn!(error = %e, "hub send failed");
                            return true;
                        }
                    }
                    None => {
                        debug!("outbound channel dropped, stopping pump");
                        return true;
                    }
                },
                incoming = ws.next() => match incoming {
                    Some(Ok(Message::Text(text))) => self.dispatch_inbound(&text),
                    Some(Ok(Message::Close(_))) => {
                        info!("hub closed the connection");
                        return true;
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        warn!(error = %e, "hub socket error");
                        return true;
                    }
                    None => {
                        info!("hub socket ended");
                        return true;
                    }
                }
            }
        }
    }

    /// Route one inbound frame to its command's dispatch worker.
    fn dispatch_inbound(&self, text: &str) {
        let msg = match HubMessage::decode(text) {
            Ok(msg) => msg,
            Err(e) => {
                warn!(error = %e, "undecodable hub frame dropped");
                return;
            }
        };

        let routes = self.routes.read().unwrap();
        match routes.get(&msg.target) {
            Some(tx) => {
                if tx.send(msg.arguments).is_err() {
                    warn!(command = %msg.target, "dispatch worker gone, command dropped");
                }
            }
            None => debug!(command = %msg.target, "no subscription for message, ignored"),
        }
    }

    /// Reconnect with exponential backoff after a lost connection.
    ///
    /// Returns the fresh socket and outbound receiver, or `None` when the
    /// attempts are exhausted (state moves to `Closed` and the closed
    /// notification fires) or the transport is cancelled.
    async fn reconnect(&self) -> Option<(WsStream, mpsc::UnboundedReceiver<String>)> {
        self.set_state(ConnectionState::Reconnecting);
        self.clear_outbound();

        for attempt in 1..=self.config.max_reconnect_attempts {
            let backoff = self.backoff_for(attempt);
            warn!(
                attempt,
                backoff_ms = backoff.as_millis() as u64,
                "hub connection lost, retrying"
            );

            tokio::select! {
                _ = self.cancel.cancelled() => return None,
                _ = tokio::time::sleep(backoff) => {}
            }

            match connect_async(self.endpoint_url()).await {
                Ok((ws, _response)) => {
                    let rx = self.install_outbound();
                    self.set_state(ConnectionState::Connected);
                    info!(attempt, "hub connection reestablished");
                    return Some((ws, rx));
                }
                Err(e) => debug!(attempt, error = %e, "reconnect attempt failed"),
            }
        }

        self.set_state(ConnectionState::Closed);
        error!(
            attempts = self.config.max_reconnect_attempts,
            "hub reconnection abandoned"
        );
        let _ = self.closed_tx.send(());
        None
    }

    fn backoff_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.config
            .initial_backoff
            .saturating_mul(factor)
            .min(self.config.max_backoff)
    }
}
