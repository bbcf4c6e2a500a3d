//! Bridge facade - construction and wiring.
//!
//! Encapsulates component creation in one place: host link, session, hub
//! transport, command routes, poll loop. The two directions run concurrently
//! and share only the session instance.

use std::sync::Arc;

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::BridgeConfig;
use crate::host::{HostError, HostSession, UdpHostLink};
use crate::hub::HubTransport;
use crate::poll::PollLoop;
use crate::router::CommandRouter;

/// Errors fatal to bridge construction.
///
/// Only the host side can abort construction; a hub connect failure leaves
/// the bridge running with publishes dropped until a reconnect.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// The host was unavailable or rejected the data definitions.
    #[error("host session error: {0}")]
    Host(#[from] HostError),
}

/// The running bridge.
pub struct Bridge {
    session: Arc<HostSession>,
    transport: HubTransport,
    cancel: CancellationToken,
    poll_handle: tokio::task::JoinHandle<()>,
}

impl Bridge {
    /// Construct and start the bridge.
    ///
    /// Order matters: the host link must be up and the data definitions
    /// registered before the poll loop starts (host unavailable at startup
    /// is fatal), and every command route must be subscribed before the hub
    /// connect so no inbound frame finds its name unsubscribed. A failed
    /// initial hub connect is logged and absorbed - the poll loop runs
    /// anyway, its publishes dropping until a later successful connect.
    pub async fn start(config: BridgeConfig) -> Result<Self, BridgeError> {
        let cancel = CancellationToken::new();

        let (link, inbound) = UdpHostLink::connect(&config.host_addr, cancel.clone()).await?;
        let session = Arc::new(HostSession::new(Arc::new(link)));
        session.define_all()?;
        session.spawn_callback_pump(inbound, cancel.clone());

        let transport = HubTransport::new(config.hub(), cancel.clone());
        let router = Arc::new(CommandRouter::new(
            Arc::clone(&session),
            config.legacy_single_brake,
        ));
        router.install(&transport);

        if let Err(e) = transport.connect().await {
            warn!(error = %e, "initial hub connect failed, publishing until reconnect is a no-op");
        }

        let poll = PollLoop::new(
            Arc::clone(&session),
            transport.clone(),
            config.poll(),
            cancel.clone(),
        );
        let poll_handle = poll.start();

        info!("bridge started");
        Ok(Self {
            session,
            transport,
            cancel,
            poll_handle,
        })
    }

    /// The shared host session.
    pub fn session(&self) -> &Arc<HostSession> {
        &self.session
    }

    /// The hub transport.
    pub fn transport(&self) -> &HubTransport {
        &self.transport
    }

    /// Stop every bridge task and wait for the poll loop to drain.
    pub async fn shutdown(self) {
        self.cancel.cancel();
        if let Err(e) = self.poll_handle.await {
            warn!(error = %e, "poll loop task did not stop cleanly");
        }
        info!("bridge stopped");
    }
}
