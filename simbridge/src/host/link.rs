//! Host link - the connection to the simulation host.
//!
//! [`HostLink`] is the seam between the session and the host's native
//! protocol: a single fire-and-forget `send` of an encoded frame. Inbound
//! traffic travels the other way as parsed [`HostDatagram`]s on an mpsc
//! channel, produced by a reader task the link spawns on connect. Tests
//! substitute an in-memory implementation.

use std::sync::Arc;
use std::time::Duration;

use tokio::net::UdpSocket;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use super::error::HostError;
use super::protocol::{parse_datagram, HostDatagram, MAX_DATAGRAM_SIZE};

/// Capacity of the inbound datagram channel.
const INBOUND_CHANNEL_SIZE: usize = 32;

/// Fire-and-forget frame transport to the host.
///
/// Implementations must tolerate concurrent calls from the poll loop and the
/// command dispatch contexts; frames to distinct fields may be reordered
/// relative to each other.
pub trait HostLink: Send + Sync {
    /// Hand one encoded frame to the host without awaiting confirmation.
    fn send(&self, frame: String) -> Result<(), HostError>;
}

/// UDP datagram link to the host.
///
/// Binds an ephemeral local port, connects it to the host address, and spawns
/// a reader task that parses inbound datagrams and forwards them on the
/// returned channel. Outbound frames go through the non-blocking `try_send`,
/// matching the fire-and-forget write semantics.
pub struct UdpHostLink {
    socket: Arc<UdpSocket>,
}

impl UdpHostLink {
    /// Connect to the host and start the reader task.
    ///
    /// A bind or connect failure here is the "host unavailable at startup"
    /// case: fatal for bridge construction.
    pub async fn connect(
        host_addr: &str,
        cancel: CancellationToken,
    ) -> Result<(Self, mpsc::Receiver<HostDatagram>), HostError> {
        let socket = UdpSocket::bind("0.0.0.0:0")
            .await
            .map_err(|e| HostError::Unreachable {
                addr: host_addr.to_string(),
                source: e,
            })?;
        socket
            .connect(host_addr)
            .await
            .map_err(|e| HostError::Unreachable {
                addr: host_addr.to_string(),
                source: e,
            })?;

        let socket = Arc::new(socket);
        let (tx, rx) = mpsc::channel(INBOUND_CHANNEL_SIZE);

        let reader = Arc::clone(&socket);
        tokio::spawn(async move {
            run_reader(reader, tx, cancel).await;
        });

        info!(host_addr, "host link connected");
        Ok((Self { socket }, rx))
    }
}

impl HostLink for UdpHostLink {
    fn send(&self, frame: String) -> Result<(), HostError> {
        self.socket
            .try_send(frame.as_bytes())
            .map_err(|e| HostError::Send(e.to_string()))?;
        Ok(())
    }
}

/// Reader loop: socket datagrams in, parsed callbacks out.
async fn run_reader(
    socket: Arc<UdpSocket>,
    tx: mpsc::Sender<HostDatagram>,
    cancel: CancellationToken,
) {
    let mut buffer = [0u8; MAX_DATAGRAM_SIZE];

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            received = socket.recv(&mut buffer) => match received {
                Ok(len) => match parse_datagram(&buffer[..len]) {
                    Some(datagram) => {
                        if tx.send(datagram).await.is_err() {
                            debug!("host callback channel closed, stopping reader");
                            break;
                        }
                    }
                    None => trace!(len, "unparseable host datagram ignored"),
                },
                Err(e) => {
                    warn!(error = %e, "host socket receive error");
                    tokio::time::sleep(Duration::from_millis(100)).await;
                }
            }
        }
    }

    debug!("host link reader stopped");
}
