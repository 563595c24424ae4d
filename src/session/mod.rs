//! A single authenticated RCON session.
//!
//! `RconSession::connect` performs the login handshake and, on success,
//! starts two background tasks: a receive task that owns the socket's
//! recv side exclusively (`inbound`), and a housekeeping loop that drives
//! keepalives, timeouts and stop-and-wait retransmission (`housekeeping`).
//! Both report back to the caller through one event channel.

mod housekeeping;
mod inbound;
pub mod pending;
pub mod reassembly;

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use tokio::net::UdpSocket;
use tokio::sync::{mpsc, watch};

use crate::config::{LoginCredentials, SessionConfig};
use crate::error::RconError;
use crate::event::RconEvent;
use crate::protocol::codec::{self, InboundPacket};
use crate::protocol::constants::MAX_DATAGRAM_SIZE;
use crate::protocol::sequence::Sequence8;
use pending::PendingCommands;

/// Mutable state shared between the receive path and the housekeeping loop.
///
/// Always reached through [`lock`]; critical sections are short and never
/// held across an await point.
pub(crate) struct Shared {
    pub(crate) pending: PendingCommands,
    pub(crate) next_seq: Sequence8,
    /// Sequence number of the pending command currently (re)sent by the
    /// housekeeping loop. At most one command is actively in flight even
    /// when several are queued.
    pub(crate) in_flight: Option<u8>,
    pub(crate) last_sent: Instant,
    pub(crate) last_received: Instant,
}

pub(crate) fn lock(shared: &Mutex<Shared>) -> MutexGuard<'_, Shared> {
    shared.lock().unwrap_or_else(|e| e.into_inner())
}

/// Handle to one authenticated session.
///
/// A session value only exists after a successful login; once disconnected
/// it is discarded, never reused.
pub struct RconSession {
    socket: Arc<UdpSocket>,
    shared: Arc<Mutex<Shared>>,
    open: Arc<AtomicBool>,
    shutdown: Arc<watch::Sender<bool>>,
    credentials: LoginCredentials,
}

impl RconSession {
    /// Open a socket to the remote endpoint, perform the login handshake and
    /// start the session tasks.
    ///
    /// Blocks the caller for up to `config.login_timeout` awaiting the login
    /// reply, so the caller knows synchronously whether login succeeded.
    pub async fn connect(
        credentials: LoginCredentials,
        config: SessionConfig,
    ) -> Result<(RconSession, mpsc::Receiver<RconEvent>), RconError> {
        let bind_addr: SocketAddr = match credentials.host {
            IpAddr::V4(_) => (Ipv4Addr::UNSPECIFIED, 0).into(),
            IpAddr::V6(_) => (Ipv6Addr::UNSPECIFIED, 0).into(),
        };
        let socket = UdpSocket::bind(bind_addr).await?;
        socket.connect(credentials.socket_addr()).await?;

        socket
            .send(&codec::encode_login(&credentials.password))
            .await?;

        let mut buf = vec![0u8; MAX_DATAGRAM_SIZE];
        let len = tokio::time::timeout(config.login_timeout, socket.recv(&mut buf))
            .await
            .map_err(|_| RconError::LoginTimeout)??;

        match InboundPacket::decode(&buf[..len]) {
            Ok(InboundPacket::LoginResponse { accepted: true }) => {}
            Ok(InboundPacket::LoginResponse { accepted: false }) => {
                return Err(RconError::LoginRejected);
            }
            _ => return Err(RconError::UnexpectedLoginReply),
        }

        tracing::debug!(peer = %credentials.socket_addr(), "login accepted");

        let now = Instant::now();
        let socket = Arc::new(socket);
        let shared = Arc::new(Mutex::new(Shared {
            pending: PendingCommands::new(),
            next_seq: Sequence8::default(),
            in_flight: None,
            last_sent: now,
            last_received: now,
        }));
        let open = Arc::new(AtomicBool::new(true));
        let (shutdown_tx, _) = watch::channel(false);
        let shutdown = Arc::new(shutdown_tx);
        let (event_tx, event_rx) = mpsc::channel(64);

        tokio::spawn(inbound::run(
            socket.clone(),
            shared.clone(),
            open.clone(),
            shutdown.subscribe(),
            event_tx.clone(),
        ));
        tokio::spawn(housekeeping::run(
            socket.clone(),
            shared.clone(),
            open.clone(),
            shutdown.clone(),
            event_tx,
            credentials.clone(),
            config,
        ));

        let session = RconSession {
            socket,
            shared,
            open,
            shutdown,
            credentials,
        };
        Ok((session, event_rx))
    }

    /// Queue a command for reliable delivery and return its sequence number.
    ///
    /// Delivery is attempted by the housekeeping loop, not synchronously;
    /// the acknowledgment removes the entry from the pending queue.
    pub fn send_command(&self, command: &str) -> Result<u8, RconError> {
        if !self.is_connected() {
            return Err(RconError::NotConnected);
        }

        let mut shared = lock(&self.shared);
        let seq = shared.next_seq.value();
        shared.next_seq = shared.next_seq.next();

        let now = Instant::now();
        shared.pending.insert(seq, command.to_owned(), now)?;
        shared.last_sent = now;

        tracing::trace!(seq, command, "command queued");
        Ok(seq)
    }

    /// Send a command immediately without acknowledgment tracking.
    ///
    /// This is the fire-and-forget path keepalives use; a lost datagram is
    /// simply lost.
    pub fn send_command_untracked(&self, command: &str) -> Result<u8, RconError> {
        if !self.is_connected() {
            return Err(RconError::NotConnected);
        }

        let mut shared = lock(&self.shared);
        let seq = shared.next_seq.value();
        shared.next_seq = shared.next_seq.next();
        self.socket.try_send(&codec::encode_command(seq, command))?;
        shared.last_sent = Instant::now();

        Ok(seq)
    }

    /// Best-effort graceful shutdown; idempotent. The housekeeping loop
    /// observes the signal, tears the session down and emits the single
    /// disconnect notification.
    pub fn disconnect(&self) {
        if self.open.swap(false, Ordering::SeqCst) {
            tracing::debug!(peer = %self.credentials.socket_addr(), "disconnect requested");
        }
        let _ = self.shutdown.send(true);
    }

    pub fn is_connected(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    /// Number of commands awaiting acknowledgment.
    pub fn pending_len(&self) -> usize {
        lock(&self.shared).pending.len()
    }

    pub fn credentials(&self) -> &LoginCredentials {
        &self.credentials
    }
}

impl Drop for RconSession {
    fn drop(&mut self) {
        // The background tasks outlive the handle otherwise.
        self.disconnect();
    }
}
