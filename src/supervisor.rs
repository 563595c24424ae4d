//! Session lifecycle supervision across process restarts.
//!
//! The supervisor owns zero or one live session and cycles through
//! waiting-for-process → connecting → connected → disconnected until
//! stopped. Commands issued while disconnected fail with `NotConnected`
//! and are not queued across reconnects; callers retry if they need to.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::sync::{mpsc, watch};

use crate::config::{LoginCredentials, SupervisorConfig};
use crate::error::RconError;
use crate::event::{RconEvent, RconMessage};
use crate::session::RconSession;

/// Identifier of the managed process, when it is running.
///
/// The supervisor treats "present" as permission to attempt a connection;
/// the watchdog that actually starts and observes the process lives
/// elsewhere.
pub type ProcessSignal = watch::Receiver<Option<u32>>;

struct Inner {
    session: Mutex<Option<RconSession>>,
    stop: watch::Sender<bool>,
    credentials: LoginCredentials,
    config: SupervisorConfig,
}

fn session_guard(inner: &Inner) -> MutexGuard<'_, Option<RconSession>> {
    inner.session.lock().unwrap_or_else(|e| e.into_inner())
}

/// Keeps one RCON session alive against a remote endpoint whose process
/// may restart at any time.
pub struct RconSupervisor {
    inner: Arc<Inner>,
}

impl RconSupervisor {
    /// Start the supervision loop. Inbound server messages are delivered on
    /// the returned channel for as long as any session is connected.
    pub fn start(
        credentials: LoginCredentials,
        config: SupervisorConfig,
        process: ProcessSignal,
    ) -> (RconSupervisor, mpsc::Receiver<RconMessage>) {
        let (message_tx, message_rx) = mpsc::channel(64);
        let (stop_tx, stop_rx) = watch::channel(false);

        let inner = Arc::new(Inner {
            session: Mutex::new(None),
            stop: stop_tx,
            credentials,
            config,
        });

        tokio::spawn(run(inner.clone(), process, stop_rx, message_tx));

        (RconSupervisor { inner }, message_rx)
    }

    pub fn is_connected(&self) -> bool {
        matches!(&*session_guard(&self.inner), Some(s) if s.is_connected())
    }

    /// Send a raw command through the current session.
    pub fn send_command(&self, command: &str) -> Result<u8, RconError> {
        match &*session_guard(&self.inner) {
            Some(session) if session.is_connected() => session.send_command(command),
            _ => Err(RconError::NotConnected),
        }
    }

    /// Broadcast a chat message to every connected player.
    pub fn send_global_msg(&self, msg: &str) -> Result<(), RconError> {
        self.send_command(&format!("say -1 {msg}")).map(|_| ())
    }

    /// Send a chat message to one player.
    pub fn send_private_msg(&self, msg: &str, player_id: u32) -> Result<(), RconError> {
        self.send_command(&format!("say {player_id} {msg}")).map(|_| ())
    }

    /// Kick a player, showing them the given reason.
    pub fn kick_player(&self, reason: &str, player_id: u32) -> Result<(), RconError> {
        self.send_command(&format!("kick {player_id} {reason}")).map(|_| ())
    }

    /// Ask the remote endpoint to re-read its ban list from disk.
    pub fn reload_bans(&self) -> Result<(), RconError> {
        self.send_command("loadBans").map(|_| ())
    }

    /// Stop supervising: disconnect the current session and wait until it
    /// reports not-connected. No reconnect attempt starts after this
    /// returns.
    pub async fn stop(&self) {
        let _ = self.inner.stop.send(true);

        if let Some(session) = &*session_guard(&self.inner) {
            session.disconnect();
        }

        // Bounded poll, matching the teardown contract rather than
        // assuming task scheduling order.
        for _ in 0..50 {
            if !self.is_connected() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }

        tracing::info!("rcon supervisor stopped");
    }
}

async fn run(
    inner: Arc<Inner>,
    mut process: ProcessSignal,
    mut stop: watch::Receiver<bool>,
    messages: mpsc::Sender<RconMessage>,
) {
    loop {
        if *stop.borrow() {
            break;
        }

        if !wait_for_process(&mut process, &mut stop, inner.config.process_poll).await {
            break;
        }

        match RconSession::connect(inner.credentials.clone(), inner.config.session.clone()).await {
            Ok((session, events)) => {
                tracing::info!(peer = %inner.credentials.socket_addr(), "rcon connected");
                *session_guard(&inner) = Some(session);

                drive_session(&inner, events, &mut stop, &messages).await;

                *session_guard(&inner) = None;
                if *stop.borrow() {
                    break;
                }
                tracing::warn!("rcon connection lost, reconnecting");
            }
            Err(e) => {
                if *stop.borrow() {
                    break;
                }
                tracing::warn!(error = %e, "rcon connection could not be established, retrying");
                tokio::time::sleep(inner.config.reconnect_backoff).await;
            }
        }
    }
}

/// Forward message events until the session's disconnect notification.
///
/// Returning only after that notification guarantees the previous session
/// is fully torn down before the run loop attempts a new connection.
async fn drive_session(
    inner: &Inner,
    mut events: mpsc::Receiver<RconEvent>,
    stop: &mut watch::Receiver<bool>,
    messages: &mpsc::Sender<RconMessage>,
) {
    loop {
        tokio::select! {
            event = events.recv() => match event {
                Some(RconEvent::Message(msg)) => {
                    let _ = messages.send(msg).await;
                }
                Some(RconEvent::Disconnected { .. }) | None => break,
            },
            changed = stop.changed() => {
                if changed.is_err() || *stop.borrow() {
                    if let Some(session) = &*session_guard(inner) {
                        session.disconnect();
                    }
                    // Keep draining until the disconnect notification so the
                    // teardown is observed, not assumed.
                }
            }
        }
    }
}

/// Wait until the process-liveness signal reports a running process.
/// Returns false when supervision should end instead.
async fn wait_for_process(
    process: &mut ProcessSignal,
    stop: &mut watch::Receiver<bool>,
    poll: Duration,
) -> bool {
    loop {
        if *stop.borrow() {
            return false;
        }
        if process.borrow().is_some() {
            return true;
        }

        tokio::select! {
            changed = process.changed() => {
                if changed.is_err() {
                    // Signal source is gone; nothing will ever be running.
                    return false;
                }
            }
            changed = stop.changed() => {
                if changed.is_err() {
                    return false;
                }
            }
            _ = tokio::time::sleep(poll) => {}
        }
    }
}
