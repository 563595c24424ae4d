//! The session's periodic housekeeping loop.
//!
//! Runs while the session is open: applies the liveness rule (keepalive
//! after 5 s of send-side idle, teardown after 20 s of receive-side
//! silence), and drives stop-and-wait retransmission of the oldest pending
//! command. Emits the session's single disconnect notification on exit.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tokio::net::UdpSocket;
use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;

use crate::config::{LoginCredentials, SessionConfig};
use crate::event::RconEvent;
use crate::protocol::codec;
use crate::session::{lock, Shared};

/// What the liveness rule asks for on one tick.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum HousekeepAction {
    Idle,
    Keepalive,
    Close,
}

/// The liveness decision, kept pure so it can be tested against a
/// simulated clock.
pub(crate) fn liveness_action(
    now: Instant,
    last_sent: Instant,
    last_received: Instant,
    pending_empty: bool,
    config: &SessionConfig,
) -> HousekeepAction {
    if now.saturating_duration_since(last_sent) < config.keepalive_after {
        return HousekeepAction::Idle;
    }
    if now.saturating_duration_since(last_received) >= config.dead_after {
        return HousekeepAction::Close;
    }
    if pending_empty {
        // Nothing queued and nothing sent recently: keep the remote from
        // timing the session out.
        HousekeepAction::Keepalive
    } else {
        HousekeepAction::Idle
    }
}

pub(crate) async fn run(
    socket: Arc<UdpSocket>,
    shared: Arc<Mutex<Shared>>,
    open: Arc<AtomicBool>,
    shutdown: Arc<watch::Sender<bool>>,
    events: mpsc::Sender<RconEvent>,
    credentials: LoginCredentials,
    config: SessionConfig,
) {
    let mut shutdown_rx = shutdown.subscribe();
    let mut tick = tokio::time::interval(config.tick);
    tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

    'run: while open.load(Ordering::SeqCst) {
        tokio::select! {
            changed = shutdown_rx.changed() => {
                if changed.is_err() || *shutdown_rx.borrow() {
                    break 'run;
                }
            }
            _ = tick.tick() => {}
        }

        let now = Instant::now();
        let mut sh = lock(&shared);

        match liveness_action(now, sh.last_sent, sh.last_received, sh.pending.is_empty(), &config) {
            HousekeepAction::Close => {
                drop(sh);
                tracing::info!(
                    peer = %credentials.socket_addr(),
                    "no data from the remote endpoint, closing session"
                );
                break 'run;
            }
            HousekeepAction::Keepalive => {
                let seq = sh.next_seq.value();
                sh.next_seq = sh.next_seq.next();
                match socket.try_send(&codec::encode_command(seq, "")) {
                    Ok(_) => sh.last_sent = now,
                    Err(e) => tracing::debug!(error = %e, "failed to send keepalive"),
                }
            }
            HousekeepAction::Idle => {}
        }

        // Stop-and-wait retransmission: (re)send the oldest pending command,
        // but only once the previously sent one is no longer outstanding.
        let stale = sh
            .in_flight
            .map_or(true, |seq| !sh.pending.contains(seq));
        if stale {
            if let Some((seq, command)) = sh.pending.oldest().map(|(s, e)| (s, e.command.clone())) {
                match socket.try_send(&codec::encode_command(seq, &command)) {
                    Ok(_) => {
                        tracing::trace!(seq, "pending command sent");
                        sh.in_flight = Some(seq);
                        sh.last_sent = now;
                    }
                    Err(e) => tracing::debug!(seq, error = %e, "failed to send pending command"),
                }
            }
        }
    }

    open.store(false, Ordering::SeqCst);
    // Wake the receive task; pending commands are abandoned, not failed
    // individually.
    let _ = shutdown.send(true);
    lock(&shared).pending.clear();

    let _ = events
        .send(RconEvent::Disconnected { credentials })
        .await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn config() -> SessionConfig {
        SessionConfig::default()
    }

    #[test]
    fn quiet_session_is_idle() {
        let base = Instant::now();
        let now = base + Duration::from_secs(1);
        assert_eq!(
            liveness_action(now, base, base, true, &config()),
            HousekeepAction::Idle
        );
    }

    #[test]
    fn send_idle_with_live_remote_sends_keepalive() {
        let base = Instant::now();
        let now = base + Duration::from_secs(6);
        assert_eq!(
            liveness_action(now, base, now - Duration::from_secs(2), true, &config()),
            HousekeepAction::Keepalive
        );
    }

    #[test]
    fn send_idle_with_queued_commands_stays_idle() {
        let base = Instant::now();
        let now = base + Duration::from_secs(6);
        assert_eq!(
            liveness_action(now, base, now - Duration::from_secs(2), false, &config()),
            HousekeepAction::Idle
        );
    }

    #[test]
    fn silent_remote_closes_session() {
        let base = Instant::now();
        let now = base + Duration::from_secs(25);
        assert_eq!(
            liveness_action(now, base, base, true, &config()),
            HousekeepAction::Close
        );
        // Queued commands do not postpone the teardown.
        assert_eq!(
            liveness_action(now, base, base, false, &config()),
            HousekeepAction::Close
        );
    }

    #[test]
    fn recent_send_masks_a_silent_remote() {
        // The dead check only runs once the send side has been idle; a
        // session that keeps sending reaches it on the next idle window.
        let base = Instant::now();
        let now = base + Duration::from_secs(25);
        assert_eq!(
            liveness_action(now, now - Duration::from_secs(1), base, true, &config()),
            HousekeepAction::Idle
        );
    }
}
