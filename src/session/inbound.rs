//! The session's receive task.
//!
//! Owns the socket's recv side exclusively and dispatches each datagram by
//! its decoded type. Decode failures are dropped silently; the receive loop
//! itself never fails the session except on a hard socket error.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tokio::net::UdpSocket;
use tokio::sync::{mpsc, watch};

use crate::event::{RconEvent, RconMessage};
use crate::protocol::codec::{self, InboundPacket};
use crate::protocol::constants::MAX_DATAGRAM_SIZE;
use crate::protocol::text;
use crate::session::reassembly::Reassembler;
use crate::session::{lock, Shared};

pub(crate) async fn run(
    socket: Arc<UdpSocket>,
    shared: Arc<Mutex<Shared>>,
    open: Arc<AtomicBool>,
    mut shutdown: watch::Receiver<bool>,
    events: mpsc::Sender<RconEvent>,
) {
    let mut buf = vec![0u8; MAX_DATAGRAM_SIZE];
    let mut reassembler = Reassembler::new();

    loop {
        tokio::select! {
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
            res = socket.recv(&mut buf) => {
                match res {
                    Ok(len) => {
                        handle_datagram(&buf[..len], &socket, &shared, &mut reassembler, &events)
                            .await;
                    }
                    Err(e) if e.kind() == std::io::ErrorKind::ConnectionReset => {
                        // Windows ICMP port unreachable - ignore
                        continue;
                    }
                    Err(e) => {
                        tracing::error!("UDP socket error: {}", e);
                        open.store(false, Ordering::SeqCst);
                        break;
                    }
                }
            }
        }
    }
}

async fn handle_datagram(
    bytes: &[u8],
    socket: &UdpSocket,
    shared: &Mutex<Shared>,
    reassembler: &mut Reassembler,
    events: &mpsc::Sender<RconEvent>,
) {
    let pkt = match InboundPacket::decode(bytes) {
        Ok(pkt) => pkt,
        Err(e) => {
            tracing::debug!(error = %e, len = bytes.len(), "failed to decode datagram");
            return;
        }
    };

    lock(shared).last_received = Instant::now();

    match pkt {
        InboundPacket::LoginResponse { .. } => {
            // Duplicate of the handshake reply; the handshake already ran.
        }
        InboundPacket::CommandResponse { seq, body } => {
            {
                let mut sh = lock(shared);
                if sh.pending.remove(seq).is_some() {
                    tracing::trace!(seq, "command acknowledged");
                }
                if sh.in_flight == Some(seq) {
                    sh.in_flight = None;
                }
            }
            if !body.is_empty() {
                let msg = RconMessage {
                    text: text::from_wire(&body),
                    id: seq,
                };
                let _ = events.send(RconEvent::Message(msg)).await;
            }
        }
        InboundPacket::ServerMessage { seq, part, body } => {
            // Each fragment is acknowledged individually on receipt, with
            // the fragment's own id.
            match socket.try_send(&codec::encode_acknowledge(seq)) {
                Ok(_) => lock(shared).last_sent = Instant::now(),
                Err(e) => tracing::debug!(seq, error = %e, "failed to send acknowledgment"),
            }

            let complete = match part {
                Some(p) => reassembler.on_fragment(seq, p.index, p.total, &body),
                None => {
                    reassembler.reset();
                    Some(body.to_vec())
                }
            };

            if let Some(payload) = complete {
                let msg = RconMessage {
                    text: text::from_wire(&payload),
                    id: seq,
                };
                let _ = events.send(RconEvent::Message(msg)).await;
            }
        }
    }
}
