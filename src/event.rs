//! Notifications emitted by a running session.

use crate::config::LoginCredentials;

/// A fully reassembled inbound server message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RconMessage {
    pub text: String,
    /// The message id from the inbound sequence space.
    pub id: u8,
}

/// Notifications delivered on the session's event channel.
#[derive(Debug, Clone)]
pub enum RconEvent {
    /// Fired once per fully reassembled (or unfragmented) inbound message.
    Message(RconMessage),

    /// Fired exactly once per terminated session, carrying the credentials
    /// that were used so the supervisor can observe reconnect triggers.
    Disconnected { credentials: LoginCredentials },
}
