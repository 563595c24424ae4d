use thiserror::Error;

use crate::session::pending::PendingError;

/// Errors surfaced by sessions and the supervisor.
///
/// Everything here is local and recoverable: transport errors fail the
/// current operation, the supervisor treats any session failure as a
/// disconnect and retries.
#[derive(Error, Debug)]
pub enum RconError {
    /// No authenticated session is currently available.
    #[error("not connected to the rcon endpoint")]
    NotConnected,

    /// The remote endpoint rejected the login password.
    #[error("login rejected by the remote endpoint")]
    LoginRejected,

    /// No login reply arrived within the configured timeout.
    #[error("timed out waiting for the login reply")]
    LoginTimeout,

    /// The first datagram after login was not a login reply.
    #[error("unexpected reply to the login packet")]
    UnexpectedLoginReply,

    /// The 8-bit sequence space wrapped onto a still-outstanding command.
    #[error("sequence number {0} already has a pending command")]
    DuplicateSequence(u8),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<PendingError> for RconError {
    fn from(err: PendingError) -> Self {
        match err {
            PendingError::DuplicateSequence(seq) => RconError::DuplicateSequence(seq),
        }
    }
}
