//! Session and supervisor configuration.

use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use crate::protocol::constants;

/// Login credentials for one remote RCON endpoint.
///
/// Immutable for the lifetime of a session; the password crosses the wire
/// in cleartext once, at login.
#[derive(Clone, PartialEq, Eq)]
pub struct LoginCredentials {
    pub host: IpAddr,
    pub port: u16,
    pub password: String,
}

impl LoginCredentials {
    pub fn new(host: IpAddr, port: u16, password: impl Into<String>) -> Self {
        Self {
            host,
            port,
            password: password.into(),
        }
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl fmt::Debug for LoginCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginCredentials")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Timing configuration for a single session.
///
/// The defaults match the remote protocol's expectations; tests shrink them
/// to drive timeouts quickly.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// How long `connect` waits for the login reply.
    pub login_timeout: Duration,

    /// Send-side idle threshold after which a keepalive is due.
    pub keepalive_after: Duration,

    /// Receive-side idle threshold after which the session is torn down.
    pub dead_after: Duration,

    /// Housekeeping loop interval. Must be small relative to the two
    /// thresholds above, since it also bounds retransmission latency.
    pub tick: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            login_timeout: constants::DEFAULT_LOGIN_TIMEOUT,
            keepalive_after: constants::DEFAULT_KEEPALIVE_AFTER,
            dead_after: constants::DEFAULT_DEAD_AFTER,
            tick: constants::DEFAULT_HOUSEKEEPING_TICK,
        }
    }
}

impl SessionConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_login_timeout(mut self, timeout: Duration) -> Self {
        self.login_timeout = timeout;
        self
    }

    pub fn with_keepalive_after(mut self, threshold: Duration) -> Self {
        self.keepalive_after = threshold;
        self
    }

    pub fn with_dead_after(mut self, threshold: Duration) -> Self {
        self.dead_after = threshold;
        self
    }

    pub fn with_tick(mut self, tick: Duration) -> Self {
        self.tick = tick;
        self
    }
}

/// Timing configuration for the connection supervisor.
#[derive(Debug, Clone)]
pub struct SupervisorConfig {
    /// Delay between failed connection attempts.
    pub reconnect_backoff: Duration,

    /// Poll interval while waiting for the managed process to appear.
    pub process_poll: Duration,

    pub session: SessionConfig,
}

impl Default for SupervisorConfig {
    fn default() -> Self {
        Self {
            reconnect_backoff: constants::DEFAULT_RECONNECT_BACKOFF,
            process_poll: constants::DEFAULT_PROCESS_POLL,
            session: SessionConfig::default(),
        }
    }
}

impl SupervisorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reconnect_backoff(mut self, backoff: Duration) -> Self {
        self.reconnect_backoff = backoff;
        self
    }

    pub fn with_session(mut self, session: SessionConfig) -> Self {
        self.session = session;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_redacts_password() {
        let creds = LoginCredentials::new("127.0.0.1".parse().unwrap(), 2302, "hunter2");
        let rendered = format!("{creds:?}");
        assert!(rendered.contains("<redacted>"));
        assert!(!rendered.contains("hunter2"));
    }
}
