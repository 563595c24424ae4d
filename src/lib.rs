//! An asynchronous implementation of the BattlEye RCON protocol on top of
//! Tokio.
//!
//! The crate is layered bottom-up:
//! - `protocol`: wire primitives: checksummed packet codec, Windows-1252
//!   transcoding, the 8-bit sequence counter.
//! - `session`: one authenticated UDP session, from the login handshake
//!   through a receive task and a housekeeping loop driving keepalives,
//!   timeouts and stop-and-wait retransmission of queued commands.
//! - `supervisor`: keeps a session alive across restarts of the managed
//!   game server process and exposes the administrative command surface
//!   (`say`, `kick`, `loadBans`).
//!
//! All logging goes through `tracing`; the crate installs no subscriber and
//! has no process-wide side effects of its own.

pub mod config;
pub mod error;
pub mod event;
pub mod protocol;
pub mod session;
pub mod supervisor;

pub use config::{LoginCredentials, SessionConfig, SupervisorConfig};
pub use error::RconError;
pub use event::{RconEvent, RconMessage};
pub use session::RconSession;
pub use supervisor::{ProcessSignal, RconSupervisor};
