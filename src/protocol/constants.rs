use std::time::Duration;

/// Magic used to identify BattlEye RCON packets.
pub const PACKET_MAGIC: [u8; 2] = *b"BE";

/// Every checksummed packet body starts with this byte.
pub const BODY_PREFIX: u8 = 0xFF;

pub const TYPE_LOGIN: u8 = 0x00;
pub const TYPE_COMMAND: u8 = 0x01;
pub const TYPE_MESSAGE: u8 = 0x02;

/// Fixed header: magic (2) + checksum (4) + body prefix (1) + type (1).
pub const HEADER_SIZE: usize = 8;

/// Offset of the body (`0xFF` prefix) within a packet; the checksum covers
/// everything from here to the end.
pub const BODY_OFFSET: usize = 6;

/// First byte of a fragmented server-message body, ahead of the
/// `total`/`index` pair.
pub const MULTIPART_MARKER: u8 = 0x00;

/// Status byte of an accepted login response.
pub const LOGIN_ACCEPTED: u8 = 0x01;

/// Largest datagram the remote endpoint is known to emit.
pub const MAX_DATAGRAM_SIZE: usize = 4096;

/// Time to wait for the login reply before `connect` gives up.
pub const DEFAULT_LOGIN_TIMEOUT: Duration = Duration::from_secs(5);

/// Send-side idle threshold after which a keepalive is due.
pub const DEFAULT_KEEPALIVE_AFTER: Duration = Duration::from_secs(5);

/// Receive-side idle threshold after which the session is considered dead.
pub const DEFAULT_DEAD_AFTER: Duration = Duration::from_secs(20);

/// Housekeeping loop interval. Bounds retransmission latency, so it must
/// stay small relative to the keepalive and dead thresholds.
pub const DEFAULT_HOUSEKEEPING_TICK: Duration = Duration::from_millis(250);

/// Delay between failed connection attempts in the supervisor.
pub const DEFAULT_RECONNECT_BACKOFF: Duration = Duration::from_secs(1);

/// Poll interval while the supervisor waits for the managed process.
pub const DEFAULT_PROCESS_POLL: Duration = Duration::from_secs(1);
