//! Packet construction and header decoding.
//!
//! Every packet is framed as `magic | crc32 | 0xFF | type | ...`, where the
//! little-endian CRC-32 covers everything from the `0xFF` byte to the end of
//! the datagram. The remote endpoint verifies checksums on what we send;
//! inbound checksums are not re-validated here.

use bytes::{BufMut, Bytes, BytesMut};
use thiserror::Error;

use crate::protocol::constants::{
    BODY_OFFSET, BODY_PREFIX, HEADER_SIZE, LOGIN_ACCEPTED, MULTIPART_MARKER, PACKET_MAGIC,
    TYPE_COMMAND, TYPE_LOGIN, TYPE_MESSAGE,
};
use crate::protocol::text;

/// Errors that may occur while decoding an inbound datagram.
///
/// Decoding never panics; the receive path drops datagrams that fail here.
#[derive(Error, Debug)]
pub enum DecodeError {
    /// The datagram was too short to carry the fixed header.
    #[error("Unexpected EoF, not enough bytes for a packet header.")]
    UnexpectedEof,

    /// The magic prefix or body prefix byte did not match.
    #[error("Datagram does not carry the expected packet framing.")]
    BadMagic,

    /// A type tag that does not map to any known packet kind.
    #[error("Unknown packet type tag: {0:#04x}")]
    UnknownType(u8),
}

/// Sub-header of one fragment of a multi-part server message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PartHeader {
    pub total: u8,
    pub index: u8,
}

/// A decoded inbound datagram.
#[derive(Debug, Clone)]
pub enum InboundPacket {
    /// Reply to the login packet.
    LoginResponse { accepted: bool },
    /// Acknowledgment (and optional response text) for a reliable command.
    CommandResponse { seq: u8, body: Bytes },
    /// Server-originated message; must be acknowledged per fragment.
    ServerMessage {
        seq: u8,
        part: Option<PartHeader>,
        body: Bytes,
    },
}

impl InboundPacket {
    /// Decode the fixed-offset header of an inbound datagram.
    pub fn decode(buf: &[u8]) -> Result<InboundPacket, DecodeError> {
        if buf.len() <= HEADER_SIZE {
            return Err(DecodeError::UnexpectedEof);
        }
        if buf[..2] != PACKET_MAGIC || buf[BODY_OFFSET] != BODY_PREFIX {
            return Err(DecodeError::BadMagic);
        }

        match buf[BODY_OFFSET + 1] {
            TYPE_LOGIN => Ok(InboundPacket::LoginResponse {
                accepted: buf[8] == LOGIN_ACCEPTED,
            }),
            TYPE_COMMAND => Ok(InboundPacket::CommandResponse {
                seq: buf[8],
                body: Bytes::copy_from_slice(&buf[9..]),
            }),
            TYPE_MESSAGE => {
                let seq = buf[8];
                let rest = &buf[9..];
                // A fragmented message carries `0x00 total index` ahead of
                // the fragment payload.
                if rest.len() >= 3 && rest[0] == MULTIPART_MARKER {
                    Ok(InboundPacket::ServerMessage {
                        seq,
                        part: Some(PartHeader {
                            total: rest[1],
                            index: rest[2],
                        }),
                        body: Bytes::copy_from_slice(&rest[3..]),
                    })
                } else {
                    Ok(InboundPacket::ServerMessage {
                        seq,
                        part: None,
                        body: Bytes::copy_from_slice(rest),
                    })
                }
            }
            other => Err(DecodeError::UnknownType(other)),
        }
    }
}

/// CRC-32 over the checksummed portion of a packet (`0xFF` byte onward).
pub fn checksum(body: &[u8]) -> u32 {
    crc32fast::hash(body)
}

fn frame(body: &[u8]) -> Bytes {
    let mut dst = BytesMut::with_capacity(PACKET_MAGIC.len() + 4 + body.len());
    dst.put_slice(&PACKET_MAGIC);
    dst.put_u32_le(checksum(body));
    dst.put_slice(body);
    dst.freeze()
}

/// Build a login packet carrying the shared password.
pub fn encode_login(password: &str) -> Bytes {
    let payload = text::to_wire(password);
    let mut body = BytesMut::with_capacity(2 + payload.len());
    body.put_u8(BODY_PREFIX);
    body.put_u8(TYPE_LOGIN);
    body.put_slice(&payload);
    frame(&body)
}

/// Build a command packet. An empty command is the keepalive.
pub fn encode_command(seq: u8, command: &str) -> Bytes {
    let payload = text::to_wire(command);
    let mut body = BytesMut::with_capacity(3 + payload.len());
    body.put_u8(BODY_PREFIX);
    body.put_u8(TYPE_COMMAND);
    body.put_u8(seq);
    body.put_slice(&payload);
    frame(&body)
}

/// Build an acknowledgment for an inbound server-message fragment.
pub fn encode_acknowledge(seq: u8) -> Bytes {
    let body = [BODY_PREFIX, TYPE_MESSAGE, seq];
    frame(&body)
}
