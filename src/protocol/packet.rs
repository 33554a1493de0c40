//! The basic packet - magic, command code, length-prefixed body.
//!
//! Wire layout, all integers Big Endian:
//! ```text
//! ┌──────────┬──────────┬──────────┬──────────────┐
//! │ Magic    │ Command  │ Body len │ Body         │
//! │ 4 bytes  │ 2 bytes  │ 2 bytes  │ 0-65535 B    │
//! │ uint32   │ uint16   │ uint16   │ 1 B per char │
//! └──────────┴──────────┴──────────┴──────────────┘
//! ```
//!
//! The magic discriminates frame families multiplexed on one connection;
//! only the basic family is routed today.

use bytes::Bytes;

use super::wire::{WireReader, WireWriter};
use crate::error::{ImwireError, Result};

/// Magic of the basic packet family (PING/PONG).
pub const MAGIC_BASIC_PACKET: u32 = 123_456_789;

/// Magic of the logic packet family. Reserved; this client does not route it.
pub const MAGIC_LOGIC_PACKET: u32 = 987_654_321;

/// Fixed bytes before the body: magic + command code + body length prefix.
pub const HEADER_SIZE: usize = 8;

/// Longest body a u16 length prefix can describe.
pub const MAX_BODY_LEN: usize = u16::MAX as usize;

/// Command codes of the basic packet family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum BasicCommand {
    /// Client-to-server liveness probe.
    Ping = 1,
    /// Server's answer to a ping.
    Pong = 2,
}

impl BasicCommand {
    /// Map a raw command code to a known command, if any.
    pub fn from_code(code: u16) -> Option<Self> {
        match code {
            1 => Some(Self::Ping),
            2 => Some(Self::Pong),
            _ => None,
        }
    }
}

/// Reserved command codes of the logic packet family
/// ([`MAGIC_LOGIC_PACKET`]). Carried for wire compatibility; unrouted.
pub mod logic {
    /// Logic-family liveness probe.
    pub const PING: u16 = 100;
    /// Logic-family liveness answer.
    pub const PONG: u16 = 101;
    /// Group chat message.
    pub const GROUP_MESSAGE: u16 = 102;
}

/// A basic frame: command code plus a single-byte-per-character body.
///
/// The body length invariant (≤ 65535) is enforced at construction, so
/// [`encode`](Self::encode) cannot fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BasicPacket {
    code: u16,
    body: String,
}

impl BasicPacket {
    /// Create a packet with an arbitrary command code.
    ///
    /// Fails with [`ImwireError::OversizedBody`] when the body has more
    /// characters than the u16 length prefix can carry.
    pub fn new(code: u16, body: impl Into<String>) -> Result<Self> {
        let body = body.into();
        let len = body.chars().count();
        if len > MAX_BODY_LEN {
            return Err(ImwireError::OversizedBody(len));
        }
        Ok(Self { code, body })
    }

    /// An empty-bodied PING.
    pub fn ping() -> Self {
        Self {
            code: BasicCommand::Ping as u16,
            body: String::new(),
        }
    }

    /// An empty-bodied PONG.
    pub fn pong() -> Self {
        Self {
            code: BasicCommand::Pong as u16,
            body: String::new(),
        }
    }

    /// Raw command code.
    #[inline]
    pub fn code(&self) -> u16 {
        self.code
    }

    /// The command this code maps to, if the client knows it.
    #[inline]
    pub fn command(&self) -> Option<BasicCommand> {
        BasicCommand::from_code(self.code)
    }

    /// Body payload.
    #[inline]
    pub fn body(&self) -> &str {
        &self.body
    }

    /// Encode the full frame, magic included.
    ///
    /// Allocates exactly `HEADER_SIZE + body length` bytes; an empty body
    /// still gets its zero-length prefix.
    pub fn encode(&self) -> Bytes {
        let body_len = self.body.chars().count();
        let mut buf = vec![0u8; HEADER_SIZE + body_len];
        WireWriter::new(&mut buf)
            .write_u32(MAGIC_BASIC_PACKET)
            .write_u16(self.code)
            .write_string(&self.body, true);
        Bytes::from(buf)
    }

    /// Decode a frame whose magic the caller has already consumed; `buf`
    /// starts at the command code.
    ///
    /// Fails with [`ImwireError::MalformedFrame`] when the declared body
    /// length exceeds the remaining buffer.
    pub fn decode(buf: &[u8]) -> Result<Self> {
        let mut reader = WireReader::new(buf);
        let code = reader.read_u16()?;
        let len = reader.read_u16()? as usize;
        if len > reader.remaining() {
            return Err(ImwireError::MalformedFrame(format!(
                "declared body of {len} bytes, only {} remaining",
                reader.remaining()
            )));
        }
        let body = reader.read_string_fixed(len)?;
        Ok(Self { code, body })
    }
}
