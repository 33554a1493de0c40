//! Protocol module - wire codec, magic numbers, and the basic packet.
//!
//! This module implements the binary wire format:
//! - cursor-based big-endian reader/writer over a byte buffer
//! - the basic packet (magic + command code + length-prefixed body)
//! - command code constants for both frame families

mod packet;
mod wire;

pub use packet::{
    logic, BasicCommand, BasicPacket, HEADER_SIZE, MAGIC_BASIC_PACKET, MAGIC_LOGIC_PACKET,
    MAX_BODY_LEN,
};
pub use wire::{WireReader, WireWriter};
