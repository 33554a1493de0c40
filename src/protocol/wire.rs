//! Cursor-based wire codec.
//!
//! All multi-byte integers are Big Endian. Strings travel as one byte per
//! character: a byte decodes to its character code (Latin-1), and a
//! character encodes as the low byte of its code point. The protocol only
//! carries single-byte-per-character payloads; multi-byte characters
//! truncate on encode.

use crate::error::{ImwireError, Result};

/// Positional reader over a borrowed byte buffer.
///
/// Every read is bounds-checked and advances the cursor; a short buffer
/// yields [`ImwireError::BufferUnderrun`] instead of reading out of range.
#[derive(Debug)]
pub struct WireReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> WireReader<'a> {
    /// Create a reader positioned at the start of `buf`.
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Current cursor position.
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes left between the cursor and the end of the buffer.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    /// The unread tail of the buffer. Does not advance the cursor.
    #[inline]
    pub fn rest(&self) -> &'a [u8] {
        &self.buf[self.pos..]
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.remaining() < n {
            return Err(ImwireError::BufferUnderrun {
                offset: self.pos,
                needed: n,
                remaining: self.remaining(),
            });
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    /// Read a big-endian u16 and advance the cursor by 2.
    pub fn read_u16(&mut self) -> Result<u16> {
        let b = self.take(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    /// Read a big-endian u32 and advance the cursor by 4.
    pub fn read_u32(&mut self) -> Result<u32> {
        let b = self.take(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// Read a u16 length prefix, then that many single-byte characters.
    pub fn read_string_prefixed(&mut self) -> Result<String> {
        let len = self.read_u16()? as usize;
        self.read_string_fixed(len)
    }

    /// Read exactly `len` bytes, one character per byte.
    pub fn read_string_fixed(&mut self, len: usize) -> Result<String> {
        let bytes = self.take(len)?;
        Ok(bytes.iter().map(|&b| b as char).collect())
    }
}

/// Positional writer over a caller-supplied byte buffer.
///
/// Write methods return `&mut Self` for chaining. The caller allocates the
/// buffer at its exact encoded size (see
/// [`BasicPacket::encode`](super::BasicPacket::encode)).
///
/// # Panics
///
/// Writing past the end of the buffer panics; sizing the buffer is the
/// caller's contract, not a runtime condition.
#[derive(Debug)]
pub struct WireWriter<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> WireWriter<'a> {
    /// Create a writer positioned at the start of `buf`.
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Current cursor position (equals bytes written so far).
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Write a big-endian u16 and advance the cursor by 2.
    pub fn write_u16(&mut self, v: u16) -> &mut Self {
        self.buf[self.pos..self.pos + 2].copy_from_slice(&v.to_be_bytes());
        self.pos += 2;
        self
    }

    /// Write a big-endian u32 and advance the cursor by 4.
    pub fn write_u32(&mut self, v: u32) -> &mut Self {
        self.buf[self.pos..self.pos + 4].copy_from_slice(&v.to_be_bytes());
        self.pos += 4;
        self
    }

    /// Write a string, one byte per character (low byte of the code point).
    ///
    /// With `prefixed`, a u16 character count is written first; a
    /// zero-length prefix is still written for an empty string.
    pub fn write_string(&mut self, s: &str, prefixed: bool) -> &mut Self {
        if prefixed {
            let len = s.chars().count() as u16;
            self.write_u16(len);
        }
        for c in s.chars() {
            self.buf[self.pos] = (c as u32) as u8;
            self.pos += 1;
        }
        self
    }
}
