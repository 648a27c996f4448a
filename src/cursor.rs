//! Byte cursor over a captured packet.
//!
//! A [`Cursor`] borrows the packet bytes for the duration of one decode and hands out big-endian
//! primitives from its current offset. It runs in one of two modes:
//!
//! * strict (the default), where a read past the end of the buffer fails with
//!   [`Error::TooShort`], and
//! * truncating, used for the copy of an original packet embedded in an ICMP error body. A short
//!   read there exhausts the cursor and yields `None`, and the cursor remembers that it came up
//!   short so that no further fields get assigned.

use crate::errors::Error;

#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    bytes: &'a [u8],
    offset: usize,
    truncation_allowed: bool,
    truncated: bool,
}

impl<'a> Cursor<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self {
            bytes,
            offset: 0,
            truncation_allowed: false,
            truncated: false,
        }
    }

    /// Current read position from the start of the buffer.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Number of bytes left to read.
    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.offset
    }

    /// Switches the cursor to truncating mode. There is no way back.
    pub fn allow_truncation(&mut self) {
        if !self.truncation_allowed {
            log_trace!("truncating reads from offset {}", self.offset);
        }
        self.truncation_allowed = true;
    }

    pub fn truncation_allowed(&self) -> bool {
        self.truncation_allowed
    }

    /// Whether a truncating read has come up short.
    pub fn is_truncated(&self) -> bool {
        self.truncated
    }

    /// Next byte, without advancing.
    pub fn peek(&self) -> Option<u8> {
        self.bytes.get(self.offset).copied()
    }

    /// Reads the next `len` bytes.
    pub fn bytes(&mut self, len: usize) -> Result<Option<&'a [u8]>, Error> {
        let available = self.remaining();
        if len <= available {
            let start = self.offset;
            self.offset += len;
            return Ok(Some(&self.bytes[start..self.offset]));
        }

        if self.truncation_allowed {
            self.offset = self.bytes.len();
            self.truncated = true;
            return Ok(None);
        }

        Err(Error::TooShort {
            offset: self.offset,
            required: len,
            available,
            data: hex::encode(&self.bytes[self.offset..]),
        })
    }

    pub fn array<const N: usize>(&mut self) -> Result<Option<[u8; N]>, Error> {
        Ok(self.bytes(N)?.map(|slice| {
            let mut array = [0_u8; N];
            array.copy_from_slice(slice);
            array
        }))
    }

    pub fn u8(&mut self) -> Result<Option<u8>, Error> {
        Ok(self.array::<1>()?.map(|[byte]| byte))
    }

    pub fn u16(&mut self) -> Result<Option<u16>, Error> {
        Ok(self.array()?.map(u16::from_be_bytes))
    }

    pub fn u32(&mut self) -> Result<Option<u32>, Error> {
        Ok(self.array()?.map(u32::from_be_bytes))
    }

    pub fn skip(&mut self, len: usize) -> Result<(), Error> {
        self.bytes(len).map(|_| ())
    }

    /// Takes every unread byte, leaving the cursor at the end of the buffer.
    pub fn unused(&mut self) -> &'a [u8] {
        let rest = &self.bytes[self.offset..];
        self.offset = self.bytes.len();
        rest
    }
}
