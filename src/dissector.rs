//! Field-by-field assembly of decoded records.
//!
//! A [`Dissector`] wraps a [`Cursor`] together with the record `P` being built and a scratch
//! record `T` holding values that only steer decoding (header lengths, next-protocol codes, raw
//! flag words). Each operation names its target field through an accessor closure such as
//! `|p| &mut p.ttl`, reads from the cursor if needed and stores the result. Operations chain:
//!
//! ```
//! # use incision::cursor::Cursor;
//! # use incision::dissector::{BitRange, Dissector};
//! #[derive(Default)]
//! struct Header {
//!     version: Option<u8>,
//!     length: Option<u16>,
//! }
//!
//! #[derive(Default)]
//! struct Scratch {
//!     first: Option<u8>,
//! }
//!
//! let bytes = [0x45, 0x00, 0x1c];
//! let mut cursor = Cursor::new(&bytes);
//! let mut d = Dissector::<Header, Scratch>::new(&mut cursor);
//! d.temp(|t| &mut t.first)?
//!     .bits(|t| t.first, BitRange::new(7, 4), |p| &mut p.version)
//!     .scalar(|p| &mut p.length)?;
//!
//! let header = d.finish();
//! assert_eq!(header.version, Some(4));
//! assert_eq!(header.length, Some(0x1c));
//! # Ok::<(), incision::Error>(())
//! ```
//!
//! Once the cursor reports a truncated read, every later operation leaves its field absent.

use crate::cursor::Cursor;
use crate::errors::Error;
use crate::types::{FlagSet, RawBytes};

/// Fixed width big-endian value that can be read from a [`Cursor`].
pub trait Scalar: Copy + Into<u32> {
    fn read(cursor: &mut Cursor<'_>) -> Result<Option<Self>, Error>;
}

impl Scalar for u8 {
    fn read(cursor: &mut Cursor<'_>) -> Result<Option<Self>, Error> {
        cursor.u8()
    }
}

impl Scalar for u16 {
    fn read(cursor: &mut Cursor<'_>) -> Result<Option<Self>, Error> {
        cursor.u16()
    }
}

impl Scalar for u32 {
    fn read(cursor: &mut Cursor<'_>) -> Result<Option<Self>, Error> {
        cursor.u32()
    }
}

/// Field type that can hold an extracted bit range.
pub trait FromBits {
    fn from_bits(bits: u32) -> Self;
}

macro_rules! impl_from_bits {
    ($($ty:ty),*) => {
        $(
            impl FromBits for $ty {
                fn from_bits(bits: u32) -> Self {
                    bits as $ty
                }
            }
        )*
    };
}

impl_from_bits!(u8, u16, u32);

impl FromBits for bool {
    fn from_bits(bits: u32) -> Self {
        bits != 0
    }
}

/// Inclusive range of bits, numbered from the least significant bit upwards and written most
/// significant end first: `BitRange::new(7, 4)` is the high nibble of a byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitRange {
    start: u8,
    finish: u8,
}

impl BitRange {
    pub const fn new(start: u8, finish: u8) -> Self {
        assert!(start >= finish && start < 32);
        Self { start, finish }
    }

    pub const fn bit(index: u8) -> Self {
        Self::new(index, index)
    }

    pub fn extract(&self, value: u32) -> u32 {
        let width = u32::from(self.start - self.finish) + 1;
        let mask = ((1_u64 << width) - 1) as u32;
        (value >> self.finish) & mask
    }
}

/// Flag name to bit index table, used by [`Dissector::flags`].
pub type FlagTable = [(&'static str, u8)];

pub struct Dissector<'c, 'a, P, T = ()> {
    cursor: &'c mut Cursor<'a>,
    packet: P,
    temp: T,
}

impl<'c, 'a, P: Default, T: Default> Dissector<'c, 'a, P, T> {
    pub fn new(cursor: &'c mut Cursor<'a>) -> Self {
        Self {
            cursor,
            packet: P::default(),
            temp: T::default(),
        }
    }
}

impl<'c, 'a, P, T> Dissector<'c, 'a, P, T> {
    /// The record built so far.
    pub fn packet(&self) -> &P {
        &self.packet
    }

    /// The scratch record built so far.
    pub fn scratch(&self) -> &T {
        &self.temp
    }

    /// The underlying cursor, for reads that do not fit the operations below.
    pub fn cursor(&mut self) -> &mut Cursor<'a> {
        &mut *self.cursor
    }

    pub fn remaining(&self) -> usize {
        self.cursor.remaining()
    }

    pub fn finish(self) -> P {
        self.packet
    }

    fn active(&self) -> bool {
        !self.cursor.is_truncated()
    }

    /// Sets a field without reading anything.
    pub fn constant<V>(
        &mut self,
        slot: impl FnOnce(&mut P) -> &mut Option<V>,
        value: V,
    ) -> &mut Self {
        *slot(&mut self.packet) = Some(value);
        self
    }

    pub fn scalar<V: Scalar>(
        &mut self,
        slot: impl FnOnce(&mut P) -> &mut Option<V>,
    ) -> Result<&mut Self, Error> {
        self.scalar_with(slot, |value: V| value)
    }

    /// Reads a scalar and stores `convert(value)`.
    pub fn scalar_with<V: Scalar, O>(
        &mut self,
        slot: impl FnOnce(&mut P) -> &mut Option<O>,
        convert: impl FnOnce(V) -> O,
    ) -> Result<&mut Self, Error> {
        if self.active() {
            if let Some(value) = V::read(&mut *self.cursor)? {
                *slot(&mut self.packet) = Some(convert(value));
            }
        }
        Ok(self)
    }

    /// Reads a scalar into the scratch record only.
    pub fn temp<V: Scalar>(
        &mut self,
        slot: impl FnOnce(&mut T) -> &mut Option<V>,
    ) -> Result<&mut Self, Error> {
        if self.active() {
            if let Some(value) = V::read(&mut *self.cursor)? {
                *slot(&mut self.temp) = Some(value);
            }
        }
        Ok(self)
    }

    /// Copies a bit range of a scratch value into a field.
    pub fn bits<V: Into<u32>, O: FromBits>(
        &mut self,
        from: impl FnOnce(&T) -> Option<V>,
        range: BitRange,
        slot: impl FnOnce(&mut P) -> &mut Option<O>,
    ) -> &mut Self {
        self.bits_with(from, range, slot, O::from_bits)
    }

    pub fn bits_with<V: Into<u32>, O>(
        &mut self,
        from: impl FnOnce(&T) -> Option<V>,
        range: BitRange,
        slot: impl FnOnce(&mut P) -> &mut Option<O>,
        convert: impl FnOnce(u32) -> O,
    ) -> &mut Self {
        if let Some(value) = from(&self.temp) {
            *slot(&mut self.packet) = Some(convert(range.extract(value.into())));
        }
        self
    }

    /// Turns the bits of a scratch value named in `table` into a set of flag names.
    pub fn flags<V: Into<u32>>(
        &mut self,
        from: impl FnOnce(&T) -> Option<V>,
        table: &'static FlagTable,
        slot: impl FnOnce(&mut P) -> &mut Option<FlagSet>,
    ) -> &mut Self {
        if let Some(value) = from(&self.temp) {
            *slot(&mut self.packet) = Some(FlagSet::from_bits(value.into(), table));
        }
        self
    }

    pub fn bytes(
        &mut self,
        slot: impl FnOnce(&mut P) -> &mut Option<RawBytes>,
        len: usize,
    ) -> Result<&mut Self, Error> {
        self.bytes_with(slot, len, RawBytes::from)
    }

    /// Reads `len` bytes and stores `convert(bytes)`.
    pub fn bytes_with<O>(
        &mut self,
        slot: impl FnOnce(&mut P) -> &mut Option<O>,
        len: usize,
        convert: impl FnOnce(&'a [u8]) -> O,
    ) -> Result<&mut Self, Error> {
        if self.active() {
            if let Some(bytes) = self.cursor.bytes(len)? {
                *slot(&mut self.packet) = Some(convert(bytes));
            }
        }
        Ok(self)
    }

    /// As [`Dissector::bytes_with`], for conversions that can fail.
    pub fn bytes_try<O>(
        &mut self,
        slot: impl FnOnce(&mut P) -> &mut Option<O>,
        len: usize,
        convert: impl FnOnce(&'a [u8]) -> Result<O, Error>,
    ) -> Result<&mut Self, Error> {
        if self.active() {
            if let Some(bytes) = self.cursor.bytes(len)? {
                *slot(&mut self.packet) = Some(convert(bytes)?);
            }
        }
        Ok(self)
    }

    pub fn skip(&mut self, len: usize) -> Result<&mut Self, Error> {
        if self.active() {
            self.cursor.skip(len)?;
        }
        Ok(self)
    }

    /// Collects `count` items read by `each`. A truncated read ends the list early, keeping the
    /// items read before it.
    pub fn times<V>(
        &mut self,
        slot: impl FnOnce(&mut P) -> &mut Option<Vec<V>>,
        count: usize,
        mut each: impl FnMut(&mut Cursor<'a>) -> Result<Option<V>, Error>,
    ) -> Result<&mut Self, Error> {
        if !self.active() {
            return Ok(self);
        }

        let mut items = Vec::with_capacity(count.min(self.cursor.remaining()));
        for _ in 0..count {
            match each(&mut *self.cursor)? {
                Some(item) => items.push(item),
                None => break,
            }
        }
        *slot(&mut self.packet) = Some(items);
        Ok(self)
    }

    /// Collects items read by `each` for as long as `cond` holds before an iteration.
    ///
    /// Stops as well when an iteration reads nothing, when `each` returns `None` or when the
    /// cursor gets truncated, so the loop is bounded by the buffer length.
    pub fn repeat_while<V>(
        &mut self,
        slot: impl FnOnce(&mut P) -> &mut Option<Vec<V>>,
        mut cond: impl FnMut(&Cursor<'a>, &T) -> bool,
        mut each: impl FnMut(&mut Cursor<'a>, &mut T) -> Result<Option<V>, Error>,
    ) -> Result<&mut Self, Error> {
        if !self.active() {
            return Ok(self);
        }

        let mut items = Vec::new();
        while !self.cursor.is_truncated() && cond(&*self.cursor, &self.temp) {
            let before = self.cursor.offset();
            match each(&mut *self.cursor, &mut self.temp)? {
                Some(item) => items.push(item),
                None => break,
            }
            if self.cursor.offset() == before {
                break;
            }
        }
        *slot(&mut self.packet) = Some(items);
        Ok(self)
    }

    /// Decodes a nested record from the current position.
    pub fn nested<V>(
        &mut self,
        slot: impl FnOnce(&mut P) -> &mut Option<V>,
        dissect: impl FnOnce(&mut Cursor<'a>) -> Result<V, Error>,
    ) -> Result<&mut Self, Error> {
        if self.active() {
            let value = dissect(&mut *self.cursor)?;
            *slot(&mut self.packet) = Some(value);
        }
        Ok(self)
    }

    /// Captures every unread byte.
    pub fn remainder(&mut self, slot: impl FnOnce(&mut P) -> &mut Option<RawBytes>) -> &mut Self {
        if self.active() {
            *slot(&mut self.packet) = Some(self.cursor.unused().into());
        }
        self
    }
}
