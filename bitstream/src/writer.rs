//! Bit-level writer for encoding replication payloads.

use crate::error::{BitError, BitResult};

/// A growable bit-level writer.
///
/// Writes are accumulated in an internal buffer. Call [`finish`](Self::finish)
/// to get the final byte buffer. The writer never runs out of capacity;
/// backpressure belongs to the transport.
#[derive(Debug, Default, Clone)]
pub struct BitWriter {
    /// The accumulated bytes.
    bytes: Vec<u8>,
    /// Current byte being written (not yet pushed to bytes).
    current_byte: u8,
    /// Number of bits written to `current_byte` (0-7).
    bit_count: u8,
}

/// A position in a [`BitWriter`], taken with [`BitWriter::mark`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriterMark {
    bytes: usize,
    current_byte: u8,
    bit_count: u8,
}

impl BitWriter {
    /// Creates a new empty `BitWriter`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new `BitWriter` with pre-allocated capacity.
    #[must_use]
    pub fn with_capacity(bytes: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(bytes),
            current_byte: 0,
            bit_count: 0,
        }
    }

    /// Returns the number of bits written so far.
    #[must_use]
    pub fn bits_written(&self) -> usize {
        self.bytes.len() * 8 + self.bit_count as usize
    }

    /// Returns the number of bytes [`finish`](Self::finish) would produce.
    #[must_use]
    pub fn byte_len(&self) -> usize {
        self.bytes.len() + usize::from(self.bit_count > 0)
    }

    /// Returns `true` if the next write starts on a byte boundary.
    #[must_use]
    pub const fn is_aligned(&self) -> bool {
        self.bit_count == 0
    }

    /// Records the current write position.
    #[must_use]
    pub fn mark(&self) -> WriterMark {
        WriterMark {
            bytes: self.bytes.len(),
            current_byte: self.current_byte,
            bit_count: self.bit_count,
        }
    }

    /// Discards everything written since `mark` was taken.
    pub fn rewind(&mut self, mark: WriterMark) {
        debug_assert!(mark.bytes <= self.bytes.len());
        self.bytes.truncate(mark.bytes);
        self.current_byte = mark.current_byte;
        self.bit_count = mark.bit_count;
    }

    /// Writes a single bit.
    pub fn write_bool(&mut self, value: bool) {
        self.current_byte = (self.current_byte << 1) | u8::from(value);
        self.bit_count += 1;
        if self.bit_count == 8 {
            self.bytes.push(self.current_byte);
            self.current_byte = 0;
            self.bit_count = 0;
        }
    }

    /// Writes up to 64 bits from an unsigned integer.
    ///
    /// # Errors
    ///
    /// Returns [`BitError::InvalidBitCount`] if `bits > 64`.
    /// Returns [`BitError::ValueOutOfRange`] if `value` doesn't fit in `bits`.
    pub fn write_bits(&mut self, value: u64, bits: u8) -> BitResult<()> {
        if bits > 64 {
            return Err(BitError::InvalidBitCount { bits, max_bits: 64 });
        }
        if bits == 0 {
            return Ok(());
        }
        if bits < 64 && value >= (1u64 << bits) {
            return Err(BitError::ValueOutOfRange { value, bits });
        }

        for i in (0..bits).rev() {
            self.write_bool((value >> i) & 1 == 1);
        }
        Ok(())
    }

    /// Pads the current byte with zeros so the next write is byte-aligned.
    pub fn align_to_byte(&mut self) {
        while self.bit_count != 0 {
            self.write_bool(false);
        }
    }

    /// Writes a byte-aligned `u8`.
    pub fn write_u8_aligned(&mut self, value: u8) -> BitResult<()> {
        self.write_aligned(&[value])
    }

    /// Writes a byte-aligned `u16` (little-endian).
    pub fn write_u16_aligned(&mut self, value: u16) -> BitResult<()> {
        self.write_aligned(&value.to_le_bytes())
    }

    /// Writes a byte-aligned `u32` (little-endian).
    pub fn write_u32_aligned(&mut self, value: u32) -> BitResult<()> {
        self.write_aligned(&value.to_le_bytes())
    }

    /// Writes a byte-aligned `u64` (little-endian).
    pub fn write_u64_aligned(&mut self, value: u64) -> BitResult<()> {
        self.write_aligned(&value.to_le_bytes())
    }

    /// Writes a byte-aligned varint `u32` (LEB128).
    pub fn write_varu32(&mut self, mut value: u32) -> BitResult<()> {
        self.ensure_aligned()?;
        loop {
            let byte = (value & 0x7F) as u8;
            value >>= 7;
            if value == 0 {
                self.bytes.push(byte);
                return Ok(());
            }
            self.bytes.push(byte | 0x80);
        }
    }

    /// Writes a byte-aligned zigzag varint `i32`.
    pub fn write_vars32(&mut self, value: i32) -> BitResult<()> {
        let zigzag = ((value << 1) ^ (value >> 31)) as u32;
        self.write_varu32(zigzag)
    }

    /// Writes a varint length prefix followed by the raw bytes.
    ///
    /// # Errors
    ///
    /// Returns [`BitError::LengthLimitExceeded`] if `data` is longer than `u32::MAX`.
    pub fn write_bytes(&mut self, data: &[u8]) -> BitResult<()> {
        let len = u32::try_from(data.len()).map_err(|_| BitError::LengthLimitExceeded {
            len: data.len(),
            limit: u32::MAX as usize,
        })?;
        self.write_varu32(len)?;
        self.bytes.extend_from_slice(data);
        Ok(())
    }

    /// Finishes writing and returns the byte buffer.
    ///
    /// If the last byte is incomplete, it is padded with zeros on the right.
    #[must_use]
    pub fn finish(mut self) -> Vec<u8> {
        self.flush_partial();
        self.bytes
    }

    /// Finishes writing and appends to the provided buffer.
    ///
    /// If the last byte is incomplete, it is padded with zeros on the right.
    pub fn finish_into(mut self, buf: &mut Vec<u8>) {
        self.flush_partial();
        buf.append(&mut self.bytes);
    }

    fn flush_partial(&mut self) {
        if self.bit_count > 0 {
            self.current_byte <<= 8 - self.bit_count;
            self.bytes.push(self.current_byte);
            self.current_byte = 0;
            self.bit_count = 0;
        }
    }

    fn ensure_aligned(&self) -> BitResult<()> {
        if self.bit_count != 0 {
            return Err(BitError::MisalignedAccess {
                bit_position: self.bits_written(),
            });
        }
        Ok(())
    }

    fn write_aligned(&mut self, data: &[u8]) -> BitResult<()> {
        self.ensure_aligned()?;
        self.bytes.extend_from_slice(data);
        Ok(())
    }
}
