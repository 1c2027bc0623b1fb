//! Bounded bit and byte stream primitives for netrep.
//!
//! This crate provides [`BitWriter`] and [`BitReader`], the output and input
//! streams that replicated properties and RPC payloads are serialized into.
//!
//! # Design Principles
//!
//! - **No unsafe code** - Safety is paramount.
//! - **Bounded reads** - Every read is bounds-checked; length prefixes are checked
//!   against caller limits before any bytes are consumed.
//! - **No domain knowledge** - This crate knows nothing about entities, roles, or RPCs.
//! - **Explicit errors** - All failures return structured errors, never panic.
//!
//! # Example
//!
//! ```
//! use bitstream::{BitWriter, BitReader};
//!
//! let mut writer = BitWriter::new();
//! writer.write_bool(true);
//! writer.write_bits(42, 7).unwrap();
//! writer.write_varu32(300).unwrap();
//!
//! let bytes = writer.finish();
//!
//! let mut reader = BitReader::new(&bytes);
//! assert_eq!(reader.read_bool().unwrap(), true);
//! assert_eq!(reader.read_bits(7).unwrap(), 42);
//! assert_eq!(reader.read_varu32().unwrap(), 300);
//! ```

mod error;
mod reader;
mod writer;

pub use error::{BitError, BitResult};
pub use reader::BitReader;
pub use writer::{BitWriter, WriterMark};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_roundtrip() {
        let writer = BitWriter::new();
        let bytes = writer.finish();
        assert!(bytes.is_empty());

        let reader = BitReader::new(&bytes);
        assert!(reader.is_empty());
    }

    #[test]
    fn multiple_bools_roundtrip() {
        let pattern = [true, false, true, true, false];
        let mut writer = BitWriter::new();
        for bit in pattern {
            writer.write_bool(bit);
        }
        let bytes = writer.finish();

        let mut reader = BitReader::new(&bytes);
        for bit in pattern {
            assert_eq!(reader.read_bool().unwrap(), bit);
        }
    }

    #[test]
    fn bits_roundtrip_various_sizes() {
        let test_cases = [
            (0b1010u64, 4),
            (0xFFu64, 8),
            (0xABCDu64, 16),
            (0x1234_5678u64, 32),
            (u64::MAX, 64),
        ];

        for (value, bits) in test_cases {
            let mut writer = BitWriter::new();
            writer.write_bits(value, bits).unwrap();
            let bytes = writer.finish();

            let mut reader = BitReader::new(&bytes);
            let read_value = reader.read_bits(bits).unwrap();
            assert_eq!(
                read_value, value,
                "roundtrip failed for {bits}-bit value {value}"
            );
        }
    }

    #[test]
    fn mixed_bit_and_aligned_roundtrip() {
        let mut writer = BitWriter::new();
        writer.write_bool(true);
        writer.write_bits(0b1010, 4).unwrap();
        writer.align_to_byte();
        writer.write_u64_aligned(u64::MAX - 1).unwrap();
        writer.write_vars32(-300).unwrap();
        writer.write_bytes(b"hi").unwrap();
        let bytes = writer.finish();

        let mut reader = BitReader::new(&bytes);
        assert!(reader.read_bool().unwrap());
        assert_eq!(reader.read_bits(4).unwrap(), 0b1010);
        reader.align_to_byte().unwrap();
        assert_eq!(reader.read_u64_aligned().unwrap(), u64::MAX - 1);
        assert_eq!(reader.read_vars32().unwrap(), -300);
        assert_eq!(reader.read_bytes(8).unwrap(), b"hi");
        assert!(reader.is_empty());
    }
}
