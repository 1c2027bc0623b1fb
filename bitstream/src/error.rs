//! Error types for bitstream operations.

use thiserror::Error;

/// Result type for bitstream operations.
pub type BitResult<T> = Result<T, BitError>;

/// Errors that can occur during bit-level encoding/decoding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BitError {
    /// Attempted to read past the end of the buffer.
    #[error("attempted to read {requested} bits but only {available} bits available")]
    UnexpectedEof {
        /// Number of bits requested.
        requested: usize,
        /// Number of bits available.
        available: usize,
    },

    /// Invalid bit count for the operation.
    #[error("invalid bit count {bits}, maximum allowed is {max_bits}")]
    InvalidBitCount {
        /// The invalid bit count provided.
        bits: u8,
        /// Maximum allowed bits for this operation.
        max_bits: u8,
    },

    /// Value exceeds the range representable by the specified number of bits.
    #[error("value {value} cannot be represented in {bits} bits")]
    ValueOutOfRange {
        /// The value that was out of range.
        value: u64,
        /// Number of bits available.
        bits: u8,
    },

    /// A byte-aligned operation was attempted mid-byte.
    #[error("byte-aligned access at bit position {bit_position}")]
    MisalignedAccess {
        /// Bit position at the time of the access.
        bit_position: usize,
    },

    /// A varint ran past its maximum encoded length.
    #[error("invalid varint encoding")]
    InvalidVarint,

    /// A length prefix exceeded the caller-provided bound.
    #[error("length {len} exceeds limit {limit}")]
    LengthLimitExceeded {
        /// Decoded length.
        len: usize,
        /// Maximum accepted length.
        limit: usize,
    },

    /// Decoded bytes were not valid UTF-8.
    #[error("invalid utf-8 in string payload")]
    InvalidUtf8,
}
