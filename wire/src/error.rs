//! Error types for wire format operations.

use std::fmt;

use bitstream::BitError;
use thiserror::Error;

/// Result type for wire format decoding.
pub type WireResult<T> = Result<T, DecodeError>;

/// Decode errors for frame parsing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum DecodeError {
    /// Frame is too small to contain the fixed header.
    #[error("frame too small: {actual} bytes, need at least {required}")]
    FrameTooSmall { actual: usize, required: usize },

    /// Invalid magic number in frame header.
    #[error("invalid magic number: 0x{found:08X}")]
    InvalidMagic { found: u32 },

    /// Unsupported wire version.
    #[error("unsupported wire version: {found}")]
    UnsupportedVersion { found: u16 },

    /// Unknown frame kind byte.
    #[error("unknown frame kind: {kind}")]
    UnknownFrameKind { kind: u8 },

    /// Unknown RPC type byte.
    #[error("unknown rpc type: {raw}")]
    UnknownRpcType { raw: u8 },

    /// RPC id does not fit the id space.
    #[error("rpc id {raw} out of range")]
    RpcIdOutOfRange { raw: u32 },

    /// Limits exceeded.
    #[error("{kind} limit exceeded: {actual} > {limit}")]
    LimitsExceeded {
        kind: LimitKind,
        limit: usize,
        actual: usize,
    },

    /// Bytes left over after the frame body.
    #[error("{remaining} trailing bytes after frame body")]
    TrailingBytes { remaining: usize },

    /// Underlying stream error (truncation, bad varint).
    #[error("bitstream error: {0}")]
    Bitstream(#[from] BitError),
}

/// Specific wire limits that can be exceeded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimitKind {
    FrameBytes,
    PayloadBytes,
}

impl fmt::Display for LimitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::FrameBytes => "frame bytes",
            Self::PayloadBytes => "payload bytes",
        };
        write!(f, "{name}")
    }
}

/// Errors that can occur during encoding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    /// Body exceeds the payload limit.
    #[error("payload of {len} bytes exceeds limit {limit}")]
    PayloadTooLarge { len: usize, limit: usize },

    /// Encoded frame exceeds the frame limit.
    #[error("frame of {len} bytes exceeds limit {limit}")]
    FrameTooLarge { len: usize, limit: usize },

    /// Underlying stream error.
    #[error("bitstream error: {0}")]
    Bitstream(#[from] BitError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_error_display_invalid_magic() {
        let err = DecodeError::InvalidMagic { found: 0xDEAD_BEEF };
        let msg = err.to_string();
        assert!(msg.contains("DEADBEEF"));
    }

    #[test]
    fn decode_error_display_limits_exceeded() {
        let err = DecodeError::LimitsExceeded {
            kind: LimitKind::PayloadBytes,
            limit: 4,
            actual: 10,
        };
        let msg = err.to_string();
        assert!(msg.contains("payload bytes"));
        assert!(msg.contains("10"));
    }

    #[test]
    fn decode_error_from_bit_error() {
        let err: DecodeError = BitError::InvalidVarint.into();
        assert!(matches!(err, DecodeError::Bitstream(BitError::InvalidVarint)));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn encode_error_display() {
        let err = EncodeError::PayloadTooLarge { len: 10, limit: 4 };
        let msg = err.to_string();
        assert!(msg.contains("10"));
        assert!(msg.contains('4'));
    }
}
