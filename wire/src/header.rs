//! Frame header types and constants.

use crate::error::DecodeError;
use crate::types::NetId;

/// Magic number identifying netrep frames.
///
/// This value is fixed and must never change across versions.
pub const MAGIC: u32 = 0x4E52_4550; // "NREP" in ASCII

/// Current wire format version.
pub const VERSION: u16 = 1;

/// Size of the fixed part of the header in bytes (15).
///
/// The entity id follows as a varint, so a full header is 16 to 20 bytes.
pub const HEADER_FIXED_SIZE: usize = 4 + 2 + 1 + 8;

/// Kind of body carried by a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum FrameKind {
    /// An RPC invocation addressed to one entity.
    Rpc = 1,
    /// A full property-set snapshot of one entity.
    State = 2,
}

impl FrameKind {
    /// Parses a frame kind from a raw byte.
    pub fn parse(kind: u8) -> Result<Self, DecodeError> {
        match kind {
            1 => Ok(Self::Rpc),
            2 => Ok(Self::State),
            _ => Err(DecodeError::UnknownFrameKind { kind }),
        }
    }
}

/// Frame header.
///
/// The magic number is validated during decoding and is not stored here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
    /// Wire format version.
    pub version: u16,
    /// Body kind.
    pub kind: FrameKind,
    /// Hash of the sender's replication layout for the entity.
    pub layout_hash: u64,
    /// Entity the frame is addressed to.
    pub entity: NetId,
}

impl FrameHeader {
    /// Creates a header for the current version.
    #[must_use]
    pub const fn new(kind: FrameKind, layout_hash: u64, entity: NetId) -> Self {
        Self {
            version: VERSION,
            kind,
            layout_hash,
            entity,
        }
    }
}
