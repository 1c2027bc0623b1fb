//! Frame encoding and decoding.

use bitstream::{BitError, BitReader, BitWriter};

use crate::error::{DecodeError, EncodeError, LimitKind, WireResult};
use crate::header::{FrameHeader, FrameKind, HEADER_FIXED_SIZE, MAGIC, VERSION};
use crate::limits::Limits;
use crate::types::{NetId, RpcId, RpcType};

/// An RPC invocation addressed to one entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RpcFrame<'a> {
    pub layout_hash: u64,
    pub entity: NetId,
    pub rpc_id: RpcId,
    pub rpc_type: RpcType,
    pub payload: &'a [u8],
}

/// A serialized property set of one entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateFrame<'a> {
    pub layout_hash: u64,
    pub entity: NetId,
    /// Sender's simulation tick when the state was captured.
    pub tick: u32,
    pub state: &'a [u8],
}

/// A decoded frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frame<'a> {
    Rpc(RpcFrame<'a>),
    State(StateFrame<'a>),
}

impl Frame<'_> {
    /// Returns the header fields of the frame.
    #[must_use]
    pub const fn header(&self) -> FrameHeader {
        match self {
            Self::Rpc(frame) => FrameHeader::new(FrameKind::Rpc, frame.layout_hash, frame.entity),
            Self::State(frame) => {
                FrameHeader::new(FrameKind::State, frame.layout_hash, frame.entity)
            }
        }
    }

    /// Returns the entity the frame is addressed to.
    #[must_use]
    pub const fn entity(&self) -> NetId {
        self.header().entity
    }
}

/// Encodes an RPC frame.
pub fn encode_rpc_frame(frame: &RpcFrame<'_>, limits: &Limits) -> Result<Vec<u8>, EncodeError> {
    check_payload(frame.payload.len(), limits)?;
    let mut writer = BitWriter::with_capacity(HEADER_FIXED_SIZE + 16 + frame.payload.len());
    write_header(
        &mut writer,
        &FrameHeader::new(FrameKind::Rpc, frame.layout_hash, frame.entity),
    )?;
    writer.write_varu32(u32::from(frame.rpc_id.raw()))?;
    writer.write_u8_aligned(frame.rpc_type as u8)?;
    writer.write_bytes(frame.payload)?;
    finish(writer, limits)
}

/// Encodes a state frame.
pub fn encode_state_frame(
    frame: &StateFrame<'_>,
    limits: &Limits,
) -> Result<Vec<u8>, EncodeError> {
    check_payload(frame.state.len(), limits)?;
    let mut writer = BitWriter::with_capacity(HEADER_FIXED_SIZE + 16 + frame.state.len());
    write_header(
        &mut writer,
        &FrameHeader::new(FrameKind::State, frame.layout_hash, frame.entity),
    )?;
    writer.write_u32_aligned(frame.tick)?;
    writer.write_bytes(frame.state)?;
    finish(writer, limits)
}

/// Decodes a frame, borrowing its body from `buf`.
///
/// The whole buffer must be consumed; trailing bytes are an error.
pub fn decode_frame<'a>(buf: &'a [u8], limits: &Limits) -> WireResult<Frame<'a>> {
    // Smallest frame: fixed header plus a one-byte entity varint.
    if buf.len() <= HEADER_FIXED_SIZE {
        return Err(DecodeError::FrameTooSmall {
            actual: buf.len(),
            required: HEADER_FIXED_SIZE + 1,
        });
    }
    if buf.len() > limits.max_frame_bytes {
        return Err(DecodeError::LimitsExceeded {
            kind: LimitKind::FrameBytes,
            limit: limits.max_frame_bytes,
            actual: buf.len(),
        });
    }

    let mut reader = BitReader::new(buf);
    let magic = reader.read_u32_aligned()?;
    if magic != MAGIC {
        return Err(DecodeError::InvalidMagic { found: magic });
    }
    let version = reader.read_u16_aligned()?;
    if version != VERSION {
        return Err(DecodeError::UnsupportedVersion { found: version });
    }
    let kind = FrameKind::parse(reader.read_u8_aligned()?)?;
    let layout_hash = reader.read_u64_aligned()?;
    let entity = NetId::new(reader.read_varu32()?);

    let frame = match kind {
        FrameKind::Rpc => {
            let raw = reader.read_varu32()?;
            let rpc_id = u16::try_from(raw)
                .map(RpcId::new)
                .map_err(|_| DecodeError::RpcIdOutOfRange { raw })?;
            let rpc_type = RpcType::parse(reader.read_u8_aligned()?)?;
            let payload = read_body(&mut reader, limits)?;
            Frame::Rpc(RpcFrame {
                layout_hash,
                entity,
                rpc_id,
                rpc_type,
                payload,
            })
        }
        FrameKind::State => {
            let tick = reader.read_u32_aligned()?;
            let state = read_body(&mut reader, limits)?;
            Frame::State(StateFrame {
                layout_hash,
                entity,
                tick,
                state,
            })
        }
    };

    if !reader.is_empty() {
        return Err(DecodeError::TrailingBytes {
            remaining: reader.whole_bytes_remaining(),
        });
    }
    Ok(frame)
}

fn write_header(writer: &mut BitWriter, header: &FrameHeader) -> Result<(), EncodeError> {
    writer.write_u32_aligned(MAGIC)?;
    writer.write_u16_aligned(header.version)?;
    writer.write_u8_aligned(header.kind as u8)?;
    writer.write_u64_aligned(header.layout_hash)?;
    writer.write_varu32(header.entity.raw())?;
    Ok(())
}

fn check_payload(len: usize, limits: &Limits) -> Result<(), EncodeError> {
    if len > limits.max_payload_bytes {
        return Err(EncodeError::PayloadTooLarge {
            len,
            limit: limits.max_payload_bytes,
        });
    }
    Ok(())
}

fn finish(writer: BitWriter, limits: &Limits) -> Result<Vec<u8>, EncodeError> {
    let bytes = writer.finish();
    if bytes.len() > limits.max_frame_bytes {
        return Err(EncodeError::FrameTooLarge {
            len: bytes.len(),
            limit: limits.max_frame_bytes,
        });
    }
    Ok(bytes)
}

fn read_body<'a>(reader: &mut BitReader<'a>, limits: &Limits) -> WireResult<&'a [u8]> {
    reader
        .read_bytes(limits.max_payload_bytes)
        .map_err(|err| match err {
            BitError::LengthLimitExceeded { len, limit } => DecodeError::LimitsExceeded {
                kind: LimitKind::PayloadBytes,
                limit,
                actual: len,
            },
            other => other.into(),
        })
}
