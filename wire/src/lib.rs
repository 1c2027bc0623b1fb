//! Wire framing for netrep RPC and state traffic.
//!
//! This crate defines the frames a transport carries between peers: an RPC
//! invocation addressed to one entity, or a snapshot of one entity's property
//! set. It also owns the identifiers both peers must agree on ([`NetId`],
//! [`RpcId`], [`RpcType`]). It knows nothing about layouts or roles.
//!
//! # Design Principles
//!
//! - **Stable wire format** - The format is versioned and guarded by a magic number.
//! - **Bounded decoding** - Every length field is validated against [`Limits`] first.
//! - **Layout-checked** - Every frame carries the sender's layout hash.
//!
//! # Frame layout
//!
//! ```text
//! magic u32 | version u16 | kind u8 | layout_hash u64 | entity varu32 | body
//! rpc body:   rpc_id varu32 | rpc_type u8 | payload_len varu32 | payload
//! state body: tick u32 | state_len varu32 | state
//! ```

mod error;
mod frame;
mod header;
mod limits;
mod types;

pub use error::{DecodeError, EncodeError, LimitKind, WireResult};
pub use frame::{decode_frame, encode_rpc_frame, encode_state_frame, Frame, RpcFrame, StateFrame};
pub use header::{FrameHeader, FrameKind, HEADER_FIXED_SIZE, MAGIC, VERSION};
pub use limits::Limits;
pub use types::{NetId, RpcId, RpcType};
