//! Replication errors.

use bitstream::BitError;
use layout::LayoutError;
use thiserror::Error;
use wire::{NetId, RpcId, RpcType};

use crate::role::NetRole;

/// Result type for replication operations.
pub type ReplicationResult<T> = Result<T, ReplicationError>;

/// Errors surfaced by replication operations.
///
/// Protocol desync and role misuse on the RPC path are not errors: they are
/// logged, counted in [`NetStats`](crate::NetStats), and the call is dropped.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReplicationError {
    /// A state payload was short or malformed.
    #[error("state decode failed: {0}")]
    Decode(#[from] BitError),

    /// A state payload decoded cleanly but had bytes left over.
    #[error("state payload has {remaining} trailing bytes")]
    TrailingStateData { remaining: usize },

    /// A frame failed to decode.
    #[error("frame decode failed: {0}")]
    Wire(#[from] wire::DecodeError),

    /// A frame failed to encode.
    #[error("frame encode failed: {0}")]
    Encode(#[from] wire::EncodeError),

    /// The layout could not be bound or described.
    #[error("layout error: {0}")]
    Layout(#[from] LayoutError),

    /// A frame was produced by a differently composed layout.
    #[error("layout hash mismatch: expected {expected:#018x}, found {found:#018x}")]
    LayoutMismatch { expected: u64, found: u64 },

    /// No entity with this id is registered.
    #[error("unknown entity {entity}")]
    UnknownEntity { entity: NetId },

    /// An entity with this id is already registered.
    #[error("entity {entity} already exists")]
    DuplicateEntity { entity: NetId },

    /// A role change that the role state machine does not allow.
    #[error("invalid role transition from {from} to {to}")]
    InvalidRoleTransition { from: NetRole, to: NetRole },

    /// A received RPC frame disagreed with the local binding's type.
    #[error("rpc {rpc_id} on {entity} is {expected}, frame says {found}")]
    RpcTypeMismatch {
        entity: NetId,
        rpc_id: RpcId,
        expected: RpcType,
        found: RpcType,
    },

    /// A state frame arrived for an entity this peer is authority for.
    #[error("state for {entity} rejected, local peer is authority")]
    UnexpectedState { entity: NetId },
}
