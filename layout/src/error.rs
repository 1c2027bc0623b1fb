//! Layout errors.

use bitstream::BitError;
use thiserror::Error;

/// Result type for layout operations.
pub type LayoutResult<T> = Result<T, LayoutError>;

/// Errors that can occur when binding a layout or invoking one of its RPCs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LayoutError {
    /// More RPC bindings than an [`RpcId`](wire::RpcId) can address.
    #[error("layout declares {count} rpcs, at most {max} are addressable")]
    TooManyRpcs { count: usize, max: usize },

    /// An RPC payload could not be decoded into its argument type.
    #[error("rpc payload decode failed: {0}")]
    Decode(#[from] BitError),

    /// An RPC payload decoded cleanly but had bytes left over.
    #[error("rpc payload has {remaining} trailing bytes")]
    TrailingPayload { remaining: usize },
}
