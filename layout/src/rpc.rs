//! RPC binding capability.

use wire::{NetId, RpcId, RpcType};

use crate::error::LayoutResult;

/// A callable slot in a replication layout.
///
/// A binding is declared with exactly one [`RpcType`]. When the layout binds
/// to an entity the binding learns its positional [`RpcId`]; afterwards every
/// received payload for that id is handed to [`invoke`](Self::invoke).
pub trait RpcBinding<E> {
    /// Name used in manifests and diagnostics.
    fn name(&self) -> &str;

    /// Direction of the call.
    fn rpc_type(&self) -> RpcType;

    /// Called once when the owning layout is bound to an entity.
    ///
    /// Receives the entity state so the binding can install whatever the
    /// entity needs to issue the call (typically a sender handle).
    fn on_bind(&mut self, entity: &mut E, net_id: NetId, rpc_id: RpcId);

    /// Executes a received payload against the entity.
    fn invoke(&self, entity: &mut E, payload: &[u8]) -> LayoutResult<()>;
}
