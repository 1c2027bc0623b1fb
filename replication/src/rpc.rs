//! Typed RPC bindings.

use layout::{decode_value, LayoutResult, Replicated, RpcBinding};
use wire::{NetId, RpcId, RpcType};

use crate::sender::RpcSender;

/// RPC binding that decodes its payload into `A` and calls a handler.
///
/// On bind it stamps a bound [`RpcSender`] into the entity field returned
/// by its sender accessor, which is how the entity later issues the call.
pub struct Rpc<E, A> {
    name: &'static str,
    rpc_type: RpcType,
    sender: fn(&mut E) -> &mut RpcSender,
    handler: fn(&mut E, A),
}

impl<E, A> Rpc<E, A> {
    /// Declares a server RPC: sent by a proxy, executed on the authority.
    #[must_use]
    pub const fn server(
        name: &'static str,
        sender: fn(&mut E) -> &mut RpcSender,
        handler: fn(&mut E, A),
    ) -> Self {
        Self {
            name,
            rpc_type: RpcType::Server,
            sender,
            handler,
        }
    }

    /// Declares a client RPC: executed on the owning client.
    #[must_use]
    pub const fn client(
        name: &'static str,
        sender: fn(&mut E) -> &mut RpcSender,
        handler: fn(&mut E, A),
    ) -> Self {
        Self {
            name,
            rpc_type: RpcType::Client,
            sender,
            handler,
        }
    }
}

impl<E, A> std::fmt::Debug for Rpc<E, A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Rpc")
            .field("name", &self.name)
            .field("rpc_type", &self.rpc_type)
            .finish_non_exhaustive()
    }
}

impl<E, A: Replicated> RpcBinding<E> for Rpc<E, A> {
    fn name(&self) -> &str {
        self.name
    }

    fn rpc_type(&self) -> RpcType {
        self.rpc_type
    }

    fn on_bind(&mut self, entity: &mut E, net_id: NetId, rpc_id: RpcId) {
        *(self.sender)(entity) = RpcSender::bound(net_id, rpc_id);
    }

    fn invoke(&self, entity: &mut E, payload: &[u8]) -> LayoutResult<()> {
        let args = decode_value::<A>(payload)?;
        (self.handler)(entity, args);
        Ok(())
    }
}
