//! RPC senders.

use layout::{encode_value, Replicated};
use log::{error, warn};
use wire::{NetId, RpcId, RpcType};

use crate::net_data::NetData;
use crate::role::NetRole;
use crate::transport::RpcTransport;

/// Handle through which an entity issues one RPC.
///
/// A sender starts unbound and is stamped with its entity and RPC id when
/// the entity's layout binds. It holds no reference to the entity; callers
/// pass the entity's [`NetData`] and state at each send, and a sender bound
/// to a different entity is rejected.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RpcSender {
    binding: Option<(NetId, RpcId)>,
}

impl RpcSender {
    /// Creates a sender that is not bound to any entity.
    #[must_use]
    pub const fn unbound() -> Self {
        Self { binding: None }
    }

    /// Creates a sender bound to an entity's RPC slot.
    #[must_use]
    pub const fn bound(entity: NetId, rpc_id: RpcId) -> Self {
        Self {
            binding: Some((entity, rpc_id)),
        }
    }

    /// Returns `true` once the owning layout has been bound.
    #[must_use]
    pub const fn is_bound(&self) -> bool {
        self.binding.is_some()
    }

    /// Entity this sender was bound to.
    #[must_use]
    pub fn entity(&self) -> Option<NetId> {
        self.binding.map(|(entity, _)| entity)
    }

    /// RPC id this sender was bound to.
    #[must_use]
    pub fn rpc_id(&self) -> Option<RpcId> {
        self.binding.map(|(_, rpc_id)| rpc_id)
    }

    /// Sends a server RPC.
    ///
    /// Never gated by role. An entity whose role is
    /// [`NetRole::Authority`] runs it in-process; otherwise
    /// [`NetData::send_rpc`] decides.
    ///
    /// # Panics
    ///
    /// Panics in debug builds if the sender has not been bound.
    pub fn send_server_rpc<E, T: RpcTransport + ?Sized>(
        self,
        net: &mut NetData<E>,
        state: &mut E,
        transport: &mut T,
        payload: &[u8],
    ) {
        if let Some(rpc_id) = self.check(net) {
            Self::dispatch(net, state, transport, rpc_id, RpcType::Server, payload);
        }
    }

    /// Sends a client RPC.
    ///
    /// Only an entity whose local role is [`NetRole::AuthoritativeProxy`]
    /// may send one; any other role logs a warning and drops the call.
    ///
    /// # Panics
    ///
    /// Panics in debug builds if the sender has not been bound.
    pub fn send_client_rpc<E, T: RpcTransport + ?Sized>(
        self,
        net: &mut NetData<E>,
        state: &mut E,
        transport: &mut T,
        payload: &[u8],
    ) {
        let Some(rpc_id) = self.check(net) else {
            return;
        };
        if net.role() != NetRole::AuthoritativeProxy {
            net.stats_mut().role_rejections += 1;
            warn!(
                "Trying to send client rpc {rpc_id} from a non-authoritative proxy (role {})",
                net.role()
            );
            return;
        }
        Self::dispatch(net, state, transport, rpc_id, RpcType::Client, payload);
    }

    /// Sends a client RPC from the host to the peer that owns the entity.
    ///
    /// Only an entity whose local role is [`NetRole::Authority`] may send
    /// one. The call always goes to the transport.
    ///
    /// # Panics
    ///
    /// Panics in debug builds if the sender has not been bound.
    pub fn send_owner_rpc<E, T: RpcTransport + ?Sized>(
        self,
        net: &mut NetData<E>,
        state: &mut E,
        transport: &mut T,
        payload: &[u8],
    ) {
        let Some(rpc_id) = self.check(net) else {
            return;
        };
        if net.role() != NetRole::Authority {
            net.stats_mut().role_rejections += 1;
            warn!(
                "Trying to send owner rpc {rpc_id} without authority (role {})",
                net.role()
            );
            return;
        }
        net.send_rpc(state, transport, rpc_id, RpcType::Client, payload);
    }

    fn dispatch<E, T: RpcTransport + ?Sized>(
        net: &mut NetData<E>,
        state: &mut E,
        transport: &mut T,
        rpc_id: RpcId,
        rpc_type: RpcType,
        payload: &[u8],
    ) {
        if net.role().short_circuits(rpc_type) {
            net.run_local(state, rpc_id, rpc_type, payload);
        } else {
            net.send_rpc(state, transport, rpc_id, rpc_type, payload);
        }
    }

    /// Encodes `args` and sends them as a server RPC.
    pub fn send_server<E, T: RpcTransport + ?Sized, A: Replicated>(
        self,
        net: &mut NetData<E>,
        state: &mut E,
        transport: &mut T,
        args: &A,
    ) {
        if let Some(payload) = Self::encode(net, args) {
            self.send_server_rpc(net, state, transport, &payload);
        }
    }

    /// Encodes `args` and sends them as a client RPC.
    pub fn send_client<E, T: RpcTransport + ?Sized, A: Replicated>(
        self,
        net: &mut NetData<E>,
        state: &mut E,
        transport: &mut T,
        args: &A,
    ) {
        if let Some(payload) = Self::encode(net, args) {
            self.send_client_rpc(net, state, transport, &payload);
        }
    }

    /// Encodes `args` and sends them to the owning peer as a client RPC.
    pub fn send_to_owner<E, T: RpcTransport + ?Sized, A: Replicated>(
        self,
        net: &mut NetData<E>,
        state: &mut E,
        transport: &mut T,
        args: &A,
    ) {
        if let Some(payload) = Self::encode(net, args) {
            self.send_owner_rpc(net, state, transport, &payload);
        }
    }

    fn encode<E, A: Replicated>(net: &mut NetData<E>, args: &A) -> Option<Vec<u8>> {
        match encode_value(args) {
            Ok(payload) => Some(payload),
            Err(err) => {
                net.stats_mut().rpc_encode_failures += 1;
                warn!("rpc arguments could not be encoded: {err}");
                None
            }
        }
    }

    fn check<E>(self, net: &mut NetData<E>) -> Option<RpcId> {
        let Some((entity, rpc_id)) = self.binding else {
            if cfg!(debug_assertions) {
                panic!("RpcSender used before its entity was bound");
            }
            error!("RpcSender used before its entity was bound, dropping");
            return None;
        };
        if net.entity() != Some(entity) {
            net.stats_mut().stale_senders += 1;
            warn!(
                "rpc {rpc_id} sender bound to {entity} used with {:?}, dropping",
                net.entity()
            );
            return None;
        }
        Some(rpc_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::LoopbackTransport;
    use layout::{LayoutResult, RepLayout, RpcBinding};

    #[derive(Default)]
    struct Bell {
        rung: u32,
    }

    struct Ring(RpcType);

    impl RpcBinding<Bell> for Ring {
        fn name(&self) -> &str {
            "ring"
        }

        fn rpc_type(&self) -> RpcType {
            self.0
        }

        fn on_bind(&mut self, _entity: &mut Bell, _net_id: NetId, _rpc_id: RpcId) {}

        fn invoke(&self, entity: &mut Bell, _payload: &[u8]) -> LayoutResult<()> {
            entity.rung += 1;
            Ok(())
        }
    }

    fn bell(rpc_type: RpcType, id: u32) -> (NetData<Bell>, Bell) {
        let mut net = NetData::new(RepLayout::new().rpc(Ring(rpc_type))).unwrap();
        let mut state = Bell::default();
        net.bind(&mut state, NetId::new(id)).unwrap();
        (net, state)
    }

    #[test]
    fn accessors_reflect_binding() {
        let sender = RpcSender::bound(NetId::new(1), RpcId::new(2));
        assert!(sender.is_bound());
        assert_eq!(sender.entity(), Some(NetId::new(1)));
        assert_eq!(sender.rpc_id(), Some(RpcId::new(2)));
        assert!(!RpcSender::unbound().is_bound());
    }

    #[test]
    fn stale_sender_is_dropped() {
        let (mut net, mut state) = bell(RpcType::Server, 2);
        let mut transport = LoopbackTransport::authority();
        let stale = RpcSender::bound(NetId::new(1), RpcId::new(0));
        stale.send_server_rpc(&mut net, &mut state, &mut transport, &[]);
        assert_eq!(state.rung, 0);
        assert_eq!(net.stats().stale_senders, 1);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "before its entity was bound")]
    fn unbound_sender_panics_in_debug() {
        let (mut net, mut state) = bell(RpcType::Server, 1);
        let mut transport = LoopbackTransport::authority();
        RpcSender::unbound().send_server_rpc(&mut net, &mut state, &mut transport, &[]);
    }

    #[test]
    fn client_rpc_from_authority_is_rejected() {
        let (mut net, mut state) = bell(RpcType::Client, 1);
        net.set_role(NetRole::Authority).unwrap();
        let mut transport = LoopbackTransport::authority();
        let sender = RpcSender::bound(NetId::new(1), RpcId::new(0));
        sender.send_client_rpc(&mut net, &mut state, &mut transport, &[]);
        assert_eq!(state.rung, 0);
        assert!(transport.sent().is_empty());
        assert_eq!(net.stats().role_rejections, 1);
    }

    #[test]
    fn authority_role_runs_server_rpc_locally_on_remote_transport() {
        let (mut net, mut state) = bell(RpcType::Server, 1);
        net.set_role(NetRole::Authority).unwrap();
        let mut transport = LoopbackTransport::remote();
        let sender = RpcSender::bound(NetId::new(1), RpcId::new(0));
        sender.send_server_rpc(&mut net, &mut state, &mut transport, &[]);
        assert!(transport.sent().is_empty());
        assert_eq!(state.rung, 1);
        assert_eq!(net.stats().rpcs_local, 1);
    }

    #[test]
    fn owner_rpc_goes_remote_from_authority() {
        let (mut net, mut state) = bell(RpcType::Client, 4);
        net.set_role(NetRole::Authority).unwrap();
        let mut transport = LoopbackTransport::authority();
        let sender = RpcSender::bound(NetId::new(4), RpcId::new(0));
        sender.send_to_owner(&mut net, &mut state, &mut transport, &9u16);
        let sent = transport.take_sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].rpc_type, RpcType::Client);
        assert_eq!(sent[0].entity, NetId::new(4));
        assert_eq!(state.rung, 0);
    }

    #[test]
    fn owner_rpc_requires_authority() {
        let (mut net, mut state) = bell(RpcType::Client, 4);
        net.set_role(NetRole::AuthoritativeProxy).unwrap();
        let mut transport = LoopbackTransport::remote();
        let sender = RpcSender::bound(NetId::new(4), RpcId::new(0));
        sender.send_owner_rpc(&mut net, &mut state, &mut transport, &[]);
        assert!(transport.sent().is_empty());
        assert_eq!(state.rung, 0);
        assert_eq!(net.stats().role_rejections, 1);
    }

    #[test]
    fn stale_owner_sender_is_dropped() {
        let (mut net, mut state) = bell(RpcType::Client, 4);
        net.set_role(NetRole::Authority).unwrap();
        let mut transport = LoopbackTransport::authority();
        let stale = RpcSender::bound(NetId::new(3), RpcId::new(0));
        stale.send_owner_rpc(&mut net, &mut state, &mut transport, &[]);
        assert!(transport.sent().is_empty());
        assert_eq!(net.stats().stale_senders, 1);
    }

    #[test]
    fn oversized_args_are_counted() {
        let (mut net, mut state) = bell(RpcType::Server, 1);
        let mut transport = LoopbackTransport::remote();
        let sender = RpcSender::bound(NetId::new(1), RpcId::new(0));
        let args = "x".repeat(layout::MAX_STRING_BYTES + 1);
        sender.send_server(&mut net, &mut state, &mut transport, &args);
        assert!(transport.sent().is_empty());
        assert_eq!(net.stats().rpc_encode_failures, 1);
    }
}
