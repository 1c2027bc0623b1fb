//! Per-entity network data.

use bitstream::{BitReader, BitWriter};
use layout::{layout_hash, RepLayout};
use log::{debug, error, warn};
use wire::{NetId, RpcId, RpcType};

use crate::error::{ReplicationError, ReplicationResult};
use crate::role::NetRole;
use crate::stats::NetStats;
use crate::transport::{RpcMessage, RpcTransport};

/// Network state of one entity: its bound layout, roles, and counters.
///
/// Exactly one `NetData` exists per networked entity, owned alongside the
/// entity state it describes. The entity itself is referred to by its
/// [`NetId`] only.
pub struct NetData<E> {
    layout: RepLayout<E>,
    layout_hash: u64,
    role: NetRole,
    remote_role: NetRole,
    entity: Option<NetId>,
    stats: NetStats,
}

impl<E> NetData<E> {
    /// Wraps a layout. The entity is not networked until [`bind`](Self::bind).
    pub fn new(layout: RepLayout<E>) -> ReplicationResult<Self> {
        let layout_hash = layout_hash(&layout.manifest()?);
        Ok(Self {
            layout,
            layout_hash,
            role: NetRole::None,
            remote_role: NetRole::None,
            entity: None,
            stats: NetStats::default(),
        })
    }

    /// Binds the layout to the entity state and records its network id.
    ///
    /// Call once per entity; binding twice double-registers the layout's
    /// bindings.
    pub fn bind(&mut self, state: &mut E, entity: NetId) -> ReplicationResult<()> {
        self.layout.bind(state, entity)?;
        self.entity = Some(entity);
        debug!(
            "bound {entity}: {} properties, {} rpcs, layout {:#018x}",
            self.layout.property_count(),
            self.layout.rpc_count(),
            self.layout_hash
        );
        Ok(())
    }

    /// Network id of the bound entity.
    #[must_use]
    pub const fn entity(&self) -> Option<NetId> {
        self.entity
    }

    /// The bound layout.
    #[must_use]
    pub const fn layout(&self) -> &RepLayout<E> {
        &self.layout
    }

    /// Hash of the layout's manifest.
    #[must_use]
    pub const fn layout_hash(&self) -> u64 {
        self.layout_hash
    }

    /// This peer's role for the entity.
    #[must_use]
    pub const fn role(&self) -> NetRole {
        self.role
    }

    /// Best-known role of the remote peer for the entity.
    #[must_use]
    pub const fn remote_role(&self) -> NetRole {
        self.remote_role
    }

    /// Counters for this entity.
    #[must_use]
    pub const fn stats(&self) -> &NetStats {
        &self.stats
    }

    pub(crate) fn stats_mut(&mut self) -> &mut NetStats {
        &mut self.stats
    }

    /// Sets this peer's role.
    ///
    /// Any networked role may follow any other. Returning to
    /// [`NetRole::None`] is only possible through [`teardown`](Self::teardown).
    pub fn set_role(&mut self, role: NetRole) -> ReplicationResult<()> {
        Self::check_transition(self.role, role)?;
        debug!("{} role {} -> {role}", self.label(), self.role);
        self.role = role;
        Ok(())
    }

    /// Sets the cached role of the remote peer, under the same rules as
    /// [`set_role`](Self::set_role).
    pub fn set_remote_role(&mut self, role: NetRole) -> ReplicationResult<()> {
        Self::check_transition(self.remote_role, role)?;
        self.remote_role = role;
        Ok(())
    }

    fn check_transition(from: NetRole, to: NetRole) -> ReplicationResult<()> {
        if from.is_networked() && !to.is_networked() {
            return Err(ReplicationError::InvalidRoleTransition { from, to });
        }
        Ok(())
    }

    /// Clears both roles as part of entity destruction.
    pub fn teardown(&mut self) {
        debug!("{} torn down", self.label());
        self.role = NetRole::None;
        self.remote_role = NetRole::None;
    }

    /// Writes every property in layout order.
    pub fn serialize(&self, state: &E, out: &mut BitWriter) -> ReplicationResult<()> {
        self.layout.serialize(state, out)?;
        Ok(())
    }

    /// Serializes the property set into a standalone payload.
    pub fn snapshot(&self, state: &E) -> ReplicationResult<Vec<u8>> {
        let mut out = BitWriter::new();
        self.serialize(state, &mut out)?;
        Ok(out.finish())
    }

    /// Reads every property in layout order and applies it.
    ///
    /// The whole property set is validated before anything is applied, so
    /// a short or malformed stream leaves the entity unchanged.
    pub fn deserialize(&mut self, state: &mut E, input: &mut BitReader<'_>) -> ReplicationResult<()> {
        let mut probe = input.clone();
        self.check_stream(&mut probe)?;
        self.layout.deserialize(state, input)?;
        Ok(())
    }

    /// Applies a payload produced by [`snapshot`](Self::snapshot).
    ///
    /// Unlike [`deserialize`](Self::deserialize), the payload must be
    /// consumed exactly.
    pub fn apply_state(&mut self, state: &mut E, payload: &[u8]) -> ReplicationResult<()> {
        let mut probe = BitReader::new(payload);
        self.check_stream(&mut probe)?;
        let remaining = probe.whole_bytes_remaining();
        if remaining > 0 {
            self.stats.state_decode_failures += 1;
            warn!(
                "state for {} has {remaining} trailing bytes, ignoring",
                self.label()
            );
            return Err(ReplicationError::TrailingStateData { remaining });
        }
        self.layout.deserialize(state, &mut BitReader::new(payload))?;
        Ok(())
    }

    fn check_stream(&mut self, probe: &mut BitReader<'_>) -> ReplicationResult<()> {
        if let Err(err) = self.layout.validate_stream(probe) {
            self.stats.state_decode_failures += 1;
            warn!("malformed state for {}: {err}", self.label());
            return Err(err.into());
        }
        Ok(())
    }

    /// Dispatches an RPC either in-process or to the transport.
    ///
    /// A server RPC runs locally when the transport is the authoritative
    /// host. Every other call hands exactly one message to the transport,
    /// whatever this entity's role. Role-based short-circuiting belongs to
    /// [`RpcSender`](crate::RpcSender).
    pub fn send_rpc<T: RpcTransport + ?Sized>(
        &mut self,
        state: &mut E,
        transport: &mut T,
        rpc_id: RpcId,
        rpc_type: RpcType,
        payload: &[u8],
    ) {
        if rpc_type == RpcType::Server && transport.is_authority() {
            self.run_local(state, rpc_id, rpc_type, payload);
            return;
        }

        let Some(entity) = self.entity else {
            error!("{rpc_type} rpc {rpc_id} sent before the entity was bound, dropping");
            return;
        };
        debug!("{entity} {rpc_type} rpc {rpc_id} sent remotely");
        self.stats.rpcs_remote += 1;
        transport.send_remote_rpc(RpcMessage {
            entity,
            rpc_id,
            rpc_type,
            payload: payload.to_vec(),
            layout_hash: self.layout_hash,
        });
    }

    pub(crate) fn run_local(
        &mut self,
        state: &mut E,
        rpc_id: RpcId,
        rpc_type: RpcType,
        payload: &[u8],
    ) {
        debug!(
            "{} {rpc_type} rpc {rpc_id} runs locally (role {})",
            self.label(),
            self.role
        );
        self.stats.rpcs_local += 1;
        self.receive_rpc(state, rpc_id, payload);
    }

    /// Executes a received RPC.
    ///
    /// Unknown ids and undecodable payloads are logged and dropped.
    pub fn receive_rpc(&mut self, state: &mut E, rpc_id: RpcId, payload: &[u8]) {
        let Some(binding) = self.layout.binding(rpc_id) else {
            self.stats.unknown_rpcs += 1;
            warn!(
                "Received unregistered RPC with id {rpc_id} for {}, ignoring",
                label(self.entity)
            );
            return;
        };
        self.stats.rpcs_received += 1;
        if let Err(err) = binding.invoke(state, payload) {
            self.stats.rpc_decode_failures += 1;
            warn!(
                "rpc {} ({rpc_id}) for {} rejected: {err}",
                binding.name(),
                label(self.entity)
            );
        }
    }

    fn label(&self) -> String {
        label(self.entity)
    }
}

fn label(entity: Option<NetId>) -> String {
    entity.map_or_else(|| String::from("unbound entity"), |id| id.to_string())
}

impl<E> std::fmt::Debug for NetData<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NetData")
            .field("entity", &self.entity)
            .field("role", &self.role)
            .field("remote_role", &self.remote_role)
            .field("layout_hash", &format_args!("{:#018x}", self.layout_hash))
            .field("layout", &self.layout)
            .field("stats", &self.stats)
            .finish()
    }
}
