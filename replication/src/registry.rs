//! Entity registry: the local store of networked entities.

use std::collections::BTreeMap;

use layout::{RepLayout, Replicated};
use log::{debug, warn};
use wire::{decode_frame, encode_state_frame, Frame, NetId, RpcFrame, RpcId, StateFrame};

use crate::config::ReplicationConfig;
use crate::error::{ReplicationError, ReplicationResult};
use crate::net_data::NetData;
use crate::role::NetRole;
use crate::sender::RpcSender;
use crate::stats::{NetStats, RegistryStats};
use crate::transport::{FrameSink, FrameSource, RpcTransport};

/// A networked entity: its id, application state, and network data.
#[derive(Debug)]
pub struct NetEntity<E> {
    id: NetId,
    pub state: E,
    pub net: NetData<E>,
}

impl<E> NetEntity<E> {
    /// Network id of the entity.
    #[must_use]
    pub const fn id(&self) -> NetId {
        self.id
    }

    /// Sends a server RPC through the sender selected from the entity state.
    pub fn send_server<T: RpcTransport + ?Sized, A: Replicated>(
        &mut self,
        sender: fn(&E) -> RpcSender,
        transport: &mut T,
        args: &A,
    ) {
        sender(&self.state).send_server(&mut self.net, &mut self.state, transport, args);
    }

    /// Sends a client RPC through the sender selected from the entity state.
    pub fn send_client<T: RpcTransport + ?Sized, A: Replicated>(
        &mut self,
        sender: fn(&E) -> RpcSender,
        transport: &mut T,
        args: &A,
    ) {
        sender(&self.state).send_client(&mut self.net, &mut self.state, transport, args);
    }

    /// Sends a client RPC from the authority to the entity's owner.
    pub fn send_to_owner<T: RpcTransport + ?Sized, A: Replicated>(
        &mut self,
        sender: fn(&E) -> RpcSender,
        transport: &mut T,
        args: &A,
    ) {
        sender(&self.state).send_to_owner(&mut self.net, &mut self.state, transport, args);
    }
}

/// Summary of one [`NetRegistry::drain`] call.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DrainReport {
    /// Frames dispatched.
    pub applied: usize,
    /// Frames rejected.
    pub rejected: usize,
}

impl DrainReport {
    /// Frames taken from the source.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.applied + self.rejected
    }
}

/// Networked entities known to this peer, keyed by network id.
///
/// All methods run on the simulation thread. Inbound traffic is pulled from
/// a [`FrameSource`] once per tick and applied in arrival order.
#[derive(Debug)]
pub struct NetRegistry<E> {
    entities: BTreeMap<NetId, NetEntity<E>>,
    config: ReplicationConfig,
    stats: RegistryStats,
}

impl<E> Default for NetRegistry<E> {
    fn default() -> Self {
        Self::new(ReplicationConfig::default())
    }
}

impl<E> NetRegistry<E> {
    /// Creates an empty registry.
    #[must_use]
    pub fn new(config: ReplicationConfig) -> Self {
        Self {
            entities: BTreeMap::new(),
            config,
            stats: RegistryStats::default(),
        }
    }

    /// Registry configuration.
    #[must_use]
    pub const fn config(&self) -> &ReplicationConfig {
        &self.config
    }

    /// Inbound traffic counters.
    #[must_use]
    pub const fn stats(&self) -> &RegistryStats {
        &self.stats
    }

    /// Sum of every entity's counters.
    #[must_use]
    pub fn total_stats(&self) -> NetStats {
        let mut total = NetStats::default();
        for entity in self.entities.values() {
            total.merge(entity.net.stats());
        }
        total
    }

    /// Number of entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Returns `true` if no entities are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Looks up an entity.
    #[must_use]
    pub fn get(&self, id: NetId) -> Option<&NetEntity<E>> {
        self.entities.get(&id)
    }

    /// Looks up an entity mutably.
    pub fn get_mut(&mut self, id: NetId) -> Option<&mut NetEntity<E>> {
        self.entities.get_mut(&id)
    }

    /// Iterates over entities in id order.
    pub fn iter(&self) -> impl Iterator<Item = &NetEntity<E>> {
        self.entities.values()
    }

    /// Registers an entity, binds its layout, and assigns its roles.
    pub fn spawn(
        &mut self,
        id: NetId,
        mut state: E,
        layout: RepLayout<E>,
        role: NetRole,
        remote_role: NetRole,
    ) -> ReplicationResult<&mut NetEntity<E>> {
        if self.entities.contains_key(&id) {
            return Err(ReplicationError::DuplicateEntity { entity: id });
        }
        let mut net = NetData::new(layout)?;
        net.bind(&mut state, id)?;
        net.set_role(role)?;
        net.set_remote_role(remote_role)?;
        debug!("spawned {id} as {role}, remote {remote_role}");
        Ok(self
            .entities
            .entry(id)
            .or_insert(NetEntity { id, state, net }))
    }

    /// Removes an entity, clearing its roles.
    pub fn despawn(&mut self, id: NetId) -> Option<NetEntity<E>> {
        let mut entity = self.entities.remove(&id)?;
        entity.net.teardown();
        debug!("despawned {id}");
        Some(entity)
    }

    /// Sends a server RPC from an entity.
    pub fn send_server<T: RpcTransport + ?Sized, A: Replicated>(
        &mut self,
        id: NetId,
        sender: fn(&E) -> RpcSender,
        transport: &mut T,
        args: &A,
    ) -> ReplicationResult<()> {
        let entity = self
            .entities
            .get_mut(&id)
            .ok_or(ReplicationError::UnknownEntity { entity: id })?;
        entity.send_server(sender, transport, args);
        Ok(())
    }

    /// Sends a client RPC from an entity.
    pub fn send_client<T: RpcTransport + ?Sized, A: Replicated>(
        &mut self,
        id: NetId,
        sender: fn(&E) -> RpcSender,
        transport: &mut T,
        args: &A,
    ) -> ReplicationResult<()> {
        let entity = self
            .entities
            .get_mut(&id)
            .ok_or(ReplicationError::UnknownEntity { entity: id })?;
        entity.send_client(sender, transport, args);
        Ok(())
    }

    /// Sends a client RPC from an authority entity to its owner.
    pub fn send_to_owner<T: RpcTransport + ?Sized, A: Replicated>(
        &mut self,
        id: NetId,
        sender: fn(&E) -> RpcSender,
        transport: &mut T,
        args: &A,
    ) -> ReplicationResult<()> {
        let entity = self
            .entities
            .get_mut(&id)
            .ok_or(ReplicationError::UnknownEntity { entity: id })?;
        entity.send_to_owner(sender, transport, args);
        Ok(())
    }

    /// Delivers an inbound RPC to its entity.
    ///
    /// RPCs for unknown entities are logged and dropped.
    pub fn on_rpc_received(&mut self, entity: NetId, rpc_id: RpcId, payload: &[u8]) {
        let Some(target) = self.entities.get_mut(&entity) else {
            self.stats.unknown_entities += 1;
            warn!("rpc {rpc_id} for unknown entity {entity}, ignoring");
            return;
        };
        target.net.receive_rpc(&mut target.state, rpc_id, payload);
    }

    /// Decodes one inbound frame and applies it.
    pub fn receive_frame(&mut self, bytes: &[u8]) -> ReplicationResult<()> {
        let frame = match decode_frame(bytes, &self.config.limits) {
            Ok(frame) => frame,
            Err(err) => {
                self.stats.malformed_frames += 1;
                warn!("malformed frame of {} bytes: {err}", bytes.len());
                return Err(err.into());
            }
        };

        let id = frame.entity();
        let Some(target) = self.entities.get_mut(&id) else {
            self.stats.unknown_entities += 1;
            warn!("frame for unknown entity {id}, ignoring");
            return Err(ReplicationError::UnknownEntity { entity: id });
        };

        let found = frame.header().layout_hash;
        if self.config.verify_layout_hash && found != target.net.layout_hash() {
            self.stats.layout_mismatches += 1;
            warn!(
                "layout mismatch for {id}: local {:#018x}, remote {found:#018x}",
                target.net.layout_hash()
            );
            return Err(ReplicationError::LayoutMismatch {
                expected: target.net.layout_hash(),
                found,
            });
        }

        match frame {
            Frame::Rpc(RpcFrame {
                rpc_id,
                rpc_type,
                payload,
                ..
            }) => {
                let expected = target.net.layout().binding(rpc_id).map(|b| b.rpc_type());
                if let Some(expected) = expected.filter(|expected| *expected != rpc_type) {
                    self.stats.rpc_type_mismatches += 1;
                    warn!("rpc {rpc_id} for {id} is {expected}, frame says {rpc_type}");
                    return Err(ReplicationError::RpcTypeMismatch {
                        entity: id,
                        rpc_id,
                        expected,
                        found: rpc_type,
                    });
                }
                target.net.receive_rpc(&mut target.state, rpc_id, payload);
            }
            Frame::State(StateFrame { tick, state, .. }) => {
                if target.net.role() == NetRole::Authority {
                    self.stats.unexpected_state += 1;
                    warn!("state for {id} at tick {tick} ignored, local peer is authority");
                    return Err(ReplicationError::UnexpectedState { entity: id });
                }
                target.net.apply_state(&mut target.state, state)?;
            }
        }
        self.stats.frames_applied += 1;
        Ok(())
    }

    /// Applies buffered inbound frames in arrival order.
    ///
    /// At most `max_inbound_per_drain` frames are taken; the rest stay
    /// buffered for the next call. Rejected frames are logged and skipped.
    pub fn drain<S: FrameSource + ?Sized>(&mut self, source: &mut S) -> DrainReport {
        let mut report = DrainReport::default();
        while report.total() < self.config.max_inbound_per_drain {
            let Some(bytes) = source.poll_frame() else {
                break;
            };
            match self.receive_frame(&bytes) {
                Ok(()) => report.applied += 1,
                Err(err) => {
                    debug!("frame rejected: {err}");
                    report.rejected += 1;
                }
            }
        }
        report
    }

    /// Sends a state frame for every entity this peer is authority for.
    ///
    /// An entity whose state cannot be serialized or framed is logged,
    /// counted in its [`NetStats`], and skipped. Returns the number of
    /// frames sent.
    pub fn publish_state<S: FrameSink + ?Sized>(&mut self, tick: u32, sink: &mut S) -> usize {
        let mut sent = 0;
        for entity in self.entities.values_mut() {
            if entity.net.role() != NetRole::Authority {
                continue;
            }
            match Self::state_frame(entity, tick, &self.config) {
                Ok(frame) => {
                    sink.send_frame(frame);
                    sent += 1;
                }
                Err(err) => {
                    entity.net.stats_mut().state_encode_failures += 1;
                    warn!("state for {} at tick {tick} not published: {err}", entity.id);
                }
            }
        }
        sent
    }

    fn state_frame(
        entity: &NetEntity<E>,
        tick: u32,
        config: &ReplicationConfig,
    ) -> ReplicationResult<Vec<u8>> {
        let state = entity.net.snapshot(&entity.state)?;
        let frame = encode_state_frame(
            &StateFrame {
                layout_hash: entity.net.layout_hash(),
                entity: entity.id,
                tick,
                state: &state,
            },
            &config.limits,
        )?;
        Ok(frame)
    }
}
