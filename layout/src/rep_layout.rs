//! Replication layout composition and binding.

use std::ops::{Add, AddAssign};

use bitstream::{BitReader, BitResult, BitWriter};
use log::trace;
use wire::{NetId, RpcId};

use crate::error::{LayoutError, LayoutResult};
use crate::manifest::{LayoutManifest, PropertyEntry, RpcEntry};
use crate::property::PropertyReplicator;
use crate::rpc::RpcBinding;

/// Maximum number of RPC bindings one layout can hold.
pub const MAX_RPCS: usize = u16::MAX as usize + 1;

fn positional_ids() -> impl Iterator<Item = RpcId> {
    std::iter::successors(Some(RpcId::FIRST), |id| id.next())
}

/// Ordered description of what an entity replicates.
///
/// Properties are serialized in declaration order. RPC ids are positional:
/// the n-th declared binding gets id `n`, starting at 0 with no gaps.
/// Composing `a + b` appends `b`'s properties after `a`'s and renumbers
/// `b`'s bindings to continue after `a`'s last id. Every peer sharing an
/// entity type must compose its layout in the same order.
pub struct RepLayout<E> {
    properties: Vec<Box<dyn PropertyReplicator<E>>>,
    rpcs: Vec<Box<dyn RpcBinding<E>>>,
}

impl<E> Default for RepLayout<E> {
    fn default() -> Self {
        Self {
            properties: Vec::new(),
            rpcs: Vec::new(),
        }
    }
}

impl<E> RepLayout<E> {
    /// Creates an empty layout.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a property.
    #[must_use]
    pub fn property<P: PropertyReplicator<E> + 'static>(mut self, property: P) -> Self {
        self.properties.push(Box::new(property));
        self
    }

    /// Appends an RPC binding; it receives the next free id.
    #[must_use]
    pub fn rpc<R: RpcBinding<E> + 'static>(mut self, binding: R) -> Self {
        self.rpcs.push(Box::new(binding));
        self
    }

    /// Appends `other` to this layout.
    #[must_use]
    pub fn compose(mut self, other: Self) -> Self {
        self.extend(other);
        self
    }

    fn extend(&mut self, other: Self) {
        self.properties.extend(other.properties);
        self.rpcs.extend(other.rpcs);
    }

    /// Number of properties.
    #[must_use]
    pub fn property_count(&self) -> usize {
        self.properties.len()
    }

    /// Number of RPC bindings.
    #[must_use]
    pub fn rpc_count(&self) -> usize {
        self.rpcs.len()
    }

    /// Returns `true` if the layout has neither properties nor RPCs.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty() && self.rpcs.is_empty()
    }

    /// Checks that every binding has an addressable id.
    pub fn validate(&self) -> LayoutResult<()> {
        if self.rpcs.len() > MAX_RPCS {
            return Err(LayoutError::TooManyRpcs {
                count: self.rpcs.len(),
                max: MAX_RPCS,
            });
        }
        Ok(())
    }

    /// Looks up the binding for an RPC id.
    #[must_use]
    pub fn binding(&self, id: RpcId) -> Option<&dyn RpcBinding<E>> {
        self.rpcs.get(usize::from(id.raw())).map(|binding| binding.as_ref())
    }

    /// Returns the id of the first binding with the given name.
    #[must_use]
    pub fn rpc_id(&self, name: &str) -> Option<RpcId> {
        self.rpc_ids()
            .zip(&self.rpcs)
            .find(|(_, binding)| binding.name() == name)
            .map(|(id, _)| id)
    }

    /// Iterates over the ids of all addressable bindings in order.
    pub fn rpc_ids(&self) -> impl Iterator<Item = RpcId> + '_ {
        positional_ids().take(self.rpcs.len())
    }

    /// Binds the layout to an entity.
    ///
    /// Calls `on_bind` on every property, then on every RPC binding, in
    /// layout order. Binding the same layout twice double-registers its
    /// bindings; callers bind once per entity.
    pub fn bind(&mut self, entity: &mut E, net_id: NetId) -> LayoutResult<()> {
        self.validate()?;
        for property in &mut self.properties {
            trace!("bind property {} to {net_id}", property.name());
            property.on_bind(net_id);
        }
        for (rpc_id, binding) in positional_ids().zip(self.rpcs.iter_mut()) {
            trace!(
                "bind {} rpc {} as id {rpc_id} to {net_id}",
                binding.rpc_type(),
                binding.name()
            );
            binding.on_bind(entity, net_id, rpc_id);
        }
        Ok(())
    }

    /// Writes every property in layout order.
    ///
    /// On failure `out` is rewound to where it was before the call.
    pub fn serialize(&self, entity: &E, out: &mut BitWriter) -> BitResult<()> {
        let mark = out.mark();
        for property in &self.properties {
            if let Err(err) = property.serialize(entity, out) {
                out.rewind(mark);
                return Err(err);
            }
        }
        Ok(())
    }

    /// Reads every property in layout order and applies it.
    ///
    /// Stops at the first failure; properties before it have already been
    /// applied. Use [`validate_stream`](Self::validate_stream) first to
    /// avoid partial updates.
    pub fn deserialize(&self, entity: &mut E, input: &mut BitReader<'_>) -> BitResult<()> {
        for property in &self.properties {
            property.deserialize(entity, input)?;
        }
        Ok(())
    }

    /// Reads every property in layout order without applying anything.
    pub fn validate_stream(&self, input: &mut BitReader<'_>) -> BitResult<()> {
        for property in &self.properties {
            property.skip(input)?;
        }
        Ok(())
    }

    /// Describes the layout's wire shape.
    pub fn manifest(&self) -> LayoutResult<LayoutManifest> {
        self.validate()?;
        let properties = self
            .properties
            .iter()
            .map(|property| PropertyEntry {
                name: property.name().to_owned(),
                kind: property.kind(),
            })
            .collect();
        let rpcs = self
            .rpc_ids()
            .zip(&self.rpcs)
            .map(|(id, binding)| RpcEntry {
                id: id.raw(),
                name: binding.name().to_owned(),
                rpc_type: binding.rpc_type().as_str().to_owned(),
            })
            .collect();
        Ok(LayoutManifest { properties, rpcs })
    }
}

impl<E> Add for RepLayout<E> {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        self.compose(other)
    }
}

impl<E> AddAssign for RepLayout<E> {
    fn add_assign(&mut self, other: Self) {
        self.extend(other);
    }
}

impl<E> std::fmt::Debug for RepLayout<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let properties: Vec<&str> = self.properties.iter().map(|p| p.name()).collect();
        let rpcs: Vec<&str> = self.rpcs.iter().map(|r| r.name()).collect();
        f.debug_struct("RepLayout")
            .field("properties", &properties)
            .field("rpcs", &rpcs)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::property::Property;
    use crate::replicated::ValueKind;
    use wire::RpcType;

    #[derive(Default)]
    struct Crate {
        weight: u32,
        open: bool,
        bound: Vec<(String, RpcId)>,
        hits: u32,
        label: String,
    }

    struct Mark(&'static str, RpcType);

    impl RpcBinding<Crate> for Mark {
        fn name(&self) -> &str {
            self.0
        }

        fn rpc_type(&self) -> RpcType {
            self.1
        }

        fn on_bind(&mut self, entity: &mut Crate, _net_id: NetId, rpc_id: RpcId) {
            entity.bound.push((self.0.to_owned(), rpc_id));
        }

        fn invoke(&self, entity: &mut Crate, _payload: &[u8]) -> LayoutResult<()> {
            entity.hits += 1;
            Ok(())
        }
    }

    fn weight() -> Property<Crate, u32> {
        Property::new("weight", |c| &c.weight, |c| &mut c.weight)
    }

    fn open() -> Property<Crate, bool> {
        Property::new("open", |c| &c.open, |c| &mut c.open)
    }

    #[test]
    fn bind_assigns_positional_ids() {
        let mut layout = RepLayout::new()
            .rpc(Mark("a", RpcType::Server))
            .rpc(Mark("b", RpcType::Client));
        let mut state = Crate::default();
        layout.bind(&mut state, NetId::new(1)).unwrap();
        assert_eq!(
            state.bound,
            vec![("a".to_owned(), RpcId::new(0)), ("b".to_owned(), RpcId::new(1))]
        );
    }

    #[test]
    fn add_assign_matches_compose() {
        let mut layout = RepLayout::new().property(weight()).rpc(Mark("a", RpcType::Server));
        layout += RepLayout::new().property(open()).rpc(Mark("b", RpcType::Server));
        assert_eq!(layout.property_count(), 2);
        assert_eq!(layout.rpc_id("b"), Some(RpcId::new(1)));
    }

    #[test]
    fn serialize_follows_property_order() {
        let layout = RepLayout::new().property(open()).property(weight());
        let state = Crate {
            weight: 0x0102_0304,
            open: true,
            ..Crate::default()
        };
        let mut out = BitWriter::new();
        layout.serialize(&state, &mut out).unwrap();
        assert_eq!(out.bits_written(), 33);

        let bytes = out.finish();
        let mut copy = Crate::default();
        layout
            .deserialize(&mut copy, &mut BitReader::new(&bytes))
            .unwrap();
        assert!(copy.open);
        assert_eq!(copy.weight, 0x0102_0304);
    }

    #[test]
    fn failed_serialize_rewinds_output() {
        let layout = RepLayout::new()
            .property(open())
            .property(weight())
            .property(Property::new("label", |c: &Crate| &c.label, |c| &mut c.label));
        let state = Crate {
            label: "x".repeat(crate::MAX_STRING_BYTES + 1),
            ..Crate::default()
        };
        let mut out = BitWriter::new();
        out.write_bits(0b11, 2).unwrap();

        assert!(layout.serialize(&state, &mut out).is_err());
        assert_eq!(out.bits_written(), 2);
        assert_eq!(out.byte_len(), 1);
        assert_eq!(out.finish(), vec![0b1100_0000]);
    }

    #[test]
    fn rpc_ids_count_up_from_first() {
        let layout = RepLayout::new()
            .rpc(Mark("a", RpcType::Server))
            .rpc(Mark("b", RpcType::Client))
            .rpc(Mark("c", RpcType::Server));
        let ids: Vec<_> = layout.rpc_ids().collect();
        assert_eq!(ids, vec![RpcId::FIRST, RpcId::new(1), RpcId::new(2)]);
        assert_eq!(layout.rpc_id("c"), Some(RpcId::new(2)));
    }

    #[test]
    fn validate_stream_rejects_short_input() {
        let layout = RepLayout::new().property(weight()).property(open());
        let mut input = BitReader::new(&[0, 0, 0]);
        assert!(layout.validate_stream(&mut input).is_err());
    }

    #[test]
    fn binding_lookup_is_bounded() {
        let layout = RepLayout::new().rpc(Mark("a", RpcType::Server));
        assert!(layout.binding(RpcId::new(0)).is_some());
        assert!(layout.binding(RpcId::new(1)).is_none());
        assert!(layout.binding(RpcId::new(999)).is_none());
    }

    #[test]
    fn manifest_lists_wire_shape() {
        let layout = RepLayout::new()
            .property(weight())
            .rpc(Mark("a", RpcType::Client));
        let manifest = layout.manifest().unwrap();
        assert_eq!(manifest.properties[0].name, "weight");
        assert_eq!(manifest.properties[0].kind, ValueKind::UInt { bits: 32 });
        assert_eq!(manifest.rpcs[0].id, 0);
        assert_eq!(manifest.rpcs[0].rpc_type, "client");
    }

    #[test]
    fn debug_lists_names() {
        let layout = RepLayout::new().property(weight()).rpc(Mark("a", RpcType::Server));
        let debug = format!("{layout:?}");
        assert!(debug.contains("weight"));
        assert!(debug.contains('a'));
    }
}
