//! Property replicators.

use bitstream::{BitReader, BitResult, BitWriter};
use wire::NetId;

use crate::replicated::{Replicated, ValueKind};

/// A single replicated field of an entity of type `E`.
///
/// A replicator does not own the entity. It reads and writes one field that
/// the entity exposes, and is called in layout order by the owning
/// [`RepLayout`](crate::RepLayout).
pub trait PropertyReplicator<E> {
    /// Name used in manifests and diagnostics.
    fn name(&self) -> &str;

    /// Shape of the encoded value.
    fn kind(&self) -> ValueKind;

    /// Writes the current value of the field.
    fn serialize(&self, entity: &E, out: &mut BitWriter) -> BitResult<()>;

    /// Reads a value and stores it in the field.
    fn deserialize(&self, entity: &mut E, input: &mut BitReader<'_>) -> BitResult<()>;

    /// Reads a value without storing it.
    fn skip(&self, input: &mut BitReader<'_>) -> BitResult<()>;

    /// Called once when the owning layout is bound to an entity.
    fn on_bind(&mut self, entity: NetId);
}

/// Property replicator over a field reached through plain accessor functions.
///
/// ```
/// use layout::Property;
///
/// struct Ship { health: u16 }
///
/// let health = Property::new("health", |s: &Ship| &s.health, |s: &mut Ship| &mut s.health);
/// assert_eq!(health.bound_entity(), None);
/// ```
pub struct Property<E, T> {
    name: &'static str,
    get: fn(&E) -> &T,
    get_mut: fn(&mut E) -> &mut T,
    entity: Option<NetId>,
}

impl<E, T> Property<E, T> {
    /// Creates a property from its name and field accessors.
    #[must_use]
    pub const fn new(name: &'static str, get: fn(&E) -> &T, get_mut: fn(&mut E) -> &mut T) -> Self {
        Self {
            name,
            get,
            get_mut,
            entity: None,
        }
    }

    /// Returns the entity this property was bound to, if any.
    #[must_use]
    pub const fn bound_entity(&self) -> Option<NetId> {
        self.entity
    }
}

impl<E, T> std::fmt::Debug for Property<E, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Property")
            .field("name", &self.name)
            .field("entity", &self.entity)
            .finish_non_exhaustive()
    }
}

impl<E, T: Replicated> PropertyReplicator<E> for Property<E, T> {
    fn name(&self) -> &str {
        self.name
    }

    fn kind(&self) -> ValueKind {
        T::kind()
    }

    fn serialize(&self, entity: &E, out: &mut BitWriter) -> BitResult<()> {
        (self.get)(entity).write(out)
    }

    fn deserialize(&self, entity: &mut E, input: &mut BitReader<'_>) -> BitResult<()> {
        *(self.get_mut)(entity) = T::read(input)?;
        Ok(())
    }

    fn skip(&self, input: &mut BitReader<'_>) -> BitResult<()> {
        T::read(input).map(drop)
    }

    fn on_bind(&mut self, entity: NetId) {
        self.entity = Some(entity);
    }
}
