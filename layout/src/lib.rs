//! Replication layouts for netrep.
//!
//! This crate defines what an entity replicates:
//! - [`Replicated`] value codecs for property and RPC argument types
//! - [`PropertyReplicator`] and the accessor-based [`Property`]
//! - the [`RpcBinding`] capability
//! - [`RepLayout`], the ordered, composable set of both
//! - manifests and a deterministic [`layout_hash`]
//!
//! # Design Principles
//!
//! - **Positional ids** - RPC ids follow composition order, so identical
//!   composition on every peer yields identical ids.
//! - **No reflection** - Properties are declared with explicit accessors.
//! - **Deterministic hashing** - The layout hash is stable given the same composition.
//!
//! # Example
//!
//! ```
//! use layout::{layout_hash, Property, RepLayout};
//!
//! #[derive(Default)]
//! struct Door { open: bool, code: u16 }
//!
//! let movement = RepLayout::new().property(Property::new("open", |d: &Door| &d.open, |d: &mut Door| &mut d.open));
//! let lock = RepLayout::new().property(Property::new("code", |d: &Door| &d.code, |d: &mut Door| &mut d.code));
//! let layout = movement + lock;
//!
//! let manifest = layout.manifest().unwrap();
//! assert_eq!(manifest.properties[1].name, "code");
//! assert_ne!(layout_hash(&manifest), 0);
//! ```

mod error;
mod hash;
mod manifest;
mod property;
mod rep_layout;
mod replicated;
mod rpc;

pub use error::{LayoutError, LayoutResult};
pub use hash::layout_hash;
pub use manifest::{LayoutManifest, PropertyEntry, RpcEntry};
pub use property::{Property, PropertyReplicator};
pub use rep_layout::{RepLayout, MAX_RPCS};
pub use replicated::{
    decode_value, encode_value, Replicated, ValueKind, MAX_LIST_LEN, MAX_STRING_BYTES,
};
pub use rpc::RpcBinding;
