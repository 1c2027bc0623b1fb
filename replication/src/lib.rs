//! Per-entity replication and RPC dispatch for netrep.
//!
//! This crate attaches a [`RepLayout`](layout::RepLayout) to an entity and
//! decides, per call, whether an RPC runs in-process or goes through the
//! transport:
//! - [`NetRole`] and the short-circuit rule
//! - [`NetData`], the per-entity role holder, state codec, and dispatcher
//! - [`RpcSender`] and the typed [`Rpc`] binding that stamps it
//! - the [`RpcTransport`] contract, with [`LoopbackTransport`] and
//!   [`ChannelTransport`]
//! - [`NetRegistry`], which owns entities and drains inbound frames
//!
//! # Design Principles
//!
//! - **Single-threaded core** - Everything runs on the simulation thread;
//!   transports buffer inbound traffic until it is drained.
//! - **Explicit context** - The authority flag comes from the transport
//!   passed to each call, never from global state.
//! - **Non-fatal desync** - Unknown RPCs, role misuse, and malformed
//!   payloads are logged, counted, and dropped.
//!
//! # Example
//!
//! ```
//! use layout::{Property, RepLayout};
//! use replication::{LoopbackTransport, NetRegistry, NetRole, Rpc, RpcSender};
//! use wire::NetId;
//!
//! #[derive(Default)]
//! struct Door { open: bool, toggle: RpcSender }
//!
//! let layout = RepLayout::new()
//!     .property(Property::new("open", |d: &Door| &d.open, |d: &mut Door| &mut d.open))
//!     .rpc(Rpc::server("toggle", |d: &mut Door| &mut d.toggle, |d: &mut Door, (): ()| d.open = !d.open));
//!
//! let mut registry = NetRegistry::default();
//! let id = NetId::new(1);
//! registry.spawn(id, Door::default(), layout, NetRole::Authority, NetRole::SimulatedProxy).unwrap();
//!
//! let mut transport = LoopbackTransport::authority();
//! registry.send_server(id, |d| d.toggle, &mut transport, &()).unwrap();
//! assert!(registry.get(id).unwrap().state.open);
//! assert!(transport.sent().is_empty());
//! ```

mod config;
mod error;
mod net_data;
mod registry;
mod role;
mod rpc;
mod sender;
mod stats;
mod transport;

pub use config::ReplicationConfig;
pub use error::{ReplicationError, ReplicationResult};
pub use net_data::NetData;
pub use registry::{DrainReport, NetEntity, NetRegistry};
pub use role::NetRole;
pub use rpc::Rpc;
pub use sender::RpcSender;
pub use stats::{NetStats, RegistryStats};
pub use transport::{
    ChannelTransport, FrameSink, FrameSource, LoopbackTransport, RpcMessage, RpcTransport,
};
