//! Identifier types shared by every peer.

use crate::error::DecodeError;

/// Network identifier of an entity.
///
/// Assigned by the session when an entity is spawned and stable across every
/// peer that knows the entity. This is distinct from any process-local
/// entity handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct NetId(u32);

impl NetId {
    /// Creates a new network id.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the raw id value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl From<u32> for NetId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl From<NetId> for u32 {
    fn from(id: NetId) -> Self {
        id.0
    }
}

/// Identifier of an RPC slot within a replication layout.
///
/// Ids are assigned positionally when layouts are composed, starting at 0.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct RpcId(u16);

impl RpcId {
    /// The first id handed out by an empty layout.
    pub const FIRST: Self = Self(0);

    /// Creates a new RPC id.
    #[must_use]
    pub const fn new(id: u16) -> Self {
        Self(id)
    }

    /// Returns the raw id value.
    #[must_use]
    pub const fn raw(self) -> u16 {
        self.0
    }

    /// Returns the id following this one, or `None` on overflow.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        match self.0.checked_add(1) {
            Some(raw) => Some(Self(raw)),
            None => None,
        }
    }
}

impl From<u16> for RpcId {
    fn from(id: u16) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for RpcId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::fmt::Display for NetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Direction of an RPC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum RpcType {
    /// Issued by a peer-owned entity, executed on the authority.
    Server = 1,
    /// Issued by the authority, executed on the owning peer.
    Client = 2,
}

impl RpcType {
    /// Parses an RPC type from its wire byte.
    pub fn parse(raw: u8) -> Result<Self, DecodeError> {
        match raw {
            1 => Ok(Self::Server),
            2 => Ok(Self::Client),
            _ => Err(DecodeError::UnknownRpcType { raw }),
        }
    }

    /// Returns a short lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Server => "server",
            Self::Client => "client",
        }
    }
}

impl std::fmt::Display for RpcType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
