//! Network roles.

use wire::RpcType;

/// Role a peer holds for one entity.
///
/// Each peer keeps its own role for an entity plus its best guess of the
/// remote peer's role. Roles are assigned by session logic outside this
/// crate whenever ownership changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum NetRole {
    /// Not networked.
    #[default]
    None,
    /// This peer owns ground truth for the entity.
    Authority,
    /// This peer is the owning client; it may predict but does not own ground truth.
    AuthoritativeProxy,
    /// A read-only mirror driven by the remote peer.
    SimulatedProxy,
}

impl NetRole {
    /// Returns `true` for every role except [`NetRole::None`].
    #[must_use]
    pub const fn is_networked(self) -> bool {
        !matches!(self, Self::None)
    }

    /// Returns `true` if an RPC of `rpc_type` can run in-process, because
    /// this role is already the one that would receive it remotely.
    #[must_use]
    pub const fn short_circuits(self, rpc_type: RpcType) -> bool {
        matches!(
            (rpc_type, self),
            (RpcType::Server, Self::Authority) | (RpcType::Client, Self::AuthoritativeProxy)
        )
    }

    /// Returns a stable lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Authority => "authority",
            Self::AuthoritativeProxy => "authoritative_proxy",
            Self::SimulatedProxy => "simulated_proxy",
        }
    }
}

impl std::fmt::Display for NetRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_not_networked() {
        assert_eq!(NetRole::default(), NetRole::None);
        assert!(!NetRole::None.is_networked());
        assert!(NetRole::SimulatedProxy.is_networked());
    }

    #[test]
    fn short_circuit_table() {
        let cases = [
            (NetRole::None, false, false),
            (NetRole::Authority, true, false),
            (NetRole::AuthoritativeProxy, false, true),
            (NetRole::SimulatedProxy, false, false),
        ];
        for (role, server, client) in cases {
            assert_eq!(role.short_circuits(RpcType::Server), server, "{role} server");
            assert_eq!(role.short_circuits(RpcType::Client), client, "{role} client");
        }
    }
}
