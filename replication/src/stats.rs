//! Replication counters.
//!
//! Every non-fatal event that is logged as a warning is also counted here,
//! so callers and tests can observe it without a capturing logger.

/// Counters kept by one entity's [`NetData`](crate::NetData).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct NetStats {
    /// RPCs executed in-process instead of being sent.
    pub rpcs_local: u64,
    /// RPCs handed to the transport.
    pub rpcs_remote: u64,
    /// RPCs dispatched to a binding, local or remote.
    pub rpcs_received: u64,
    /// Received RPC ids with no binding.
    pub unknown_rpcs: u64,
    /// Client RPCs dropped because the local role may not send them.
    pub role_rejections: u64,
    /// RPC payloads that could not be encoded.
    pub rpc_encode_failures: u64,
    /// RPC payloads that did not decode into the binding's arguments.
    pub rpc_decode_failures: u64,
    /// State payloads rejected before being applied.
    pub state_decode_failures: u64,
    /// Authority snapshots that could not be serialized or framed.
    pub state_encode_failures: u64,
    /// Sends through a sender bound to a different entity.
    pub stale_senders: u64,
}

impl NetStats {
    /// Adds another set of counters to this one.
    pub fn merge(&mut self, other: &Self) {
        self.rpcs_local += other.rpcs_local;
        self.rpcs_remote += other.rpcs_remote;
        self.rpcs_received += other.rpcs_received;
        self.unknown_rpcs += other.unknown_rpcs;
        self.role_rejections += other.role_rejections;
        self.rpc_encode_failures += other.rpc_encode_failures;
        self.rpc_decode_failures += other.rpc_decode_failures;
        self.state_decode_failures += other.state_decode_failures;
        self.state_encode_failures += other.state_encode_failures;
        self.stale_senders += other.stale_senders;
    }

    /// Total number of warning-level events.
    #[must_use]
    pub const fn warnings(&self) -> u64 {
        self.unknown_rpcs
            + self.role_rejections
            + self.rpc_encode_failures
            + self.rpc_decode_failures
            + self.state_decode_failures
            + self.state_encode_failures
            + self.stale_senders
    }
}

/// Counters kept by a [`NetRegistry`](crate::NetRegistry) for inbound traffic.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RegistryStats {
    /// Frames accepted and dispatched.
    pub frames_applied: u64,
    /// Frames that failed to decode.
    pub malformed_frames: u64,
    /// Frames or RPCs addressed to an entity this peer does not know.
    pub unknown_entities: u64,
    /// Frames whose layout hash did not match the local layout.
    pub layout_mismatches: u64,
    /// RPC frames whose type disagreed with the local binding.
    pub rpc_type_mismatches: u64,
    /// State frames addressed to an entity this peer is authority for.
    pub unexpected_state: u64,
}
