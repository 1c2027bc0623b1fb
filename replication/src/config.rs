//! Replication configuration.

use wire::Limits;

/// Settings for inbound traffic handled by a [`NetRegistry`](crate::NetRegistry).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplicationConfig {
    /// Frame and payload bounds applied when decoding.
    pub limits: Limits,
    /// Maximum number of frames applied by one drain; the rest wait for the next tick.
    pub max_inbound_per_drain: usize,
    /// Reject frames whose layout hash differs from the local layout.
    pub verify_layout_hash: bool,
}

impl Default for ReplicationConfig {
    fn default() -> Self {
        Self {
            limits: Limits::default(),
            max_inbound_per_drain: 1024,
            verify_layout_hash: true,
        }
    }
}

impl ReplicationConfig {
    /// Creates a configuration suitable for testing with smaller values.
    #[must_use]
    pub const fn for_testing() -> Self {
        Self {
            limits: Limits::for_testing(),
            max_inbound_per_drain: 64,
            verify_layout_hash: true,
        }
    }

    /// Creates a configuration with no limits (use with caution).
    #[must_use]
    pub const fn unlimited() -> Self {
        Self {
            limits: Limits::unlimited(),
            max_inbound_per_drain: usize::MAX,
            verify_layout_hash: true,
        }
    }
}
