//! Configurable limits for bounded decoding.

/// Wire-level limits for frame encoding and decoding.
///
/// These limits are enforced on both sides so a peer never allocates or
/// scans more than it agreed to. Property-set sizes are bounded by the same
/// payload limit as RPC arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Limits {
    /// Maximum encoded frame size in bytes.
    pub max_frame_bytes: usize,

    /// Maximum RPC payload or state body size in bytes.
    pub max_payload_bytes: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            // Fits comfortably in a single reliable message on most transports
            max_frame_bytes: 64 * 1024,
            max_payload_bytes: 32 * 1024,
        }
    }
}

impl Limits {
    /// Creates limits suitable for testing with smaller values.
    #[must_use]
    pub const fn for_testing() -> Self {
        Self {
            max_frame_bytes: 4096,
            max_payload_bytes: 1024,
        }
    }

    /// Creates limits with no restrictions (use with caution).
    #[must_use]
    pub const fn unlimited() -> Self {
        Self {
            max_frame_bytes: usize::MAX,
            max_payload_bytes: usize::MAX,
        }
    }
}
