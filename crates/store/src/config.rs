//! Key-value backend configuration
//!
//! An explicit immutable configuration value, merged functionally at
//! construction time. There is no shared mutable default to update in
//! place; `with_*` methods return a new value.

/// Configuration for the in-memory key-value store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KvConfig {
    /// Number of pending merge operands on a single key that triggers an
    /// in-place fold on the next merge
    pub merge_compaction_threshold: usize,
}

impl Default for KvConfig {
    fn default() -> Self {
        KvConfig {
            merge_compaction_threshold: 8,
        }
    }
}

impl KvConfig {
    /// Override the per-key pending-merge threshold.
    pub fn with_merge_compaction_threshold(self, threshold: usize) -> Self {
        KvConfig {
            merge_compaction_threshold: threshold.max(1),
        }
    }
}
