//! Deterministic follower sharding.
//!
//! Every bot process walks the same follower enumeration from the start and
//! keeps only the positions that belong to its shard. Shards never overlap
//! and together cover every position, as long as the provider returns
//! followers in the same order to every process.

use std::fmt;

/// Error type for invalid shard settings.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ShardError {
    /// A shard total of zero cannot hold any follower.
    #[error("Shard total must be at least 1")]
    ZeroTotal,
    /// The shard index does not fall inside `0..total`.
    #[error("Shard index {index} out of range for {total} shard(s)")]
    IndexOutOfRange {
        /// The configured shard index.
        index: u32,
        /// The configured shard total.
        total: u32,
    },
}

/// The shard position of one bot instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShardSpec {
    total: u32,
    index: u32,
}

impl ShardSpec {
    /// Create a shard position, validating `total >= 1` and `index < total`.
    pub fn new(total: u32, index: u32) -> Result<Self, ShardError> {
        if total == 0 {
            return Err(ShardError::ZeroTotal);
        }
        if index >= total {
            return Err(ShardError::IndexOutOfRange { index, total });
        }
        Ok(Self { total, index })
    }

    /// A single shard that owns every follower.
    pub fn single() -> Self {
        Self { total: 1, index: 0 }
    }

    /// Total number of shards.
    #[must_use]
    pub fn total(&self) -> u32 {
        self.total
    }

    /// This instance's shard index.
    #[must_use]
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Whether the follower at enumeration position `idx` belongs to this shard.
    #[must_use]
    pub fn owns(&self, idx: usize) -> bool {
        self.total == 1 || assign(idx, self.total) == self.index
    }

    /// Number of followers to enumerate per run so that each shard still
    /// sees roughly `max_per_run` of its own followers.
    #[must_use]
    pub fn fetch_budget(&self, max_per_run: u32) -> usize {
        (max_per_run as usize).saturating_mul(self.total as usize)
    }
}

impl Default for ShardSpec {
    fn default() -> Self {
        Self::single()
    }
}

impl fmt::Display for ShardSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.index, self.total)
    }
}

/// Shard that owns enumeration position `idx` under `total` shards.
///
/// `total` must be non-zero.
#[must_use]
pub fn assign(idx: usize, total: u32) -> u32 {
    (idx % total as usize) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    #[test]
    fn test_new_rejects_zero_total() {
        assert_eq!(ShardSpec::new(0, 0), Err(ShardError::ZeroTotal));
    }

    #[test]
    fn test_new_rejects_index_out_of_range() {
        assert_eq!(
            ShardSpec::new(3, 3),
            Err(ShardError::IndexOutOfRange { index: 3, total: 3 })
        );
    }

    #[test]
    fn test_single_shard_owns_everything() {
        let shard = ShardSpec::single();
        assert!((0..1000).all(|idx| shard.owns(idx)));
    }

    #[test]
    fn test_owns_uses_modulo() {
        let shard = ShardSpec::new(3, 1).unwrap();
        let owned: Vec<usize> = (0..10).filter(|&idx| shard.owns(idx)).collect();
        assert_eq!(owned, vec![1, 4, 7]);
    }

    #[test]
    fn test_shards_partition_positions() {
        let total = 5;
        let positions = 0..237usize;
        let mut union = BTreeSet::new();

        for index in 0..total {
            let shard = ShardSpec::new(total, index).unwrap();
            for idx in positions.clone().filter(|&idx| shard.owns(idx)) {
                // No position may be claimed twice.
                assert!(union.insert(idx), "position {idx} claimed twice");
            }
        }

        assert_eq!(union, positions.collect::<BTreeSet<_>>());
    }

    #[test]
    fn test_assign_is_deterministic() {
        for idx in 0..50 {
            assert_eq!(assign(idx, 4), assign(idx, 4));
            assert!(assign(idx, 4) < 4);
        }
    }

    #[test]
    fn test_fetch_budget_scales_with_total() {
        assert_eq!(ShardSpec::single().fetch_budget(50), 50);
        assert_eq!(ShardSpec::new(5, 2).unwrap().fetch_budget(50), 250);
    }

    #[test]
    fn test_display() {
        assert_eq!(ShardSpec::new(5, 2).unwrap().to_string(), "2/5");
    }
}
