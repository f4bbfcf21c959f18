//! Deterministic roster sharding
//!
//! Splits the full ordered domain list into contiguous slices, one per
//! worker invocation. The same `(shard_count, roster)` pair always yields
//! the same cover: non-overlapping, nothing dropped, with the final shard
//! absorbing the division remainder.

use crate::config::ShardConfig;

/// One shard's slot and the absolute roster range it owns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Shard {
    /// 0-based shard slot
    pub index: usize,
    /// Total number of shards in the run
    pub count: usize,
    /// First owned roster index
    pub start: usize,
    /// One past the last owned roster index
    pub end: usize,
}

impl Shard {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }
}

/// Computes the roster range shard `config.index` owns
///
/// `size = total / count`; shard `i` owns `[i*size, (i+1)*size)`, except the
/// last shard, which runs to the end of the roster.
pub fn shard_bounds(total: usize, config: ShardConfig) -> Shard {
    let size = total / config.count;
    let start = config.index * size;
    let end = if config.index == config.count - 1 {
        total
    } else {
        start + size
    };

    Shard {
        index: config.index,
        count: config.count,
        start,
        end,
    }
}

/// Slices the roster down to the sub-list this shard owns
pub fn partition<T>(domains: &[T], config: ShardConfig) -> &[T] {
    let shard = shard_bounds(domains.len(), config);
    &domains[shard.start..shard.end]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shard(index: usize, count: usize) -> ShardConfig {
        ShardConfig { index, count }
    }

    #[test]
    fn test_single_shard_owns_everything() {
        let bounds = shard_bounds(10, shard(0, 1));
        assert_eq!((bounds.start, bounds.end), (0, 10));
        assert_eq!(bounds.len(), 10);
    }

    #[test]
    fn test_even_split() {
        assert_eq!(shard_bounds(10, shard(0, 2)).start, 0);
        assert_eq!(shard_bounds(10, shard(0, 2)).end, 5);
        assert_eq!(shard_bounds(10, shard(1, 2)).start, 5);
        assert_eq!(shard_bounds(10, shard(1, 2)).end, 10);
    }

    #[test]
    fn test_last_shard_absorbs_remainder() {
        // 11 over 3 shards: sizes 3, 3, 5
        assert_eq!(shard_bounds(11, shard(0, 3)).len(), 3);
        assert_eq!(shard_bounds(11, shard(1, 3)).len(), 3);
        let last = shard_bounds(11, shard(2, 3));
        assert_eq!((last.start, last.end), (6, 11));
        assert_eq!(last.len(), 5);
    }

    #[test]
    fn test_partition_returns_owned_slice() {
        let domains: Vec<String> = (0..7).map(|i| format!("store{}.com", i)).collect();
        assert_eq!(
            partition(&domains, shard(1, 3)),
            &["store2.com".to_string(), "store3.com".to_string()]
        );
    }

    #[test]
    fn test_cover_is_total_and_disjoint() {
        for total in [0usize, 1, 5, 17, 100] {
            for count in [1usize, 2, 3, 7, 10] {
                let mut covered = Vec::new();
                let mut previous_end = 0;
                for index in 0..count {
                    let bounds = shard_bounds(total, shard(index, count));
                    // Contiguous with the previous shard: disjoint, no gaps
                    assert_eq!(bounds.start, previous_end);
                    previous_end = bounds.end;
                    covered.extend(bounds.start..bounds.end);
                }
                assert_eq!(previous_end, total);
                assert_eq!(covered, (0..total).collect::<Vec<_>>());
            }
        }
    }

    #[test]
    fn test_more_shards_than_domains() {
        // size rounds to 0: early shards own nothing, the last owns it all
        assert!(shard_bounds(3, shard(0, 5)).is_empty());
        assert!(shard_bounds(3, shard(3, 5)).is_empty());
        let last = shard_bounds(3, shard(4, 5));
        assert_eq!((last.start, last.end), (0, 3));
    }

    #[test]
    fn test_empty_roster() {
        let bounds = shard_bounds(0, shard(0, 4));
        assert!(bounds.is_empty());
        let empty: Vec<String> = Vec::new();
        assert!(partition(&empty, shard(3, 4)).is_empty());
    }
}
