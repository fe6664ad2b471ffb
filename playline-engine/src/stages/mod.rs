//! The four aggregation stages
//!
//! Each stage is a side-effect-free function from its inputs to a result
//! plus its own wall-clock processing time. None of them mutate the record
//! set, and all counting/top-K selection is deterministic for a fixed input
//! order: ties go to the first-encountered entry.

pub mod counting;
pub mod genre_analysis;
pub mod recommendation;
pub mod user_behavior;

pub use counting::counting;
pub use genre_analysis::genre_analysis;
pub use recommendation::recommendation;
pub use user_behavior::user_behavior;

use indexmap::IndexMap;
use playline_common::model::StreamRecord;
use rayon::prelude::*;

/// Fixed size of the map-phase worker pool
pub const MAP_WORKERS: usize = 4;

/// Sharded map/reduce over the record set.
///
/// The map phase runs over contiguous shards in parallel, each shard
/// accumulating into its own insertion-ordered local map (no shared mutable
/// state, so no update can be lost). The reduce merges the shard maps
/// sequentially in shard order; because shards are contiguous slices of the
/// input, the merged map's insertion order is exactly global
/// first-encounter order, independent of scheduling.
pub(crate) fn sharded_counts<F>(records: &[StreamRecord], key_fn: F) -> IndexMap<String, u64>
where
    F: Fn(&StreamRecord) -> Option<String> + Sync,
{
    if records.is_empty() {
        return IndexMap::new();
    }

    let shard_len = records.len().div_ceil(MAP_WORKERS);
    let shards: Vec<IndexMap<String, u64>> = records
        .par_chunks(shard_len)
        .map(|shard| {
            let mut counts: IndexMap<String, u64> = IndexMap::new();
            for record in shard {
                if let Some(key) = key_fn(record) {
                    *counts.entry(key).or_insert(0) += 1;
                }
            }
            counts
        })
        .collect();

    let mut merged: IndexMap<String, u64> = IndexMap::new();
    for shard in shards {
        for (key, count) in shard {
            *merged.entry(key).or_insert(0) += count;
        }
    }
    merged
}

/// Keys of `counts` ranked by count descending; ties keep the map's
/// (first-encounter) order via stable sort.
pub(crate) fn ranked_keys(counts: &IndexMap<String, u64>, limit: Option<usize>) -> Vec<String> {
    let mut entries: Vec<(&String, &u64)> = counts.iter().collect();
    entries.sort_by(|a, b| b.1.cmp(a.1));
    let take = limit.unwrap_or(entries.len());
    entries
        .into_iter()
        .take(take)
        .map(|(key, _)| key.clone())
        .collect()
}


#[cfg(test)]
mod tests {
    use super::test_support::record;
    use super::*;

    #[test]
    fn test_sharded_counts_preserves_encounter_order_across_shards() {
        // more records than workers so several shards actually form
        let mut records = Vec::new();
        for i in 0..23 {
            records.push(record("U1", &format!("S{}", i % 7), "Artist", 1, ""));
        }
        let counts = sharded_counts(&records, |r| Some(r.song_id.clone()));

        let keys: Vec<&String> = counts.keys().collect();
        assert_eq!(keys[0], "S0");
        assert_eq!(keys[6], "S6");
        assert_eq!(counts.values().sum::<u64>(), 23);
    }

    #[test]
    fn test_ranked_keys_ties_keep_first_encounter() {
        let mut counts = indexmap::IndexMap::new();
        counts.insert("b".to_string(), 2u64);
        counts.insert("a".to_string(), 2u64);
        counts.insert("c".to_string(), 5u64);

        assert_eq!(ranked_keys(&counts, None), vec!["c", "b", "a"]);
        assert_eq!(ranked_keys(&counts, Some(2)), vec!["c", "b"]);
    }
}
