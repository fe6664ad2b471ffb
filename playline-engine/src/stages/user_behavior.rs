//! UserBehavior stage: total listen time and favorite artist per user
//!
//! Groups records by user in one ordered traversal. The "first occurrence"
//! tie-breaks here are a correctness property, so this stage deliberately
//! stays sequential instead of reusing the sharded map phase.

use indexmap::IndexMap;
use playline_common::model::{StreamRecord, UserBehaviorResult, UserStat};
use std::time::Instant;

/// Maximum entries in `top_users`
pub const TOP_USERS: usize = 5;

#[derive(Default)]
struct UserAccum {
    total_time: u64,
    /// Artist play counts in first-occurrence order for this user
    artist_counts: IndexMap<String, u64>,
}

pub fn user_behavior(records: &[StreamRecord]) -> UserBehaviorResult {
    let start = Instant::now();

    let mut users: IndexMap<String, UserAccum> = IndexMap::new();
    for record in records {
        let accum = users.entry(record.user_id.clone()).or_default();
        accum.total_time += record.duration;
        *accum.artist_counts.entry(record.artist.clone()).or_insert(0) += 1;
    }

    let user_stats: Vec<UserStat> = users
        .into_iter()
        .map(|(user_id, accum)| UserStat {
            user_id,
            total_time: accum.total_time,
            top_artist: top_artist(&accum.artist_counts),
        })
        .collect();

    let mut ranked: Vec<&UserStat> = user_stats.iter().collect();
    ranked.sort_by(|a, b| b.total_time.cmp(&a.total_time));
    let top_users = ranked
        .into_iter()
        .take(TOP_USERS)
        .map(|stat| stat.user_id.clone())
        .collect();

    UserBehaviorResult {
        user_stats,
        top_users,
        processing_time: start.elapsed().as_secs_f64(),
    }
}

/// Most frequent artist; a strictly-greater comparison over the
/// insertion-ordered counts means ties keep the first-occurring artist.
fn top_artist(artist_counts: &IndexMap<String, u64>) -> String {
    let mut best: Option<(&str, u64)> = None;
    for (artist, &count) in artist_counts {
        if best.map_or(true, |(_, best_count)| count > best_count) {
            best = Some((artist, count));
        }
    }
    best.map(|(artist, _)| artist.to_string()).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::super::test_support::record;
    use super::*;

    #[test]
    fn test_user_behavior_scenario() {
        let records = vec![
            record("U1", "S1", "Artist A", 100, ""),
            record("U1", "S2", "Artist A", 50, ""),
            record("U2", "S1", "Artist A", 30, ""),
        ];
        let result = user_behavior(&records);

        assert_eq!(
            result.user_stats,
            vec![
                UserStat {
                    user_id: "U1".to_string(),
                    total_time: 150,
                    top_artist: "Artist A".to_string(),
                },
                UserStat {
                    user_id: "U2".to_string(),
                    total_time: 30,
                    top_artist: "Artist A".to_string(),
                },
            ]
        );
        assert_eq!(result.top_users, vec!["U1", "U2"]);
    }

    #[test]
    fn test_top_artist_tie_goes_to_first_occurrence() {
        let records = vec![
            record("U1", "S1", "Zeta", 10, ""),
            record("U1", "S2", "Alpha", 10, ""),
            record("U1", "S3", "Alpha", 10, ""),
            record("U1", "S4", "Zeta", 10, ""),
        ];
        let result = user_behavior(&records);
        // both artists played twice; Zeta appeared first in record order
        assert_eq!(result.user_stats[0].top_artist, "Zeta");
    }

    #[test]
    fn test_top_users_bounded_and_sorted() {
        let records: Vec<_> = (0..8)
            .map(|i| record(&format!("U{}", i), "S1", "A", 100 - i, ""))
            .collect();
        let result = user_behavior(&records);

        assert_eq!(result.user_stats.len(), 8);
        assert_eq!(result.top_users.len(), TOP_USERS);
        assert_eq!(result.top_users, vec!["U0", "U1", "U2", "U3", "U4"]);
    }

    #[test]
    fn test_top_users_tie_keeps_encounter_order() {
        let records = vec![
            record("U2", "S1", "A", 50, ""),
            record("U1", "S1", "A", 50, ""),
        ];
        let result = user_behavior(&records);
        assert_eq!(result.top_users, vec!["U2", "U1"]);
    }

    #[test]
    fn test_empty_input() {
        let result = user_behavior(&[]);
        assert!(result.user_stats.is_empty());
        assert!(result.top_users.is_empty());
        assert!(result.processing_time >= 0.0);
    }
}
