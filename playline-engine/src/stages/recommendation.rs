//! Recommendation stage: trending songs and per-user suggestions
//!
//! A pure function of the counting and user-behavior outputs; it never
//! sees raw records. Trending selection depends on the play-count map's
//! iteration order, which upstream pins to first-encounter order.

use super::ranked_keys;
use indexmap::IndexMap;
use playline_common::model::{RecommendationResult, UserStat};
use std::time::Instant;

/// Maximum entries in `trending_songs`
pub const TRENDING_LIMIT: usize = 5;

pub fn recommendation(
    play_counts: &IndexMap<String, u64>,
    user_stats: &[UserStat],
) -> RecommendationResult {
    let start = Instant::now();

    let trending_songs = ranked_keys(play_counts, Some(TRENDING_LIMIT));

    let mut recommendations: IndexMap<String, Vec<String>> = IndexMap::new();
    for stat in user_stats {
        // An empty top artist must not exclude anything; a substring test
        // against "" would match every key.
        let songs = if stat.top_artist.is_empty() {
            trending_songs.clone()
        } else {
            trending_songs
                .iter()
                .filter(|song| !song.contains(&stat.top_artist))
                .cloned()
                .collect()
        };
        recommendations.insert(stat.user_id.clone(), songs);
    }

    RecommendationResult {
        trending_songs,
        recommendations,
        processing_time: start.elapsed().as_secs_f64(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::indexmap;

    fn stat(user_id: &str, total_time: u64, top_artist: &str) -> UserStat {
        UserStat {
            user_id: user_id.to_string(),
            total_time,
            top_artist: top_artist.to_string(),
        }
    }

    #[test]
    fn test_recommendation_scenario() {
        let play_counts = indexmap! {
            "Artist A - S1".to_string() => 2u64,
            "Artist A - S2".to_string() => 1u64,
        };
        let user_stats = vec![stat("U1", 150, "Artist A"), stat("U2", 30, "Artist A")];

        let result = recommendation(&play_counts, &user_stats);

        assert_eq!(result.trending_songs, vec!["Artist A - S1", "Artist A - S2"]);
        // both users' top artist appears in every trending key
        assert_eq!(result.recommendations["U1"], Vec::<String>::new());
        assert_eq!(result.recommendations["U2"], Vec::<String>::new());
    }

    #[test]
    fn test_exclusion_is_substring_based() {
        let play_counts = indexmap! {
            "Artist A - S1".to_string() => 5u64,
            "Artist B - S2".to_string() => 4u64,
            "Artist C - S3".to_string() => 3u64,
        };
        let user_stats = vec![stat("U1", 100, "Artist B")];

        let result = recommendation(&play_counts, &user_stats);
        assert_eq!(
            result.recommendations["U1"],
            vec!["Artist A - S1", "Artist C - S3"]
        );
    }

    #[test]
    fn test_empty_top_artist_qualifies_everything() {
        let play_counts = indexmap! {
            "Artist A - S1".to_string() => 2u64,
        };
        let user_stats = vec![stat("U1", 10, "")];

        let result = recommendation(&play_counts, &user_stats);
        assert_eq!(result.recommendations["U1"], vec!["Artist A - S1"]);
    }

    #[test]
    fn test_trending_bounded_to_five_sorted_descending() {
        let mut play_counts = IndexMap::new();
        for i in 0..9u64 {
            play_counts.insert(format!("Artist - S{}", i), i + 1);
        }
        let result = recommendation(&play_counts, &[]);

        assert_eq!(result.trending_songs.len(), TRENDING_LIMIT);
        assert_eq!(result.trending_songs[0], "Artist - S8");
        assert_eq!(result.trending_songs[4], "Artist - S4");
        assert!(result.recommendations.is_empty());
    }

    #[test]
    fn test_trending_tie_keeps_map_order() {
        let play_counts = indexmap! {
            "B - S1".to_string() => 3u64,
            "A - S2".to_string() => 3u64,
        };
        let result = recommendation(&play_counts, &[]);
        assert_eq!(result.trending_songs, vec!["B - S1", "A - S2"]);
    }

    #[test]
    fn test_empty_inputs() {
        let result = recommendation(&IndexMap::new(), &[]);
        assert!(result.trending_songs.is_empty());
        assert!(result.recommendations.is_empty());
        assert!(result.processing_time >= 0.0);
    }
}
