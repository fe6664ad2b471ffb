//! Counting stage: play counts per song
//!
//! Partitions records by the composite `"{artist} - {song_id}"` key and
//! counts records per partition.

use super::sharded_counts;
use playline_common::model::{play_key, CountingResult, StreamRecord};
use std::time::Instant;

pub fn counting(records: &[StreamRecord]) -> CountingResult {
    let start = Instant::now();
    let play_counts = sharded_counts(records, |record| {
        Some(play_key(&record.artist, &record.song_id))
    });
    CountingResult {
        play_counts,
        processing_time: start.elapsed().as_secs_f64(),
    }
}
