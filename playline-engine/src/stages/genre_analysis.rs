//! GenreAnalysis stage: play counts per genre
//!
//! Same shape as the counting stage but keyed by genre. Records with an
//! empty genre are excluded from the counts; they are never an error.

use super::{ranked_keys, sharded_counts};
use playline_common::model::{GenreAnalysisResult, StreamRecord};
use std::time::Instant;

pub fn genre_analysis(records: &[StreamRecord]) -> GenreAnalysisResult {
    let start = Instant::now();
    let genre_counts = sharded_counts(records, |record| {
        if record.genre.is_empty() {
            None
        } else {
            Some(record.genre.clone())
        }
    });
    let top_genres = ranked_keys(&genre_counts, None);
    GenreAnalysisResult {
        genre_counts,
        top_genres,
        processing_time: start.elapsed().as_secs_f64(),
    }
}
