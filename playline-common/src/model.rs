//! Record and stage result models
//!
//! The shared vocabulary all pipeline stages speak: one play event
//! (`StreamRecord`), the per-stage outputs, and the `AccumulatedResult`
//! bag that grows as a pipeline run progresses.
//!
//! Every mapping whose iteration order is observable (`play_counts`,
//! `genre_counts`, `recommendations`, accumulated stages) is an `IndexMap`
//! so that "first encountered in the input" is a real, testable order and
//! not an accident of hashing.

use crate::error::Error;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Composite play-count key: `"{artist} - {song_id}"`
pub fn play_key(artist: &str, song_id: &str) -> String {
    format!("{} - {}", artist, song_id)
}

/// One play event. Immutable once created; owned by the driver and passed
/// by read-only reference into the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamRecord {
    pub user_id: String,
    pub song_id: String,
    pub artist: String,
    /// Listen duration in seconds. Wire values that are negative or
    /// non-integral are rejected as malformed input, never coerced.
    pub duration: u64,
    /// ISO-8601 timestamp; carried through verbatim, never parsed here.
    pub timestamp: String,
    /// May be empty; empty genres are excluded from genre counts.
    #[serde(default)]
    pub genre: String,
}

/// The four pipeline stages, in canonical execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageName {
    Counting,
    UserBehavior,
    GenreAnalysis,
    Recommendation,
}

impl StageName {
    /// Canonical execution order
    pub const ALL: [StageName; 4] = [
        StageName::Counting,
        StageName::UserBehavior,
        StageName::GenreAnalysis,
        StageName::Recommendation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StageName::Counting => "counting",
            StageName::UserBehavior => "user_behavior",
            StageName::GenreAnalysis => "genre_analysis",
            StageName::Recommendation => "recommendation",
        }
    }

    /// Default listen port for the stage's service
    pub fn default_port(&self) -> u16 {
        match self {
            StageName::Counting => 5001,
            StageName::UserBehavior => 5003,
            StageName::GenreAnalysis => 5005,
            StageName::Recommendation => 5007,
        }
    }
}

impl fmt::Display for StageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StageName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "counting" => Ok(StageName::Counting),
            "user_behavior" => Ok(StageName::UserBehavior),
            "genre_analysis" => Ok(StageName::GenreAnalysis),
            "recommendation" => Ok(StageName::Recommendation),
            other => Err(Error::Config(format!("unknown stage name: {}", other))),
        }
    }
}

/// Per-user listening summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStat {
    pub user_id: String,
    /// Sum of durations across the user's records, in seconds
    pub total_time: u64,
    /// Mode of the user's artist sequence, ties broken by first occurrence
    /// in the original record order
    pub top_artist: String,
}

/// Counting stage output: play counts keyed by `"{artist} - {song_id}"`,
/// in first-encounter order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountingResult {
    pub play_counts: IndexMap<String, u64>,
    pub processing_time: f64,
}

/// UserBehavior stage output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserBehaviorResult {
    /// One entry per user that appears in at least one record, ordered by
    /// first encounter
    pub user_stats: Vec<UserStat>,
    /// At most 5 user ids, sorted by `total_time` descending, ties by
    /// encounter order
    pub top_users: Vec<String>,
    pub processing_time: f64,
}

/// GenreAnalysis stage output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenreAnalysisResult {
    pub genre_counts: IndexMap<String, u64>,
    /// Genres sorted by count descending, ties by encounter order; unbounded
    pub top_genres: Vec<String>,
    pub processing_time: f64,
}

/// Recommendation stage output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationResult {
    /// Top-5 play-count keys by count descending, ties by map order
    pub trending_songs: Vec<String>,
    /// Per user: the trending songs whose key does not contain the user's
    /// top artist as a substring. An empty top artist excludes nothing.
    pub recommendations: IndexMap<String, Vec<String>>,
    pub processing_time: f64,
}

/// The output of one stage.
///
/// Serialized untagged: the payload field names of the four variants are
/// disjoint, so the plain JSON bodies the services exchange deserialize
/// unambiguously.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StageResult {
    Counting(CountingResult),
    UserBehavior(UserBehaviorResult),
    GenreAnalysis(GenreAnalysisResult),
    Recommendation(RecommendationResult),
}

impl StageResult {
    /// Which stage produced this result
    pub fn stage(&self) -> StageName {
        match self {
            StageResult::Counting(_) => StageName::Counting,
            StageResult::UserBehavior(_) => StageName::UserBehavior,
            StageResult::GenreAnalysis(_) => StageName::GenreAnalysis,
            StageResult::Recommendation(_) => StageName::Recommendation,
        }
    }

    /// Self-reported wall-clock seconds for the stage's computation
    pub fn processing_time(&self) -> f64 {
        match self {
            StageResult::Counting(r) => r.processing_time,
            StageResult::UserBehavior(r) => r.processing_time,
            StageResult::GenreAnalysis(r) => r.processing_time,
            StageResult::Recommendation(r) => r.processing_time,
        }
    }
}

/// The growing bag of per-stage results threaded through one pipeline run.
///
/// In the chain topology this value is serialized, handed to the next
/// stage, and deserialized there; a stage that has forwarded it never
/// touches its copy again.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccumulatedResult {
    stages: IndexMap<StageName, StageResult>,
}

impl AccumulatedResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a stage's result, keyed by the stage that produced it.
    /// Results are never mutated after insertion.
    pub fn insert(&mut self, result: StageResult) {
        self.stages.insert(result.stage(), result);
    }

    pub fn get(&self, stage: StageName) -> Option<&StageResult> {
        self.stages.get(&stage)
    }

    pub fn counting(&self) -> Option<&CountingResult> {
        match self.stages.get(&StageName::Counting) {
            Some(StageResult::Counting(r)) => Some(r),
            _ => None,
        }
    }

    pub fn user_behavior(&self) -> Option<&UserBehaviorResult> {
        match self.stages.get(&StageName::UserBehavior) {
            Some(StageResult::UserBehavior(r)) => Some(r),
            _ => None,
        }
    }

    pub fn genre_analysis(&self) -> Option<&GenreAnalysisResult> {
        match self.stages.get(&StageName::GenreAnalysis) {
            Some(StageResult::GenreAnalysis(r)) => Some(r),
            _ => None,
        }
    }

    pub fn recommendation(&self) -> Option<&RecommendationResult> {
        match self.stages.get(&StageName::Recommendation) {
            Some(StageResult::Recommendation(r)) => Some(r),
            _ => None,
        }
    }

    /// True once all four stages have reported
    pub fn is_complete(&self) -> bool {
        StageName::ALL
            .iter()
            .all(|stage| self.stages.contains_key(stage))
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (StageName, &StageResult)> {
        self.stages.iter().map(|(stage, result)| (*stage, result))
    }
}
