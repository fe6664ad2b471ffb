//! Run reporting
//!
//! Prints a human-readable summary of an accumulated pipeline run and
//! persists the same data as a JSON report for later inspection.

use chrono::Utc;
use playline_common::model::AccumulatedResult;
use playline_common::{Error, Result};
use playline_engine::RunOutcome;
use serde::Serialize;
use std::path::Path;

/// Serializable snapshot of one pipeline run
#[derive(Debug, Serialize)]
pub struct RunReport {
    /// When the report was generated, UTC
    pub generated_at: chrono::DateTime<Utc>,
    /// Which transport binding carried the run
    pub workflow: String,
    pub record_count: usize,
    pub performance: Performance,
    pub results: AccumulatedResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureReport>,
}

#[derive(Debug, Serialize)]
pub struct Performance {
    /// Wall-clock seconds for the whole run, transport included
    pub total_time: f64,
    /// Self-reported per-stage computation seconds
    pub stage_times: Vec<StageTime>,
}

#[derive(Debug, Serialize)]
pub struct StageTime {
    pub stage: String,
    pub processing_time: f64,
}

#[derive(Debug, Serialize)]
pub struct FailureReport {
    pub stage: String,
    pub error: String,
    pub message: String,
}

impl RunReport {
    pub fn new(workflow: &str, record_count: usize, outcome: &RunOutcome) -> Self {
        let stage_times = outcome
            .accumulated
            .iter()
            .map(|(stage, result)| StageTime {
                stage: stage.to_string(),
                processing_time: result.processing_time(),
            })
            .collect();

        Self {
            generated_at: Utc::now(),
            workflow: workflow.to_string(),
            record_count,
            performance: Performance {
                total_time: outcome.total_time,
                stage_times,
            },
            results: outcome.accumulated.clone(),
            failure: outcome.failure.as_ref().map(|f| FailureReport {
                stage: f.stage.to_string(),
                error: f.error.kind_str().to_string(),
                message: f.error.to_string(),
            }),
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| Error::Internal(format!("cannot serialize report: {}", e)))?;
        std::fs::write(path, json)?;
        tracing::info!(path = %path.display(), "report saved");
        Ok(())
    }

    /// Print the run summary to stdout.
    pub fn print(&self) {
        println!("\n{:=<60}", "");
        println!("Pipeline run ({} workflow)", self.workflow);
        println!("{:=<60}", "");
        println!("Records processed: {}", self.record_count);
        println!("Total time: {:.3}s", self.performance.total_time);

        if let Some(counting) = self.results.counting() {
            println!("\n-- Play counts ({:.3}s)", counting.processing_time);
            for (key, count) in &counting.play_counts {
                println!("  {}: {}", key, count);
            }
        }

        if let Some(behavior) = self.results.user_behavior() {
            println!("\n-- User behavior ({:.3}s)", behavior.processing_time);
            for stat in &behavior.user_stats {
                println!(
                    "  {}: {}s listened, top artist: {}",
                    stat.user_id,
                    stat.total_time,
                    if stat.top_artist.is_empty() {
                        "(none)"
                    } else {
                        &stat.top_artist
                    }
                );
            }
            println!("  Top users: {}", behavior.top_users.join(", "));
        }

        if let Some(genres) = self.results.genre_analysis() {
            println!("\n-- Genre analysis ({:.3}s)", genres.processing_time);
            for (genre, count) in &genres.genre_counts {
                println!("  {}: {}", genre, count);
            }
            println!("  Top genres: {}", genres.top_genres.join(", "));
        }

        if let Some(recommendation) = self.results.recommendation() {
            println!(
                "\n-- Recommendations ({:.3}s)",
                recommendation.processing_time
            );
            println!("  Trending: {}", recommendation.trending_songs.join(", "));
            for (user, songs) in &recommendation.recommendations {
                println!("  {}: {}", user, songs.join(", "));
            }
        }

        if let Some(failure) = &self.failure {
            println!(
                "\nFAILED at {}: [{}] {}",
                failure.stage, failure.error, failure.message
            );
        }
        println!();
    }
}
