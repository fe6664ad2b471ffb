//! Caller-driven (star) pipeline orchestration
//!
//! A central coordinator invokes the three independent stages concurrently,
//! joins on all of them, then feeds their outputs to the recommendation
//! stage. The coordinator owns the `AccumulatedResult` and assembles it in
//! canonical stage order.
//!
//! The chain-forwarding topology lives in the stage services themselves;
//! both topologies produce the same logical `AccumulatedResult`.

use crate::adapter::{StagePayload, StageTransport};
use playline_common::model::{AccumulatedResult, StageName, StreamRecord};
use playline_common::Error;
use std::fmt;
use std::time::Instant;
use tracing::{debug, error, info};

/// Lifecycle of one pipeline run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    RecordsLoaded,
    StagesRunning,
    Accumulated,
    Reported,
    Failed,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RunState::Idle => "idle",
            RunState::RecordsLoaded => "records_loaded",
            RunState::StagesRunning => "stages_running",
            RunState::Accumulated => "accumulated",
            RunState::Reported => "reported",
            RunState::Failed => "failed",
        };
        f.write_str(label)
    }
}

/// Which stage failed, and why
#[derive(Debug)]
pub struct StageFailure {
    pub stage: StageName,
    pub error: Error,
}

/// Result of one pipeline run.
///
/// On failure `accumulated` still carries every stage result that did
/// complete; partial results are attached for diagnostics, never presented
/// as success.
#[derive(Debug)]
pub struct RunOutcome {
    pub accumulated: AccumulatedResult,
    /// Total wall-clock seconds for the whole run
    pub total_time: f64,
    pub failure: Option<StageFailure>,
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }

    pub fn state(&self) -> RunState {
        if self.is_success() {
            RunState::Accumulated
        } else {
            RunState::Failed
        }
    }
}

/// Run the star topology over the given transport.
///
/// Counting, UserBehavior and GenreAnalysis are issued concurrently and
/// ALL three are joined before anything else happens: a slow or failing
/// branch is never silently skipped. On the first unrecoverable failure
/// the remaining pipeline (recommendation) is aborted and the failing
/// stage is reported, with whatever completed attached.
pub async fn run_star(transport: &dyn StageTransport, records: &[StreamRecord]) -> RunOutcome {
    let start = Instant::now();
    debug!(records = records.len(), "star pipeline: fan-out");

    let (counting, behavior, genres) = tokio::join!(
        transport.invoke(
            StageName::Counting,
            StagePayload::Records(records.to_vec())
        ),
        transport.invoke(
            StageName::UserBehavior,
            StagePayload::Records(records.to_vec())
        ),
        transport.invoke(
            StageName::GenreAnalysis,
            StagePayload::Records(records.to_vec())
        ),
    );

    let mut accumulated = AccumulatedResult::new();
    let mut failure: Option<StageFailure> = None;

    let fan_out = [
        (StageName::Counting, counting),
        (StageName::UserBehavior, behavior),
        (StageName::GenreAnalysis, genres),
    ];
    for (stage, outcome) in fan_out {
        match outcome {
            Ok(result) => {
                debug!(%stage, processing_time = result.processing_time(), "stage completed");
                accumulated.insert(result);
            }
            Err(err) => {
                error!(%stage, error = %err, "stage failed");
                if failure.is_none() {
                    failure = Some(StageFailure { stage, error: err });
                }
            }
        }
    }

    if let Some(failure) = failure {
        return RunOutcome {
            accumulated,
            total_time: start.elapsed().as_secs_f64(),
            failure: Some(failure),
        };
    }

    // All three branches succeeded, so both inputs are present; guard
    // anyway rather than panic.
    let recommend_payload = match (accumulated.counting(), accumulated.user_behavior()) {
        (Some(counting), Some(behavior)) => StagePayload::Recommend {
            play_counts: counting.play_counts.clone(),
            user_stats: behavior.user_stats.clone(),
        },
        _ => {
            return RunOutcome {
                accumulated,
                total_time: start.elapsed().as_secs_f64(),
                failure: Some(StageFailure {
                    stage: StageName::Recommendation,
                    error: Error::Internal(
                        "recommendation inputs missing after successful fan-out".to_string(),
                    ),
                }),
            }
        }
    };

    match transport
        .invoke(StageName::Recommendation, recommend_payload)
        .await
    {
        Ok(result) => {
            accumulated.insert(result);
            info!(
                total_time = start.elapsed().as_secs_f64(),
                "star pipeline accumulated"
            );
            RunOutcome {
                accumulated,
                total_time: start.elapsed().as_secs_f64(),
                failure: None,
            }
        }
        Err(err) => {
            error!(stage = %StageName::Recommendation, error = %err, "stage failed");
            RunOutcome {
                accumulated,
                total_time: start.elapsed().as_secs_f64(),
                failure: Some(StageFailure {
                    stage: StageName::Recommendation,
                    error: err,
                }),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::{execute, InProcessTransport};
    use crate::stages::test_support::record;
    use async_trait::async_trait;
    use playline_common::model::StageResult;

    fn scenario_records() -> Vec<StreamRecord> {
        vec![
            record("U1", "S1", "Artist A", 100, ""),
            record("U1", "S2", "Artist A", 50, ""),
            record("U2", "S1", "Artist A", 30, ""),
        ]
    }

    #[tokio::test]
    async fn test_star_run_accumulates_all_four_stages() {
        let outcome = run_star(&InProcessTransport, &scenario_records()).await;

        assert!(outcome.is_success());
        assert_eq!(outcome.state(), RunState::Accumulated);
        assert!(outcome.accumulated.is_complete());
        assert_eq!(outcome.accumulated.len(), 4);

        let counting = outcome.accumulated.counting().unwrap();
        assert_eq!(counting.play_counts["Artist A - S1"], 2);

        let recommendation = outcome.accumulated.recommendation().unwrap();
        assert_eq!(
            recommendation.trending_songs,
            vec!["Artist A - S1", "Artist A - S2"]
        );
        assert_eq!(recommendation.recommendations["U1"], Vec::<String>::new());
    }

    #[tokio::test]
    async fn test_star_run_empty_records() {
        let outcome = run_star(&InProcessTransport, &[]).await;

        assert!(outcome.is_success());
        assert!(outcome.accumulated.is_complete());
        let behavior = outcome.accumulated.user_behavior().unwrap();
        assert!(behavior.user_stats.is_empty());
        for (_, result) in outcome.accumulated.iter() {
            assert!(result.processing_time() >= 0.0);
        }
    }

    /// Fails exactly one stage, computes the rest in-process
    struct FailingTransport {
        fail: StageName,
    }

    #[async_trait]
    impl StageTransport for FailingTransport {
        async fn invoke(
            &self,
            stage: StageName,
            payload: StagePayload,
        ) -> playline_common::Result<StageResult> {
            if stage == self.fail {
                return Err(Error::Transport {
                    kind: playline_common::TransportKind::Connect,
                    message: "connection refused".to_string(),
                });
            }
            execute(stage, payload)
        }
    }

    #[tokio::test]
    async fn test_failed_branch_reported_with_partial_results() {
        let transport = FailingTransport {
            fail: StageName::UserBehavior,
        };
        let outcome = run_star(&transport, &scenario_records()).await;

        assert!(!outcome.is_success());
        assert_eq!(outcome.state(), RunState::Failed);

        let failure = outcome.failure.as_ref().unwrap();
        assert_eq!(failure.stage, StageName::UserBehavior);
        assert_eq!(failure.error.kind_str(), "transport_failure");

        // the siblings still completed and are attached for diagnostics
        assert!(outcome.accumulated.counting().is_some());
        assert!(outcome.accumulated.genre_analysis().is_some());
        assert!(outcome.accumulated.user_behavior().is_none());
        // the remaining pipeline was aborted
        assert!(outcome.accumulated.recommendation().is_none());
    }

    #[tokio::test]
    async fn test_failed_recommendation_keeps_fan_out_results() {
        let transport = FailingTransport {
            fail: StageName::Recommendation,
        };
        let outcome = run_star(&transport, &scenario_records()).await;

        let failure = outcome.failure.as_ref().unwrap();
        assert_eq!(failure.stage, StageName::Recommendation);
        assert_eq!(outcome.accumulated.len(), 3);
    }

    #[tokio::test]
    async fn test_determinism_across_repeated_runs() {
        let records = scenario_records();
        let first = run_star(&InProcessTransport, &records).await;
        let second = run_star(&InProcessTransport, &records).await;

        let a = first.accumulated.recommendation().unwrap();
        let b = second.accumulated.recommendation().unwrap();
        assert_eq!(a.trending_songs, b.trending_songs);
        assert_eq!(a.recommendations, b.recommendations);
        assert_eq!(
            first.accumulated.counting().unwrap().play_counts,
            second.accumulated.counting().unwrap().play_counts
        );
    }
}
