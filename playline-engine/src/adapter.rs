//! Transport adapter contract
//!
//! A capability interface with one operation: invoke a named stage with a
//! decoded payload. Concrete bindings (in-process, HTTP+JSON, JSON-RPC)
//! implement this by (de)serializing to their wire format; the engine and
//! orchestrator depend only on this trait.

use crate::stages;
use async_trait::async_trait;
use indexmap::IndexMap;
use playline_common::model::{StageName, StageResult, StreamRecord, UserStat};
use playline_common::{Error, Result};

/// Decoded input for one stage invocation
#[derive(Debug, Clone)]
pub enum StagePayload {
    /// Input for the three record-consuming stages
    Records(Vec<StreamRecord>),
    /// Input for the recommendation stage: prior stage outputs only
    Recommend {
        play_counts: IndexMap<String, u64>,
        user_stats: Vec<UserStat>,
    },
}

/// Dispatch a payload to the matching stage algorithm.
///
/// A payload of the wrong shape for the stage is malformed input, not a
/// silent empty result.
pub fn execute(stage: StageName, payload: StagePayload) -> Result<StageResult> {
    match (stage, payload) {
        (StageName::Counting, StagePayload::Records(records)) => {
            Ok(StageResult::Counting(stages::counting(&records)))
        }
        (StageName::UserBehavior, StagePayload::Records(records)) => {
            Ok(StageResult::UserBehavior(stages::user_behavior(&records)))
        }
        (StageName::GenreAnalysis, StagePayload::Records(records)) => {
            Ok(StageResult::GenreAnalysis(stages::genre_analysis(&records)))
        }
        (
            StageName::Recommendation,
            StagePayload::Recommend {
                play_counts,
                user_stats,
            },
        ) => Ok(StageResult::Recommendation(stages::recommendation(
            &play_counts,
            &user_stats,
        ))),
        (stage, _) => Err(Error::MalformedInput(format!(
            "wrong payload shape for stage {}",
            stage
        ))),
    }
}

/// One remotely-callable operation per stage
#[async_trait]
pub trait StageTransport: Send + Sync {
    async fn invoke(&self, stage: StageName, payload: StagePayload) -> Result<StageResult>;
}

/// The local binding: direct dispatch to the engine, no wire format.
/// Default transport for single-process runs and orchestrator tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct InProcessTransport;

#[async_trait]
impl StageTransport for InProcessTransport {
    async fn invoke(&self, stage: StageName, payload: StagePayload) -> Result<StageResult> {
        execute(stage, payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stages::test_support::record;

    #[test]
    fn test_execute_dispatches_by_stage() {
        let records = vec![record("U1", "S1", "Artist A", 100, "rock")];
        let result = execute(StageName::Counting, StagePayload::Records(records)).unwrap();
        assert_eq!(result.stage(), StageName::Counting);
    }

    #[test]
    fn test_execute_rejects_mismatched_payload() {
        let records = vec![record("U1", "S1", "Artist A", 100, "")];
        let result = execute(StageName::Recommendation, StagePayload::Records(records));
        assert!(matches!(result, Err(Error::MalformedInput(_))));

        let result = execute(
            StageName::Counting,
            StagePayload::Recommend {
                play_counts: IndexMap::new(),
                user_stats: Vec::new(),
            },
        );
        assert!(matches!(result, Err(Error::MalformedInput(_))));
    }

    #[tokio::test]
    async fn test_in_process_transport_matches_direct_call() {
        let records = vec![
            record("U1", "S1", "Artist A", 100, ""),
            record("U2", "S1", "Artist A", 30, ""),
        ];
        let transport = InProcessTransport;
        let via_transport = transport
            .invoke(StageName::Counting, StagePayload::Records(records.clone()))
            .await
            .unwrap();
        let direct = stages::counting(&records);

        match via_transport {
            StageResult::Counting(result) => assert_eq!(result.play_counts, direct.play_counts),
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
