//! Client-side transport bindings
//!
//! Three remote implementations of the engine's `StageTransport` contract
//! plus the chain entry client. All share the same bounded
//! retry-with-backoff policy for transient transport failures; application
//! errors and malformed input are never retried.

mod chain;
mod http;
mod rpc;

pub use chain::ChainClient;
pub use http::HttpJsonTransport;
pub use rpc::JsonRpcTransport;

use playline_common::api::ErrorResponse;
use playline_common::config::{PipelineConfig, RetryPolicy};
use playline_common::model::{StageName, StageResult};
use playline_common::{Error, Result, TransportKind};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;

pub(crate) fn build_client(config: &PipelineConfig) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()
        .map_err(|e| Error::Internal(format!("cannot build http client: {}", e)))
}

pub(crate) fn transport_error(e: &reqwest::Error) -> Error {
    let kind = if e.is_timeout() {
        TransportKind::Timeout
    } else if e.is_connect() {
        TransportKind::Connect
    } else {
        TransportKind::Protocol
    };
    Error::Transport {
        kind,
        message: e.to_string(),
    }
}

/// POST a JSON body, retrying transient transport failures with doubling
/// backoff up to the configured attempt limit.
pub(crate) async fn post_json<T: Serialize>(
    client: &reqwest::Client,
    url: &str,
    body: &T,
    retry: &RetryPolicy,
) -> Result<reqwest::Response> {
    let mut backoff = Duration::from_millis(retry.backoff_ms);
    let mut attempt: u32 = 1;
    loop {
        match client.post(url).json(body).send().await {
            Ok(response) => return Ok(response),
            Err(e) => {
                let error = transport_error(&e);
                if !error.is_transient() || attempt >= retry.max_attempts.max(1) {
                    return Err(error);
                }
                tracing::warn!(
                    url,
                    attempt,
                    max_attempts = retry.max_attempts,
                    %error,
                    "request failed, retrying after backoff"
                );
                tokio::time::sleep(backoff).await;
                backoff *= 2;
                attempt += 1;
            }
        }
    }
}

/// Decode a 2xx body as `T`, or map a structured error body back into the
/// error taxonomy. `called` names the stage endpoint that was invoked.
pub(crate) async fn decode_response<T: DeserializeOwned>(
    called: StageName,
    response: reqwest::Response,
) -> Result<T> {
    let status = response.status();
    if status.is_success() {
        response.json::<T>().await.map_err(|e| Error::Transport {
            kind: TransportKind::Protocol,
            message: format!("invalid {} response body: {}", called, e),
        })
    } else {
        match response.json::<ErrorResponse>().await {
            Ok(body) => Err(body.into_error(called)),
            Err(_) => Err(Error::Transport {
                kind: TransportKind::Protocol,
                message: format!("{} returned HTTP {} with unreadable body", called, status),
            }),
        }
    }
}

/// Decode a stage's result payload, checked against the stage that was
/// invoked so an untagged mismatch cannot slip through.
pub(crate) fn stage_result_from_value(
    stage: StageName,
    value: serde_json::Value,
) -> Result<StageResult> {
    let decode_error = |e: serde_json::Error| Error::Transport {
        kind: TransportKind::Protocol,
        message: format!("invalid {} result payload: {}", stage, e),
    };
    let result = match stage {
        StageName::Counting => {
            StageResult::Counting(serde_json::from_value(value).map_err(decode_error)?)
        }
        StageName::UserBehavior => {
            StageResult::UserBehavior(serde_json::from_value(value).map_err(decode_error)?)
        }
        StageName::GenreAnalysis => {
            StageResult::GenreAnalysis(serde_json::from_value(value).map_err(decode_error)?)
        }
        StageName::Recommendation => {
            StageResult::Recommendation(serde_json::from_value(value).map_err(decode_error)?)
        }
    };
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Instant;

    /// A loopback port with nothing listening behind it
    fn refused_url() -> String {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        format!("http://{}/counting", addr)
    }

    #[tokio::test]
    async fn test_post_json_retries_transient_failures_with_backoff() {
        let client = reqwest::Client::new();
        let retry = RetryPolicy {
            max_attempts: 2,
            backoff_ms: 200,
        };

        let start = Instant::now();
        let error = post_json(&client, &refused_url(), &json!({}), &retry)
            .await
            .unwrap_err();

        assert!(error.is_transient(), "got: {}", error);
        // two attempts means exactly one backoff sleep between them
        assert!(start.elapsed() >= Duration::from_millis(200));
    }

    #[tokio::test]
    async fn test_post_json_single_attempt_fails_without_sleeping() {
        let client = reqwest::Client::new();
        let retry = RetryPolicy {
            max_attempts: 1,
            backoff_ms: 5_000,
        };

        let start = Instant::now();
        let error = post_json(&client, &refused_url(), &json!({}), &retry)
            .await
            .unwrap_err();

        assert!(error.is_transient(), "got: {}", error);
        assert!(start.elapsed() < Duration::from_millis(5_000));
    }

    #[test]
    fn test_stage_result_from_value_checks_shape() {
        let counting = json!({"play_counts": {"A - S1": 2}, "processing_time": 0.0});
        let result = stage_result_from_value(StageName::Counting, counting).unwrap();
        assert_eq!(result.stage(), StageName::Counting);

        let wrong = json!({"genre_counts": {}, "top_genres": [], "processing_time": 0.0});
        assert!(stage_result_from_value(StageName::Counting, wrong).is_err());
    }
}
