//! Chain-forwarding hop
//!
//! `POST /process`: compute this service's stage, insert the result into
//! the received accumulated bag, then either forward records + accumulated
//! to the configured downstream stage or, as the terminal hop, return the
//! bag to the caller. Downstream failures are propagated unchanged.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use playline_common::api::ChainRequest;
use playline_common::model::StageName;
use playline_common::Error;
use playline_engine::{execute, StagePayload};

use crate::api::ApiError;
use crate::forward::ForwardError;
use crate::AppState;

/// POST /process
pub async fn process_chain(
    State(state): State<AppState>,
    payload: Result<Json<ChainRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            return ApiError::new(state.stage, Error::MalformedInput(rejection.body_text()))
                .into_response()
        }
    };
    let ChainRequest {
        records,
        mut accumulated,
    } = request;

    tracing::debug!(
        stage = %state.stage,
        records = records.len(),
        accumulated = accumulated.len(),
        "chain hop received"
    );

    // The recommendation hop computes from the accumulated upstream
    // outputs; it never re-reads the raw records.
    let stage_payload = match state.stage {
        StageName::Recommendation => {
            match (accumulated.counting(), accumulated.user_behavior()) {
                (Some(counting), Some(behavior)) => StagePayload::Recommend {
                    play_counts: counting.play_counts.clone(),
                    user_stats: behavior.user_stats.clone(),
                },
                _ => {
                    return ApiError::new(
                        state.stage,
                        Error::Internal(
                            "chain reached recommendation without counting and user_behavior results"
                                .to_string(),
                        ),
                    )
                    .into_response()
                }
            }
        }
        _ => StagePayload::Records(records.clone()),
    };

    let result = match execute(state.stage, stage_payload) {
        Ok(result) => result,
        Err(error) => return ApiError::new(state.stage, error).into_response(),
    };
    state.record_metrics(&result);
    accumulated.insert(result);

    match &state.forward {
        // terminal hop: hand the fully accumulated bag back up the chain
        None => (StatusCode::OK, Json(accumulated)).into_response(),
        Some(client) => {
            // ownership of the accumulated bag moves with the forward call
            let next = ChainRequest {
                records,
                accumulated,
            };
            match client.forward(&next).await {
                Ok(final_accumulated) => {
                    (StatusCode::OK, Json(final_accumulated)).into_response()
                }
                Err(ForwardError::Upstream { status, body }) => {
                    let status = StatusCode::from_u16(status)
                        .unwrap_or(StatusCode::BAD_GATEWAY);
                    (status, Json(body)).into_response()
                }
                Err(ForwardError::Transport(error)) => {
                    ApiError::unattributed(error).into_response()
                }
            }
        }
    }
}
