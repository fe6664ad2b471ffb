//! Plain HTTP+JSON stage endpoints
//!
//! `POST /{stage}` with the stage's request body. A body that fails to
//! deserialize (missing field, negative duration, wrong type) is malformed
//! input and a 400, never a silently coerced or empty result.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use playline_common::api::{RecommendRequest, RecordsRequest};
use playline_common::model::StageResult;
use playline_common::Error;
use playline_engine::{execute, StagePayload};

use crate::api::ApiError;
use crate::AppState;

/// POST /{counting|user_behavior|genre_analysis}
pub async fn process_records(
    State(state): State<AppState>,
    payload: Result<Json<RecordsRequest>, JsonRejection>,
) -> Result<Json<StageResult>, ApiError> {
    let Json(request) = payload
        .map_err(|e| ApiError::new(state.stage, Error::MalformedInput(e.body_text())))?;

    tracing::debug!(stage = %state.stage, records = request.records.len(), "stage request");

    let result = execute(state.stage, StagePayload::Records(request.records))
        .map_err(|e| ApiError::new(state.stage, e))?;
    state.record_metrics(&result);
    Ok(Json(result))
}

/// POST /recommendation
pub async fn process_recommend(
    State(state): State<AppState>,
    payload: Result<Json<RecommendRequest>, JsonRejection>,
) -> Result<Json<StageResult>, ApiError> {
    let Json(request) = payload
        .map_err(|e| ApiError::new(state.stage, Error::MalformedInput(e.body_text())))?;

    let result = execute(
        state.stage,
        StagePayload::Recommend {
            play_counts: request.play_counts,
            user_stats: request.user_stats,
        },
    )
    .map_err(|e| ApiError::new(state.stage, e))?;
    state.record_metrics(&result);
    Ok(Json(result))
}
