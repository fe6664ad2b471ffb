//! JSON-RPC binding
//!
//! `POST /rpc` with a JSON-RPC 2.0 envelope, method `"process"`. Params
//! carry the same bodies as the plain HTTP binding; errors map onto rpc
//! error codes so callers can tell malformed input from server failures.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use playline_common::api::{
    RecommendRequest, RecordsRequest, RpcError, RpcRequest, RpcResponse, RPC_INTERNAL_ERROR,
    RPC_INVALID_PARAMS, RPC_INVALID_REQUEST, RPC_METHOD_NOT_FOUND, RPC_METHOD_PROCESS,
    RPC_SERVER_ERROR, RPC_VERSION,
};
use playline_common::model::StageName;
use playline_common::Error;
use playline_engine::{execute, StagePayload};

use crate::AppState;

/// POST /rpc
pub async fn rpc_call(
    State(state): State<AppState>,
    payload: Result<Json<RpcRequest>, JsonRejection>,
) -> Json<RpcResponse> {
    let request = match payload {
        Ok(Json(request)) => request,
        // the request id cannot be determined, so the error carries a null id
        Err(rejection) => {
            return Json(RpcResponse::error(
                None,
                RpcError {
                    code: RPC_INVALID_REQUEST,
                    message: rejection.body_text(),
                    data: None,
                },
            ))
        }
    };

    if request.jsonrpc != RPC_VERSION {
        return Json(RpcResponse::error(
            Some(request.id),
            RpcError {
                code: RPC_INVALID_REQUEST,
                message: format!("unsupported jsonrpc version {:?}", request.jsonrpc),
                data: None,
            },
        ));
    }
    if request.method != RPC_METHOD_PROCESS {
        return Json(RpcResponse::error(
            Some(request.id),
            RpcError {
                code: RPC_METHOD_NOT_FOUND,
                message: format!("unknown method {:?}", request.method),
                data: None,
            },
        ));
    }

    let stage_payload = match decode_params(state.stage, request.params) {
        Ok(stage_payload) => stage_payload,
        Err(error) => {
            return Json(RpcResponse::error(Some(request.id), rpc_error_from(&error)))
        }
    };

    match execute(state.stage, stage_payload) {
        Ok(result) => {
            state.record_metrics(&result);
            match serde_json::to_value(&result) {
                Ok(value) => Json(RpcResponse::result(request.id, value)),
                Err(e) => Json(RpcResponse::error(
                    Some(request.id),
                    RpcError {
                        code: RPC_INTERNAL_ERROR,
                        message: format!("cannot encode stage result: {}", e),
                        data: None,
                    },
                )),
            }
        }
        Err(error) => Json(RpcResponse::error(Some(request.id), rpc_error_from(&error))),
    }
}

fn decode_params(stage: StageName, params: serde_json::Value) -> Result<StagePayload, Error> {
    match stage {
        StageName::Recommendation => {
            let request: RecommendRequest = serde_json::from_value(params)
                .map_err(|e| Error::MalformedInput(e.to_string()))?;
            Ok(StagePayload::Recommend {
                play_counts: request.play_counts,
                user_stats: request.user_stats,
            })
        }
        _ => {
            let request: RecordsRequest = serde_json::from_value(params)
                .map_err(|e| Error::MalformedInput(e.to_string()))?;
            Ok(StagePayload::Records(request.records))
        }
    }
}

fn rpc_error_from(error: &Error) -> RpcError {
    let code = match error {
        Error::MalformedInput(_) => RPC_INVALID_PARAMS,
        Error::Transport { .. } | Error::UpstreamStage { .. } => RPC_SERVER_ERROR,
        _ => RPC_INTERNAL_ERROR,
    };
    RpcError {
        code,
        message: error.to_string(),
        data: None,
    }
}
