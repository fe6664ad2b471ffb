//! JSON-RPC transport binding (the legacy remote-procedure-call wire)
//!
//! Every stage service exposes a single `process` method on `/rpc`; the
//! params carry the same payloads as the plain HTTP binding wrapped in a
//! JSON-RPC 2.0 envelope.

use async_trait::async_trait;
use playline_common::api::{
    RecommendRequest, RecordsRequest, RpcError, RpcRequest, RpcResponse, RPC_INVALID_PARAMS,
    RPC_METHOD_PROCESS, RPC_SERVER_ERROR,
};
use playline_common::config::PipelineConfig;
use playline_common::model::{StageName, StageResult};
use playline_common::{Error, Result, TransportKind};
use playline_engine::{StagePayload, StageTransport};
use std::sync::atomic::{AtomicU64, Ordering};

use super::{build_client, post_json, stage_result_from_value, transport_error};

pub struct JsonRpcTransport {
    client: reqwest::Client,
    config: PipelineConfig,
    next_id: AtomicU64,
}

impl JsonRpcTransport {
    pub fn new(config: PipelineConfig) -> Result<Self> {
        Ok(Self {
            client: build_client(&config)?,
            config,
            next_id: AtomicU64::new(1),
        })
    }

    fn params_for(payload: StagePayload) -> Result<serde_json::Value> {
        let params = match payload {
            StagePayload::Records(records) => serde_json::to_value(RecordsRequest { records }),
            StagePayload::Recommend {
                play_counts,
                user_stats,
            } => serde_json::to_value(RecommendRequest {
                play_counts,
                user_stats,
            }),
        };
        params.map_err(|e| Error::Internal(format!("cannot encode rpc params: {}", e)))
    }
}

#[async_trait]
impl StageTransport for JsonRpcTransport {
    async fn invoke(&self, stage: StageName, payload: StagePayload) -> Result<StageResult> {
        let url = format!("{}/rpc", self.config.endpoint(stage).base_url());
        let request = RpcRequest::new(
            RPC_METHOD_PROCESS,
            Self::params_for(payload)?,
            self.next_id.fetch_add(1, Ordering::Relaxed),
        );

        let response = post_json(&self.client, &url, &request, &self.config.retry).await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Transport {
                kind: TransportKind::Protocol,
                message: format!("{} rpc endpoint returned HTTP {}", stage, status),
            });
        }

        let envelope: RpcResponse = response
            .json()
            .await
            .map_err(|e| transport_error(&e))?;

        if let Some(error) = envelope.error {
            return Err(rpc_error_to_error(stage, error));
        }
        let value = envelope.result.ok_or_else(|| Error::Transport {
            kind: TransportKind::Protocol,
            message: format!("{} rpc response carried neither result nor error", stage),
        })?;
        stage_result_from_value(stage, value)
    }
}

fn rpc_error_to_error(stage: StageName, error: RpcError) -> Error {
    match error.code {
        RPC_INVALID_PARAMS => Error::MalformedInput(error.message),
        RPC_SERVER_ERROR => Error::UpstreamStage {
            stage,
            message: error.message,
        },
        code => Error::Internal(format!("rpc error {}: {}", code, error.message)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rpc_error_mapping() {
        let malformed = rpc_error_to_error(
            StageName::Counting,
            RpcError {
                code: RPC_INVALID_PARAMS,
                message: "missing field `duration`".into(),
                data: None,
            },
        );
        assert!(matches!(malformed, Error::MalformedInput(_)));

        let internal = rpc_error_to_error(
            StageName::Counting,
            RpcError {
                code: -32603,
                message: "boom".into(),
                data: None,
            },
        );
        assert!(matches!(internal, Error::Internal(_)));
    }
}
