//! Shared wire request/response types
//!
//! Types exchanged between the driver, the stage services, and each other:
//! the plain HTTP+JSON bodies, the chain-forwarding hop, the JSON-RPC
//! envelope, and the structured error body all bindings use.

use crate::error::{Error, TransportKind};
use crate::model::{AccumulatedResult, StageName, StreamRecord, UserStat};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

// ========================================
// Stage request bodies
// ========================================

/// Request body for the three record-consuming stages
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordsRequest {
    pub records: Vec<StreamRecord>,
}

/// Request body for the recommendation stage: the outputs of the counting
/// and user-behavior stages, never raw records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendRequest {
    pub play_counts: IndexMap<String, u64>,
    pub user_stats: Vec<UserStat>,
}

/// One hop of the chain-forwarding topology: the original records plus the
/// results accumulated so far. Ownership of `accumulated` transfers with
/// the call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainRequest {
    pub records: Vec<StreamRecord>,
    #[serde(default)]
    pub accumulated: AccumulatedResult,
}

// ========================================
// Error body
// ========================================

/// Structured error body returned by every binding.
///
/// `error` is a stable kind string (`Error::kind_str`) so callers can
/// distinguish malformed input from transport and upstream failures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    /// The stage the error originated at, when known. A chain hop
    /// propagating a downstream failure keeps the original stage here.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stage: Option<StageName>,
}

impl ErrorResponse {
    pub fn from_error(stage: Option<StageName>, error: &Error) -> Self {
        Self {
            error: error.kind_str().to_string(),
            message: error.to_string(),
            stage,
        }
    }

    /// Map a wire error body back into the error taxonomy on the client
    /// side. `called` names the stage whose endpoint was invoked, used when
    /// the body does not say where the failure originated.
    pub fn into_error(self, called: StageName) -> Error {
        let stage = self.stage.unwrap_or(called);
        match self.error.as_str() {
            "malformed_input" => Error::MalformedInput(self.message),
            "upstream_stage_failure" => Error::UpstreamStage {
                stage,
                message: self.message,
            },
            "transport_failure" => Error::Transport {
                kind: TransportKind::Protocol,
                message: self.message,
            },
            _ => Error::UpstreamStage {
                stage,
                message: self.message,
            },
        }
    }
}

// ========================================
// JSON-RPC envelope (legacy RPC binding)
// ========================================

pub const RPC_VERSION: &str = "2.0";
/// The single method every stage service exposes
pub const RPC_METHOD_PROCESS: &str = "process";

pub const RPC_INVALID_REQUEST: i64 = -32600;
pub const RPC_METHOD_NOT_FOUND: i64 = -32601;
pub const RPC_INVALID_PARAMS: i64 = -32602;
pub const RPC_INTERNAL_ERROR: i64 = -32603;
pub const RPC_SERVER_ERROR: i64 = -32000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcRequest {
    pub jsonrpc: String,
    pub method: String,
    pub params: Value,
    pub id: u64,
}

impl RpcRequest {
    pub fn new(method: impl Into<String>, params: Value, id: u64) -> Self {
        Self {
            jsonrpc: RPC_VERSION.to_string(),
            method: method.into(),
            params,
            id,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcResponse {
    pub jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
    /// `None` serializes as `null`, used when the request id could not be
    /// determined (undecodable envelope).
    pub id: Option<u64>,
}

impl RpcResponse {
    pub fn result(id: u64, result: Value) -> Self {
        Self {
            jsonrpc: RPC_VERSION.to_string(),
            result: Some(result),
            error: None,
            id: Some(id),
        }
    }

    pub fn error(id: Option<u64>, error: RpcError) -> Self {
        Self {
            jsonrpc: RPC_VERSION.to_string(),
            result: None,
            error: Some(error),
            id,
        }
    }
}

// ========================================
// Tests
// ========================================
