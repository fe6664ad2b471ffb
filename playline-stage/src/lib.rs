//! playline-stage library - one aggregation stage as an HTTP microservice
//!
//! Hosts a single named stage behind three routes:
//! - `POST /{stage}` - plain HTTP+JSON binding
//! - `POST /rpc` - JSON-RPC binding
//! - `POST /process` - chain-forwarding hop (computes, accumulates,
//!   forwards to the configured downstream stage or returns)
//! plus an unauthenticated `GET /health`.

use axum::routing::post;
use axum::Router;
use playline_common::metrics::MetricsEntry;
use playline_common::model::{StageName, StageResult};
use std::sync::Arc;
use tokio::sync::mpsc;
use tower_http::trace::TraceLayer;

pub mod api;
pub mod forward;
pub mod metrics;

use forward::ForwardClient;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// The stage this service computes
    pub stage: StageName,
    /// Downstream hop for the chain topology; `None` makes this service
    /// the terminal chain stage
    pub forward: Option<Arc<ForwardClient>>,
    /// Optional diagnostics metrics channel
    pub metrics: Option<mpsc::Sender<MetricsEntry>>,
}

impl AppState {
    pub fn new(stage: StageName) -> Self {
        Self {
            stage,
            forward: None,
            metrics: None,
        }
    }

    pub fn with_forward(mut self, client: ForwardClient) -> Self {
        self.forward = Some(Arc::new(client));
        self
    }

    pub fn with_metrics(mut self, sender: mpsc::Sender<MetricsEntry>) -> Self {
        self.metrics = Some(sender);
        self
    }

    /// Best-effort diagnostics; a full channel drops the entry rather than
    /// slowing the request path.
    pub(crate) fn record_metrics(&self, result: &StageResult) {
        if let Some(sender) = &self.metrics {
            let entry = MetricsEntry::new(result.stage(), result.processing_time());
            if sender.try_send(entry).is_err() {
                tracing::warn!(stage = %result.stage(), "metrics channel full, dropping entry");
            }
        }
    }
}

/// Build application router for the configured stage
pub fn build_router(state: AppState) -> Router {
    let stage_handler = match state.stage {
        StageName::Recommendation => post(api::stage::process_recommend),
        _ => post(api::stage::process_records),
    };
    let stage_path = format!("/{}", state.stage.as_str());

    Router::new()
        .route(&stage_path, stage_handler)
        .route("/rpc", post(api::rpc::rpc_call))
        .route("/process", post(api::chain::process_chain))
        .merge(api::health::health_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
