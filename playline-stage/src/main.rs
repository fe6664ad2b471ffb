//! playline-stage - one aggregation stage as an HTTP microservice
//!
//! Serves a single named stage (counting, user_behavior, genre_analysis or
//! recommendation) over the HTTP+JSON, JSON-RPC and chain-forwarding
//! bindings. With `--forward-to` the service becomes a chain hop that
//! hands its accumulated results to the next stage's address.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use playline_common::metrics::JsonlMetricsSink;
use playline_common::model::StageName;
use playline_stage::forward::ForwardClient;
use playline_stage::metrics::spawn_metrics_writer;
use playline_stage::{build_router, AppState};
use tokio::signal;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for playline-stage
#[derive(Parser, Debug)]
#[command(name = "playline-stage")]
#[command(about = "Playline aggregation stage microservice")]
#[command(version)]
struct Args {
    /// Stage to serve: counting, user_behavior, genre_analysis, recommendation
    #[arg(short, long, env = "PLAYLINE_STAGE")]
    stage: StageName,

    /// Port to listen on (defaults to the stage's canonical port)
    #[arg(short, long, env = "PLAYLINE_STAGE_PORT")]
    port: Option<u16>,

    /// Base URL of the next stage in the forwarding chain
    #[arg(long, env = "PLAYLINE_FORWARD_TO")]
    forward_to: Option<String>,

    /// Per-call timeout for forwarded chain hops, in seconds
    #[arg(long, default_value = "30")]
    timeout_secs: u64,

    /// Append per-request processing-time metrics to this JSON-lines file
    #[arg(long, env = "PLAYLINE_METRICS_FILE")]
    metrics_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "playline_stage=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let port = args.port.unwrap_or_else(|| args.stage.default_port());

    info!(
        "Starting playline-stage v{} serving stage {} on port {}",
        env!("CARGO_PKG_VERSION"),
        args.stage,
        port
    );

    let mut state = AppState::new(args.stage);

    if let Some(next_url) = &args.forward_to {
        let client = ForwardClient::new(next_url, Duration::from_secs(args.timeout_secs))
            .context("Failed to build forward client")?;
        info!("Chain mode: forwarding to {}", client.url());
        state = state.with_forward(client);
    } else {
        info!("Terminal mode: /process returns accumulated results to the caller");
    }

    if let Some(path) = &args.metrics_file {
        info!("Metrics sink: {}", path.display());
        let sender = spawn_metrics_writer(Box::new(JsonlMetricsSink::new(path)));
        state = state.with_metrics(sender);
    }

    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;
    info!("Listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        }
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        }
    }
}
