//! Pipeline driver binary
//!
//! Loads a CSV of play records and runs the four-stage pipeline through
//! the selected transport binding, printing and optionally persisting the
//! accumulated results. Exits non-zero when any stage fails.

use anyhow::Result;
use clap::{Parser, ValueEnum};
use playline_client::loader::load_records;
use playline_client::report::RunReport;
use playline_client::transport::{ChainClient, HttpJsonTransport, JsonRpcTransport};
use playline_common::config::PipelineConfig;
use playline_common::model::{StageName, StreamRecord};
use playline_common::Error;
use playline_engine::{run_star, InProcessTransport, RunOutcome, RunState, StageFailure};
use std::path::PathBuf;
use std::time::Instant;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// In-process, no network
    Local,
    /// One HTTP+JSON call per stage, driver-coordinated
    Http,
    /// One JSON-RPC call per stage, driver-coordinated
    Rpc,
    /// Single call to the first stage; stages forward to each other
    Chain,
}

impl Mode {
    fn as_str(&self) -> &'static str {
        match self {
            Mode::Local => "local",
            Mode::Http => "http",
            Mode::Rpc => "rpc",
            Mode::Chain => "chain",
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "playline-client")]
#[command(about = "Playline pipeline driver")]
struct Args {
    /// CSV file of play records
    #[arg(long)]
    data: PathBuf,

    /// Transport binding to run the pipeline through
    #[arg(long, value_enum, default_value = "local")]
    mode: Mode,

    /// Optional TOML config with stage endpoints and retry policy
    #[arg(long, env = "PLAYLINE_CONFIG")]
    config: Option<PathBuf>,

    /// Write the JSON run report here
    #[arg(long)]
    out: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "playline_client=info,playline_engine=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    info!(state = %RunState::Idle, mode = args.mode.as_str(), "driver starting");

    let config = PipelineConfig::load(args.config.as_deref())?;
    let records = load_records(&args.data)?;
    info!(state = %RunState::RecordsLoaded, records = records.len(), "records loaded");

    info!(state = %RunState::StagesRunning, "dispatching stages");
    let outcome = run_pipeline(args.mode, config, &records).await?;
    info!(state = %outcome.state(), total_time = outcome.total_time, "pipeline finished");

    let report = RunReport::new(args.mode.as_str(), records.len(), &outcome);
    report.print();
    if let Some(path) = &args.out {
        report.save(path)?;
    }
    info!(state = %RunState::Reported, "driver done");

    if !outcome.is_success() {
        std::process::exit(1);
    }
    Ok(())
}

async fn run_pipeline(
    mode: Mode,
    config: PipelineConfig,
    records: &[StreamRecord],
) -> Result<RunOutcome> {
    let outcome = match mode {
        Mode::Local => run_star(&InProcessTransport, records).await,
        Mode::Http => run_star(&HttpJsonTransport::new(config)?, records).await,
        Mode::Rpc => run_star(&JsonRpcTransport::new(config)?, records).await,
        Mode::Chain => run_chain(config, records).await?,
    };
    Ok(outcome)
}

/// The chain binding returns the whole accumulation from one call, so the
/// star orchestrator does not apply; wrap the single result in the same
/// outcome shape the other modes produce.
///
/// A failed chain run carries no partial accumulation: the error body that
/// comes back up the chain names the failing stage but not the results the
/// earlier hops computed. Partial-result diagnostics are a star-mode
/// feature.
async fn run_chain(config: PipelineConfig, records: &[StreamRecord]) -> Result<RunOutcome> {
    let client = ChainClient::new(config)?;
    let start = Instant::now();
    match client.run(records).await {
        Ok(accumulated) => Ok(RunOutcome {
            accumulated,
            total_time: start.elapsed().as_secs_f64(),
            failure: None,
        }),
        Err(error) => Ok(RunOutcome {
            accumulated: Default::default(),
            total_time: start.elapsed().as_secs_f64(),
            failure: Some(chain_failure(error)),
        }),
    }
}

/// Attribute a chain failure to a stage. An upstream error body names the
/// originating hop; anything else happened talking to the entry stage.
fn chain_failure(error: Error) -> StageFailure {
    let stage = match &error {
        Error::UpstreamStage { stage, .. } => *stage,
        _ => StageName::Counting,
    };
    StageFailure { stage, error }
}
