//! Diagnostics metrics sink
//!
//! Transport bindings may persist their own copy of per-stage processing
//! times for diagnostics. The sink is injected and optional; its failures
//! are reported on its own path and never affect pipeline correctness.

use crate::error::Result;
use crate::model::StageName;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::PathBuf;

/// One processing-time observation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsEntry {
    pub stage: StageName,
    pub processing_time: f64,
    pub recorded_at: DateTime<Utc>,
}

impl MetricsEntry {
    pub fn new(stage: StageName, processing_time: f64) -> Self {
        Self {
            stage,
            processing_time,
            recorded_at: Utc::now(),
        }
    }
}

/// Destination for diagnostics metrics
pub trait MetricsSink: Send + Sync {
    fn record(&self, entry: &MetricsEntry) -> Result<()>;
}

/// Appends one JSON object per line to a local file
#[derive(Debug, Clone)]
pub struct JsonlMetricsSink {
    path: PathBuf,
}

impl JsonlMetricsSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl MetricsSink for JsonlMetricsSink {
    fn record(&self, entry: &MetricsEntry) -> Result<()> {
        let line = serde_json::to_string(entry)
            .map_err(|e| crate::Error::Internal(format!("cannot encode metrics entry: {}", e)))?;
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{}", line)?;
        Ok(())
    }
}
