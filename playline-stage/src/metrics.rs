//! Channel-fed diagnostics metrics writer
//!
//! Handlers push entries onto a bounded channel; a background task drains
//! it into the injected sink. Sink failures are logged on this task and
//! never reach the request path.

use playline_common::metrics::{MetricsEntry, MetricsSink};
use tokio::sync::mpsc;

const CHANNEL_CAPACITY: usize = 64;

/// Spawn the writer task and hand back the sender side
pub fn spawn_metrics_writer(sink: Box<dyn MetricsSink>) -> mpsc::Sender<MetricsEntry> {
    let (sender, mut receiver) = mpsc::channel::<MetricsEntry>(CHANNEL_CAPACITY);
    tokio::spawn(async move {
        while let Some(entry) = receiver.recv().await {
            if let Err(error) = sink.record(&entry) {
                tracing::warn!(%error, stage = %entry.stage, "metrics sink write failed");
            }
        }
    });
    sender
}

#[cfg(test)]
mod tests {
    use super::*;
    use playline_common::metrics::JsonlMetricsSink;
    use playline_common::model::StageName;
    use std::time::Duration;

    #[tokio::test]
    async fn test_writer_drains_entries_to_sink() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("metrics.jsonl");
        let sender = spawn_metrics_writer(Box::new(JsonlMetricsSink::new(&path)));

        sender
            .send(MetricsEntry::new(StageName::Counting, 0.01))
            .await
            .unwrap();
        drop(sender);

        // give the writer task a moment to drain
        tokio::time::sleep(Duration::from_millis(50)).await;

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents.lines().count(), 1);
    }

    #[tokio::test]
    async fn test_sink_failure_does_not_panic_writer() {
        let sink = JsonlMetricsSink::new("/nonexistent/dir/metrics.jsonl");
        let sender = spawn_metrics_writer(Box::new(sink));

        sender
            .send(MetricsEntry::new(StageName::GenreAnalysis, 0.0))
            .await
            .unwrap();
        // channel still usable after the failed write
        sender
            .send(MetricsEntry::new(StageName::GenreAnalysis, 0.0))
            .await
            .unwrap();
    }
}
