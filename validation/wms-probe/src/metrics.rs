//! Latency statistics collection.

use hdrhistogram::Histogram;
use serde::Serialize;

use crate::probe::{ProbeOutcome, ProbeResult};

/// Collects per-probe latency and status counts during a run.
pub struct MetricsCollector {
    histogram: Histogram<u64>,
    total: u64,
    succeeded: u64,
    failed: u64,
    dry_run: u64,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self {
            histogram: Histogram::new(3).expect("Failed to create histogram"),
            total: 0,
            succeeded: 0,
            failed: 0,
            dry_run: 0,
        }
    }

    pub fn record(&mut self, result: &ProbeResult) {
        self.total += 1;
        match &result.outcome {
            ProbeOutcome::Success { elapsed, .. } => {
                self.succeeded += 1;
                self.histogram.record(elapsed.as_micros() as u64).ok();
            }
            ProbeOutcome::DryRun => self.dry_run += 1,
            ProbeOutcome::Failed { .. } => self.failed += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    /// Generate the end-of-run summary.
    pub fn summary(&self, layers: Vec<String>, concurrency: u32) -> RunSummary {
        RunSummary {
            timestamp: chrono::Utc::now().to_rfc3339(),
            layers,
            concurrency,
            total_probes: self.total,
            succeeded: self.succeeded,
            failed: self.failed,
            dry_run: self.dry_run,
            latency_p50_ms: self.histogram.value_at_percentile(50.0) as f64 / 1000.0,
            latency_p90_ms: self.histogram.value_at_percentile(90.0) as f64 / 1000.0,
            latency_p99_ms: self.histogram.value_at_percentile(99.0) as f64 / 1000.0,
            latency_min_ms: self.histogram.min() as f64 / 1000.0,
            latency_max_ms: self.histogram.max() as f64 / 1000.0,
            latency_avg_ms: self.histogram.mean() / 1000.0,
        }
    }
}

impl Default for MetricsCollector {
    fn default() -> Self {
        Self::new()
    }
}

/// Final statistics of one probe run.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub timestamp: String,
    pub layers: Vec<String>,
    pub concurrency: u32,
    pub total_probes: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub dry_run: u64,

    // Latency percentiles (ms)
    pub latency_p50_ms: f64,
    pub latency_p90_ms: f64,
    pub latency_p99_ms: f64,
    pub latency_min_ms: f64,
    pub latency_max_ms: f64,
    pub latency_avg_ms: f64,
}
