//! Bounded-concurrency probe dispatch.
//!
//! The submitting task owns admission, connection renewal and result
//! draining; workers own exactly one test each and communicate back only
//! through the completion channel.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Semaphore};
use tokio::time::sleep;
use tracing::{debug, info};

use crate::probe::{ProbeOutcome, ProbeResult, ProbeTest};
use crate::report::ResultSink;
use crate::transport::{Transport, TransportError, TransportFactory, TransportResponse};

/// Number of launches a transport context serves before it is replaced.
pub const MAX_CONNECTIONS: u32 = 256;

/// Delay before the single retry after a transient busy signal.
pub const BUSY_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Executes a batch of probe tests with concurrency capped at `max_workers`,
/// streaming each result to the sink as soon as it is drained.
pub struct DispatchEngine {
    factory: Arc<dyn TransportFactory>,
    max_workers: usize,
    dry_run: bool,
    retry_delay: Duration,
}

impl DispatchEngine {
    pub fn new(factory: Arc<dyn TransportFactory>, max_workers: usize, dry_run: bool) -> Self {
        Self {
            factory,
            max_workers,
            dry_run,
            retry_delay: BUSY_RETRY_DELAY,
        }
    }

    /// Override the transient-retry delay.
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Run every test to completion.
    ///
    /// Exactly one result per submitted test reaches the sink, in completion
    /// order. Probe failures become `Failed` outcomes; only sink and
    /// transport-context setup errors abort the run.
    pub async fn run(&self, tests: Vec<ProbeTest>, sink: &mut dyn ResultSink) -> anyhow::Result<()> {
        let semaphore = Arc::new(Semaphore::new(self.max_workers));
        let (tx, mut rx) = mpsc::unbounded_channel();

        let mut context = self.factory.new_context()?;
        let mut connection_count: u32 = 0;

        for test in tests {
            // Admission: blocks submission until a worker slot frees up.
            let permit = semaphore.clone().acquire_owned().await?;
            connection_count += 1;

            let context_for_probe = Arc::clone(&context);
            let tx = tx.clone();
            let dry_run = self.dry_run;
            let retry_delay = self.retry_delay;
            tokio::spawn(async move {
                let result = execute_probe(test, context_for_probe, dry_run, retry_delay).await;
                let _ = tx.send(result);
                drop(permit);
            });

            if connection_count == MAX_CONNECTIONS {
                // Subsequent launches get a fresh context; the outgoing one
                // is released when its last in-flight probe finishes.
                debug!(connections = connection_count, "renewing transport context");
                context = self.factory.new_context()?;
                connection_count = 0;
            }

            // Drain finished probes without blocking further submission.
            while let Ok(result) = rx.try_recv() {
                sink.report(result)?;
            }
        }

        // All tests submitted; drain the remaining completions.
        drop(tx);
        while let Some(result) = rx.recv().await {
            sink.report(result)?;
        }
        Ok(())
    }
}

/// Execute one probe. Errors never propagate: they become `Failed` outcomes
/// so sibling probes and the batch keep running.
async fn execute_probe(
    test: ProbeTest,
    context: Arc<dyn Transport>,
    dry_run: bool,
    retry_delay: Duration,
) -> ProbeResult {
    let url = test.request_url();

    let outcome = if dry_run {
        ProbeOutcome::DryRun
    } else {
        match context.send(&url).await {
            Ok(response) => success(response),
            Err(TransportError::Busy(reason)) => {
                info!(
                    %reason,
                    delay_secs = retry_delay.as_secs_f64(),
                    "connection overflow, pausing before retry"
                );
                sleep(retry_delay).await;
                match context.send(&url).await {
                    Ok(response) => success(response),
                    Err(err) => ProbeOutcome::Failed {
                        reason: err.to_string(),
                    },
                }
            }
            Err(err) => ProbeOutcome::Failed {
                reason: err.to_string(),
            },
        }
    };

    ProbeResult {
        label: test.label,
        layer: test.layer,
        url,
        bbox: test.bbox,
        outcome,
    }
}

fn success(response: TransportResponse) -> ProbeOutcome {
    ProbeOutcome::Success {
        status: response.status,
        content_type: response.content_type,
        elapsed: response.elapsed,
    }
}
