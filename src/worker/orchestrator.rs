//! Orchestrator
//!
//! Sequences repeated batch runs against the queue until it is drained, a
//! run budget is exhausted, or repeated failures make continuing pointless.
//! Each run gets a fresh worker id so claims are attributable per run.

use super::batch::{BatchConfig, BatchReport, BatchWorker, WorkerContext};
use anyhow::{Context, Result};
use serde::Serialize;
use std::time::Duration;
use uuid::Uuid;

/// Pacing and stop conditions for a drain session.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Maximum batch runs; `0` means run until the queue has no pending
    /// jobs.
    pub total_batches: usize,
    /// Jobs claimed per run.
    pub batch_size: usize,
    /// Translator pool size per run.
    pub concurrency: usize,
    /// Pause between runs, plus a little jitter.
    pub delay_between_batches: Duration,
    /// Per-job translator deadline, passed through to each run.
    pub translate_timeout: Duration,
    /// Consecutive failed runs before the session aborts.
    pub max_consecutive_failures: usize,
    /// Prefix for per-run worker ids.
    pub worker_name: String,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            total_batches: 0,
            batch_size: 10,
            concurrency: 4,
            delay_between_batches: Duration::from_secs(2),
            translate_timeout: Duration::from_secs(120),
            max_consecutive_failures: 3,
            worker_name: "worker".to_string(),
        }
    }
}

/// Accumulated totals across a drain session.
#[derive(Debug, Clone, Default, Serialize)]
pub struct OrchestratorReport {
    pub batches_run: usize,
    pub claimed: usize,
    pub completed: usize,
    pub flagged: usize,
    pub failed: usize,
}

impl OrchestratorReport {
    fn absorb(&mut self, batch: &BatchReport) {
        self.claimed += batch.claimed;
        self.completed += batch.completed;
        self.flagged += batch.flagged;
        self.failed += batch.failed;
    }
}

/// Drives batch runs until a stop condition is met.
pub struct Orchestrator {
    ctx: WorkerContext,
    config: OrchestratorConfig,
}

impl Orchestrator {
    pub fn new(ctx: WorkerContext, config: OrchestratorConfig) -> Self {
        Self { ctx, config }
    }

    /// Runs the session. Stops cleanly when the run budget is reached or no
    /// pending jobs remain; aborts with the last error once
    /// `max_consecutive_failures` runs fail back to back, so repeated
    /// breakage reaches the operator instead of looping forever.
    pub async fn run(&self) -> Result<OrchestratorReport> {
        let mut report = OrchestratorReport::default();
        let mut consecutive_failures = 0usize;

        loop {
            if self.config.total_batches > 0 && report.batches_run >= self.config.total_batches {
                tracing::info!(
                    "Run budget of {} batch(es) reached",
                    self.config.total_batches
                );
                break;
            }

            let stats = self
                .ctx
                .store
                .stats()
                .context("orchestrator could not read queue stats")?;
            if stats.pending == 0 {
                tracing::info!(
                    "No pending jobs left ({} completed, {} flagged, {} failed in queue)",
                    stats.completed,
                    stats.qa_flagged,
                    stats.failed
                );
                break;
            }

            let worker_id = self.next_worker_id();
            let worker = BatchWorker::new(
                self.ctx.clone(),
                BatchConfig {
                    batch_size: self.config.batch_size,
                    concurrency: self.config.concurrency,
                    worker_id: worker_id.clone(),
                    translate_timeout: self.config.translate_timeout,
                },
            );

            report.batches_run += 1;
            match worker.run().await {
                Ok(batch) => {
                    consecutive_failures = 0;
                    report.absorb(&batch);
                }
                Err(err) => {
                    consecutive_failures += 1;
                    tracing::error!(
                        "Batch run {} ({}) failed ({}/{} consecutive): {:#}",
                        report.batches_run,
                        worker_id,
                        consecutive_failures,
                        self.config.max_consecutive_failures,
                        err
                    );
                    if consecutive_failures >= self.config.max_consecutive_failures {
                        return Err(err.context(format!(
                            "aborting after {} consecutive failed batch runs",
                            consecutive_failures
                        )));
                    }
                }
            }

            self.pause_between_runs().await;
        }

        tracing::info!(
            "Session finished: {} batch(es), {} claimed, {} completed, {} flagged, {} failed",
            report.batches_run,
            report.claimed,
            report.completed,
            report.flagged,
            report.failed
        );
        Ok(report)
    }

    fn next_worker_id(&self) -> String {
        let suffix = Uuid::new_v4().to_string();
        // Eight hex chars are plenty to tell concurrent runs apart in logs.
        format!("{}-{}", self.config.worker_name, &suffix[..8])
    }

    /// Sleeps the configured delay plus jitter to keep independent
    /// orchestrators from conflicting on the same commit version every
    /// round.
    async fn pause_between_runs(&self) {
        let jitter = rand::random::<u64>() % 250;
        let pause = self.config.delay_between_batches + Duration::from_millis(jitter);
        tracing::debug!("Pausing {:?} before next batch", pause);
        tokio::time::sleep(pause).await;
    }
}
