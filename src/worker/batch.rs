//! Batch Worker
//!
//! Claims a slice of pending jobs, processes them through a bounded pool of
//! translator invocations, and commits the per-job outcomes.

use crate::artifact::{ArtifactStore, Shelf};
use crate::qa::gate::{QaGate, QaVerdict};
use crate::queue::store::{commit_with_retry, CommitPolicy, QueueStore};
use crate::queue::types::{now_ms, JobMutation, JobStatus};
use crate::translate::client::Translator;
use crate::translate::source::SourceStore;

use anyhow::{Context, Result};
use dashmap::DashMap;
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// Shared collaborators a batch run needs. Cloning is cheap; every field is
/// reference-counted.
#[derive(Clone)]
pub struct WorkerContext {
    pub store: Arc<dyn QueueStore>,
    pub sources: Arc<SourceStore>,
    pub translator: Arc<dyn Translator>,
    pub artifacts: Arc<dyn ArtifactStore>,
    pub gate: Arc<QaGate>,
    pub policy: CommitPolicy,
}

/// Parameters for one batch run.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Upper bound on jobs claimed by this run.
    pub batch_size: usize,
    /// Size of the in-process translator pool.
    pub concurrency: usize,
    /// Unique identifier recorded in `claimed_by` for this run.
    pub worker_id: String,
    /// Per-job translator deadline.
    pub translate_timeout: Duration,
}

/// What one batch run did.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub worker_id: String,
    pub claimed: usize,
    pub completed: usize,
    pub flagged: usize,
    pub failed: usize,
}

/// Locally computed result for one claimed job, before it is committed.
#[derive(Debug, Clone)]
enum JobOutcome {
    Completed { result_ref: String },
    Flagged { result_ref: String, reasons: Vec<String> },
    Failed { error: String },
}

/// One batch run, start to finish.
pub struct BatchWorker {
    ctx: WorkerContext,
    config: BatchConfig,
}

impl BatchWorker {
    pub fn new(ctx: WorkerContext, config: BatchConfig) -> Self {
        Self { ctx, config }
    }

    /// Runs the claim / process / commit cycle once.
    ///
    /// Per-job failures are recorded, not propagated; an error from this
    /// function means the run itself could not proceed (claim conflicts
    /// exhausted, store unavailable) and no terminal state was forced.
    pub async fn run(&self) -> Result<BatchReport> {
        let claimed = self.claim_batch().await?;
        if claimed.is_empty() {
            tracing::debug!("Worker {} found no pending jobs", self.config.worker_id);
            return Ok(BatchReport {
                worker_id: self.config.worker_id.clone(),
                ..BatchReport::default()
            });
        }

        tracing::info!(
            "Worker {} claimed {} job(s): {:?}",
            self.config.worker_id,
            claimed.len(),
            claimed
        );

        let outcomes = self.process_batch(&claimed).await;
        self.commit_outcomes(claimed.len(), outcomes).await
    }

    /// Claim phase: pending jobs in queue order, up to `batch_size`, under
    /// the shared conflict-retry discipline. Returns the claimed job ids.
    async fn claim_batch(&self) -> Result<Vec<String>> {
        let worker_id = self.config.worker_id.clone();
        let batch_size = self.config.batch_size;

        let outcome = commit_with_retry(self.ctx.store.as_ref(), &self.ctx.policy, |snapshot| {
            let now = now_ms();
            snapshot
                .jobs
                .iter()
                .filter(|job| job.status == JobStatus::Pending)
                .take(batch_size)
                .map(|job| JobMutation::Claim {
                    id: job.id.clone(),
                    worker: worker_id.clone(),
                    now,
                })
                .collect()
        })
        .await
        .with_context(|| format!("worker {} could not claim a batch", self.config.worker_id))?;

        Ok(outcome
            .map(|outcome| {
                outcome
                    .mutations
                    .iter()
                    .map(|mutation| mutation.job_id().to_string())
                    .collect()
            })
            .unwrap_or_default())
    }

    /// Process phase: `concurrency` pool tasks pull job ids from a shared
    /// deque until it is drained. Outcomes land in a shared map; a task that
    /// dies loses only its own in-flight job (the reclaimer heals it later).
    async fn process_batch(&self, claimed: &[String]) -> Arc<DashMap<String, JobOutcome>> {
        let work: Arc<Mutex<VecDeque<String>>> =
            Arc::new(Mutex::new(claimed.iter().cloned().collect()));
        let outcomes: Arc<DashMap<String, JobOutcome>> = Arc::new(DashMap::new());

        let pool_size = self.config.concurrency.max(1).min(claimed.len());
        let mut handles = Vec::with_capacity(pool_size);

        for pool_index in 0..pool_size {
            let work = work.clone();
            let outcomes = outcomes.clone();
            let ctx = self.ctx.clone();
            let timeout = self.config.translate_timeout;
            let worker_id = self.config.worker_id.clone();

            handles.push(tokio::spawn(async move {
                loop {
                    let job_id = {
                        let mut queue = work.lock().await;
                        queue.pop_front()
                    };
                    let Some(job_id) = job_id else {
                        break;
                    };

                    tracing::debug!(
                        "Worker {} pool task {} processing job {}",
                        worker_id,
                        pool_index,
                        job_id
                    );
                    let outcome = process_job(&ctx, &job_id, timeout).await;
                    outcomes.insert(job_id, outcome);
                }
            }));
        }

        for handle in handles {
            if let Err(err) = handle.await {
                tracing::warn!(
                    "Worker {} pool task died: {} (its in-flight job stays claimed until reclaim)",
                    self.config.worker_id,
                    err
                );
            }
        }

        outcomes
    }

    /// Commit phase: apply the terminal transitions for every job this
    /// worker still owns. Jobs reclaimed mid-run are dropped from the
    /// mutation set on each retry round, so a stale result is never written
    /// over a reassigned job.
    async fn commit_outcomes(
        &self,
        claimed: usize,
        outcomes: Arc<DashMap<String, JobOutcome>>,
    ) -> Result<BatchReport> {
        let worker_id = self.config.worker_id.clone();

        let committed = commit_with_retry(self.ctx.store.as_ref(), &self.ctx.policy, |snapshot| {
            outcomes
                .iter()
                .filter_map(|entry| {
                    let job_id = entry.key();
                    let still_ours = snapshot.job(job_id).is_some_and(|job| {
                        job.status == JobStatus::InProgress
                            && job.claimed_by.as_deref() == Some(worker_id.as_str())
                    });
                    if !still_ours {
                        tracing::debug!(
                            "Job {} no longer claimed by {}, discarding local result",
                            job_id,
                            worker_id
                        );
                        return None;
                    }
                    Some(match entry.value() {
                        JobOutcome::Completed { result_ref } => JobMutation::Complete {
                            id: job_id.clone(),
                            result_ref: result_ref.clone(),
                        },
                        JobOutcome::Flagged {
                            result_ref,
                            reasons,
                        } => JobMutation::Flag {
                            id: job_id.clone(),
                            result_ref: result_ref.clone(),
                            reasons: reasons.clone(),
                        },
                        JobOutcome::Failed { error } => JobMutation::Fail {
                            id: job_id.clone(),
                            error: error.clone(),
                        },
                    })
                })
                .collect()
        })
        .await
        .with_context(|| format!("worker {} could not commit batch outcomes", worker_id))?;

        let mut report = BatchReport {
            worker_id: self.config.worker_id.clone(),
            claimed,
            ..BatchReport::default()
        };

        let landed = committed.map(|outcome| outcome.mutations).unwrap_or_default();
        for mutation in &landed {
            match mutation {
                JobMutation::Complete { .. } => report.completed += 1,
                JobMutation::Flag { .. } => report.flagged += 1,
                JobMutation::Fail { .. } => report.failed += 1,
                _ => {}
            }
        }

        let discarded = outcomes.len() - landed.len();
        if discarded > 0 {
            tracing::warn!(
                "Worker {} discarded {} result(s) for jobs reclaimed mid-run",
                self.config.worker_id,
                discarded
            );
        }

        tracing::info!(
            "Worker {} finished batch: {} completed, {} flagged, {} failed",
            report.worker_id,
            report.completed,
            report.flagged,
            report.failed
        );
        Ok(report)
    }
}

/// Processes one claimed job end to end. Every failure path collapses into
/// a `Failed` outcome; nothing here aborts the batch.
async fn process_job(ctx: &WorkerContext, job_id: &str, timeout: Duration) -> JobOutcome {
    let source = match ctx.sources.load(job_id) {
        Ok(source) => source,
        Err(err) => {
            tracing::error!("Job {}: source document unavailable: {:#}", job_id, err);
            return JobOutcome::Failed {
                error: format!("source document unavailable: {:#}", err),
            };
        }
    };

    let translated = match tokio::time::timeout(timeout, ctx.translator.translate(&source)).await
    {
        Ok(Ok(translated)) => translated,
        Ok(Err(err)) => {
            tracing::warn!("Job {}: translation failed: {:#}", job_id, err);
            return JobOutcome::Failed {
                error: format!("translation failed: {:#}", err),
            };
        }
        Err(_) => {
            tracing::warn!("Job {}: translation timed out after {:?}", job_id, timeout);
            return JobOutcome::Failed {
                error: format!("translation timed out after {:?}", timeout),
            };
        }
    };

    match ctx.gate.evaluate(&translated) {
        QaVerdict::Pass => match ctx.artifacts.put(Shelf::Approved, &translated) {
            Ok(result_ref) => JobOutcome::Completed { result_ref },
            Err(err) => JobOutcome::Failed {
                error: format!("storing approved artifact: {:#}", err),
            },
        },
        QaVerdict::Flagged(reasons) => {
            let reasons: Vec<String> = reasons.iter().map(|reason| reason.to_string()).collect();
            tracing::info!("Job {} flagged by QA: {}", job_id, reasons.join("; "));
            match ctx.artifacts.put(Shelf::Flagged, &translated) {
                Ok(result_ref) => JobOutcome::Flagged {
                    result_ref,
                    reasons,
                },
                Err(err) => JobOutcome::Failed {
                    error: format!("storing flagged artifact: {:#}", err),
                },
            }
        }
    }
}
