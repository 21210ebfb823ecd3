//! Queue Data Model
//!
//! Defines the job record, the versioned queue document that is the single
//! source of truth for job state, and the closed set of state transitions a
//! commit may carry.

use super::store::StoreError;
use serde::{Deserialize, Serialize};

/// Lifecycle state of a translation job.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    /// Waiting to be claimed by a worker.
    Pending,
    /// Claimed by a worker; `claimed_by`/`claimed_at` are set while here.
    InProgress,
    /// Translated and accepted by the quality gate. Terminal.
    Completed,
    /// Translated but rejected by the quality gate. Terminal but reviewable;
    /// the triggered rules are recorded in `last_error`.
    QaFlagged,
    /// The translator failed for this job. Returns to the pool only through
    /// an explicit operator retry.
    Failed,
}

/// One unit of translatable work tracked by the queue.
///
/// The `id` equals the source document id, so re-initializing the queue from
/// the same source set never creates duplicate jobs. A job is created once,
/// at queue initialization, and never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    /// Stable unique identifier, derived from the source document id.
    pub id: String,
    /// Current lifecycle state.
    pub status: JobStatus,
    /// Number of successful claim commits for this job. Never reset.
    pub attempts: u32,
    /// Worker currently holding the job, while `InProgress`.
    pub claimed_by: Option<String>,
    /// Timestamp (unix ms) of the last claim; the reclaimer compares this
    /// against its timeout.
    pub claimed_at: Option<u64>,
    /// Artifact location once `Completed` or `QaFlagged`.
    pub result_ref: Option<String>,
    /// Last failure reason or accumulated QA reasons.
    pub last_error: Option<String>,
    /// Timestamp (unix ms) when the job was created.
    pub created_at: u64,
}

impl Job {
    /// Creates a fresh pending job for a source document.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            status: JobStatus::Pending,
            attempts: 0,
            claimed_by: None,
            claimed_at: None,
            result_ref: None,
            last_error: None,
            created_at: now_ms(),
        }
    }
}

/// The full queue state as persisted by a store adapter.
///
/// Jobs keep their insertion order; batch selection walks this order, which
/// makes selection deterministic and reproducible for a given snapshot.
/// `version` increments by exactly one per committed mutation batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueDocument {
    /// Monotonically increasing commit counter.
    pub version: u64,
    /// All jobs, in insertion order. Ids are unique.
    pub jobs: Vec<Job>,
}

impl QueueDocument {
    /// An empty queue at version zero.
    pub fn empty() -> Self {
        Self {
            version: 0,
            jobs: Vec::new(),
        }
    }

    /// Looks up a job by id.
    pub fn job(&self, id: &str) -> Option<&Job> {
        self.jobs.iter().find(|job| job.id == id)
    }

    fn job_mut(&mut self, id: &str) -> Result<&mut Job, StoreError> {
        self.jobs
            .iter_mut()
            .find(|job| job.id == id)
            .ok_or_else(|| StoreError::UnknownJob { id: id.to_string() })
    }

    /// Applies a batch of transitions in order, failing on the first invalid
    /// one.
    ///
    /// Callers that need all-or-nothing semantics (every store adapter)
    /// must apply against a scratch copy and only publish on success.
    pub fn apply(&mut self, mutations: &[JobMutation]) -> Result<(), StoreError> {
        for mutation in mutations {
            self.apply_one(mutation)?;
        }
        Ok(())
    }

    fn apply_one(&mut self, mutation: &JobMutation) -> Result<(), StoreError> {
        match mutation {
            JobMutation::Create { id, now } => {
                if self.job(id).is_some() {
                    return Err(StoreError::InvalidTransition {
                        id: id.clone(),
                        reason: "job already exists".to_string(),
                    });
                }
                let mut job = Job::new(id.clone());
                job.created_at = *now;
                self.jobs.push(job);
            }
            JobMutation::Claim { id, worker, now } => {
                let job = self.job_mut(id)?;
                expect_status(job, &[JobStatus::Pending], "claim")?;
                job.status = JobStatus::InProgress;
                job.attempts += 1;
                job.claimed_by = Some(worker.clone());
                job.claimed_at = Some(*now);
            }
            JobMutation::Complete { id, result_ref } => {
                let job = self.job_mut(id)?;
                expect_status(job, &[JobStatus::InProgress], "complete")?;
                job.status = JobStatus::Completed;
                job.result_ref = Some(result_ref.clone());
                job.claimed_by = None;
                job.claimed_at = None;
            }
            JobMutation::Flag {
                id,
                result_ref,
                reasons,
            } => {
                let job = self.job_mut(id)?;
                expect_status(job, &[JobStatus::InProgress], "flag")?;
                job.status = JobStatus::QaFlagged;
                job.result_ref = Some(result_ref.clone());
                job.last_error = Some(reasons.join("; "));
                job.claimed_by = None;
                job.claimed_at = None;
            }
            JobMutation::Fail { id, error } => {
                let job = self.job_mut(id)?;
                expect_status(job, &[JobStatus::InProgress], "fail")?;
                job.status = JobStatus::Failed;
                job.last_error = Some(error.clone());
                job.claimed_by = None;
                job.claimed_at = None;
            }
            JobMutation::Release { id } => {
                let job = self.job_mut(id)?;
                expect_status(job, &[JobStatus::InProgress], "release")?;
                job.status = JobStatus::Pending;
                job.claimed_by = None;
                job.claimed_at = None;
            }
            JobMutation::Requeue { id } => {
                let job = self.job_mut(id)?;
                expect_status(job, &[JobStatus::Failed, JobStatus::QaFlagged], "requeue")?;
                job.status = JobStatus::Pending;
                job.claimed_by = None;
                job.claimed_at = None;
                job.result_ref = None;
            }
        }
        Ok(())
    }

    /// Counts jobs per status.
    pub fn stats(&self) -> QueueStats {
        let mut stats = QueueStats::default();
        for job in &self.jobs {
            match job.status {
                JobStatus::Pending => stats.pending += 1,
                JobStatus::InProgress => stats.in_progress += 1,
                JobStatus::Completed => stats.completed += 1,
                JobStatus::QaFlagged => stats.qa_flagged += 1,
                JobStatus::Failed => stats.failed += 1,
            }
        }
        stats.total = self.jobs.len();
        stats
    }
}

/// Per-status job counts reported by `QueueStore::stats`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct QueueStats {
    pub pending: usize,
    pub in_progress: usize,
    pub completed: usize,
    pub qa_flagged: usize,
    pub failed: usize,
    pub total: usize,
}

/// A single per-job state transition.
///
/// Commits carry a batch of these; the store applies the batch atomically as
/// a whole. Any transition whose precondition does not hold fails the whole
/// commit, so a writer can never half-apply its intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobMutation {
    /// Appends a fresh `pending` job. Only queue initialization issues this;
    /// the id must not already exist.
    Create { id: String, now: u64 },
    /// `pending -> in_progress`, incrementing `attempts`.
    Claim {
        id: String,
        worker: String,
        now: u64,
    },
    /// `in_progress -> completed` with the approved artifact location.
    Complete { id: String, result_ref: String },
    /// `in_progress -> qa_flagged` with the flagged artifact location and
    /// the triggered rule descriptions.
    Flag {
        id: String,
        result_ref: String,
        reasons: Vec<String>,
    },
    /// `in_progress -> failed` with the translator error.
    Fail { id: String, error: String },
    /// `in_progress -> pending`, clearing the claim. `attempts` unchanged;
    /// a reclaim is not a failed attempt.
    Release { id: String },
    /// `failed | qa_flagged -> pending`, preserving `attempts`. Operator
    /// retry path.
    Requeue { id: String },
}

impl JobMutation {
    /// The id of the job this transition targets.
    pub fn job_id(&self) -> &str {
        match self {
            JobMutation::Create { id, .. }
            | JobMutation::Claim { id, .. }
            | JobMutation::Complete { id, .. }
            | JobMutation::Flag { id, .. }
            | JobMutation::Fail { id, .. }
            | JobMutation::Release { id }
            | JobMutation::Requeue { id } => id,
        }
    }
}

fn expect_status(job: &Job, allowed: &[JobStatus], op: &str) -> Result<(), StoreError> {
    if allowed.contains(&job.status) {
        Ok(())
    } else {
        Err(StoreError::InvalidTransition {
            id: job.id.clone(),
            reason: format!("cannot {} job in status {:?}", op, job.status),
        })
    }
}

/// Helper to get the current system time in milliseconds.
pub fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_millis() as u64
}
