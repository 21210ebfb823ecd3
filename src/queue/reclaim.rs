//! Stuck-Job Reclaimer
//!
//! A worker that is killed mid-batch leaves its claims `in_progress`
//! forever; nothing else in the system will touch them. The reclaimer is the
//! sole progress guarantee for that case: it scans claim ages and returns
//! expired claims to the pending pool.
//!
//! Reclaiming goes through the same compare-and-swap commit as claiming, so
//! when a job is simultaneously eligible for claim and for reclaim, whichever
//! commit lands first wins and the loser re-validates. There is no separate
//! precedence rule.

use super::store::{commit_with_retry, CommitPolicy, QueueStore, StoreError};
use super::types::{now_ms, JobMutation, JobStatus};
use std::sync::Arc;
use std::time::Duration;

/// Scans for claims older than a timeout and releases them.
pub struct Reclaimer {
    store: Arc<dyn QueueStore>,
    policy: CommitPolicy,
}

impl Reclaimer {
    pub fn new(store: Arc<dyn QueueStore>, policy: CommitPolicy) -> Self {
        Self { store, policy }
    }

    /// Releases every `in_progress` job whose claim is older than `timeout`,
    /// clearing the claim and leaving `attempts` untouched. A reclaim is not
    /// a failed attempt; the worker may be slow rather than wrong.
    ///
    /// Idempotent: a second run with no new claims in between releases
    /// nothing. Returns the number of jobs reclaimed.
    pub async fn reclaim(&self, timeout: Duration) -> Result<usize, StoreError> {
        let timeout_ms = timeout.as_millis() as u64;

        let outcome = commit_with_retry(self.store.as_ref(), &self.policy, |snapshot| {
            let now = now_ms();
            snapshot
                .jobs
                .iter()
                .filter(|job| {
                    job.status == JobStatus::InProgress
                        && job
                            .claimed_at
                            .map(|at| now.saturating_sub(at) > timeout_ms)
                            .unwrap_or(true)
                })
                .map(|job| JobMutation::Release { id: job.id.clone() })
                .collect()
        })
        .await?;

        let reclaimed = outcome.map(|outcome| outcome.mutations.len()).unwrap_or(0);
        if reclaimed > 0 {
            tracing::info!("Reclaimed {} stuck job(s)", reclaimed);
        } else {
            tracing::debug!("No stuck jobs past the {:?} timeout", timeout);
        }
        Ok(reclaimed)
    }
}
