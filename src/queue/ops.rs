//! Queue Administration
//!
//! Operator-facing operations on the queue: initialization from a source
//! set, listings for review, and the explicit retry paths that return
//! terminal jobs to the pending pool. All writes go through the same
//! optimistic commit discipline as the workers.

use super::store::{commit_with_retry, CommitPolicy, QueueStore, StoreError};
use super::types::{now_ms, Job, JobMutation, JobStatus};

/// Appends pending jobs for every source document id not already tracked.
///
/// Job ids equal document ids, so re-running initialization against the same
/// source set is a no-op; a grown source set only appends the new ids, in
/// the caller-provided order. Returns the number of jobs created.
pub async fn init_queue(
    store: &dyn QueueStore,
    policy: &CommitPolicy,
    doc_ids: &[String],
) -> Result<usize, StoreError> {
    let outcome = commit_with_retry(store, policy, |snapshot| {
        let now = now_ms();
        doc_ids
            .iter()
            .filter(|id| snapshot.job(id).is_none())
            .map(|id| JobMutation::Create {
                id: id.clone(),
                now,
            })
            .collect()
    })
    .await?;

    let created = outcome.map(|outcome| outcome.mutations.len()).unwrap_or(0);
    tracing::info!("Queue initialization created {} job(s)", created);
    Ok(created)
}

/// Returns all jobs currently in `status`, in queue order.
pub fn list_by_status(
    store: &dyn QueueStore,
    status: JobStatus,
) -> Result<Vec<Job>, StoreError> {
    let snapshot = store.fetch()?;
    Ok(snapshot
        .jobs
        .into_iter()
        .filter(|job| job.status == status)
        .collect())
}

/// Returns every `failed` job to `pending`, preserving `attempts`.
/// Returns the number of jobs requeued.
pub async fn retry_failed(
    store: &dyn QueueStore,
    policy: &CommitPolicy,
) -> Result<usize, StoreError> {
    requeue_where(store, policy, JobStatus::Failed).await
}

/// Returns every `qa_flagged` job to `pending`, preserving `attempts`.
/// Used after thresholds are tuned or flagged output has been reviewed.
pub async fn retry_flagged(
    store: &dyn QueueStore,
    policy: &CommitPolicy,
) -> Result<usize, StoreError> {
    requeue_where(store, policy, JobStatus::QaFlagged).await
}

async fn requeue_where(
    store: &dyn QueueStore,
    policy: &CommitPolicy,
    status: JobStatus,
) -> Result<usize, StoreError> {
    let outcome = commit_with_retry(store, policy, |snapshot| {
        snapshot
            .jobs
            .iter()
            .filter(|job| job.status == status)
            .map(|job| JobMutation::Requeue { id: job.id.clone() })
            .collect()
    })
    .await?;

    let requeued = outcome.map(|outcome| outcome.mutations.len()).unwrap_or(0);
    tracing::info!("Requeued {} {:?} job(s)", requeued, status);
    Ok(requeued)
}
