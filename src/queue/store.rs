//! Queue Store Contract
//!
//! The `QueueStore` trait is the only way queue state is read or mutated.
//! Workers hold transient, possibly-stale snapshots between `fetch` and
//! `commit`; the store enforces that only one commit per version succeeds,
//! which makes job claims mutually exclusive without a lock server.
//!
//! ## Responsibilities
//! - **Contract**: `fetch` / `commit(expected_version)` / `stats`.
//! - **Error taxonomy**: `Conflict` is the one transient error callers retry
//!   on; everything else aborts the current operation.
//! - **Retry discipline**: `commit_with_retry` is the single conflict-retry
//!   path used by claims, terminal commits, reclaims, and operator retries,
//!   so "last valid commit wins" holds uniformly across writers.

use super::types::{JobMutation, QueueDocument, QueueStats};
use rand::Rng;
use std::time::Duration;
use thiserror::Error;

/// Errors surfaced by queue store adapters and the commit-retry path.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Another writer committed first; re-fetch and re-validate.
    #[error("commit conflict: expected version {expected}, store is at {actual}")]
    Conflict { expected: u64, actual: u64 },

    /// A mutation's precondition did not hold; the whole commit is rejected.
    #[error("invalid transition for job {id}: {reason}")]
    InvalidTransition { id: String, reason: String },

    /// A mutation referenced a job id the queue does not contain.
    #[error("unknown job {id}")]
    UnknownJob { id: String },

    /// The conflict-retry bound was exhausted without landing a commit.
    #[error("commit still conflicting after {attempts} attempts")]
    RetriesExhausted { attempts: usize },

    /// The persisted queue document could not be parsed.
    #[error("queue document corrupt: {0}")]
    Corrupt(String),

    /// The store could not be reached or locked.
    #[error("queue store unavailable: {0}")]
    Unavailable(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// The single source of truth for job state.
///
/// Adapters must apply a commit's mutations all-or-nothing and reject any
/// commit whose `expected_version` is stale. Any storage mechanism honoring
/// this contract is conformant.
pub trait QueueStore: Send + Sync {
    /// Returns the latest committed snapshot.
    fn fetch(&self) -> Result<QueueDocument, StoreError>;

    /// Applies `mutations` atomically as a whole and returns the new
    /// version. Fails with [`StoreError::Conflict`] if another writer
    /// committed after the caller's snapshot was taken.
    fn commit(&self, mutations: &[JobMutation], expected_version: u64)
        -> Result<u64, StoreError>;

    /// Counts jobs by status.
    fn stats(&self) -> Result<QueueStats, StoreError> {
        Ok(self.fetch()?.stats())
    }
}

/// Conflict-retry policy for the commit path.
///
/// The bound and backoff shape are policy, not constants: operators tune
/// them per deployment (many concurrent workers want a higher bound and a
/// wider backoff).
#[derive(Debug, Clone)]
pub struct CommitPolicy {
    /// Maximum fetch-build-commit rounds before giving up.
    pub max_attempts: usize,
    /// Backoff after the first conflict; doubles per round.
    pub backoff_base: Duration,
    /// Upper bound on a single backoff sleep.
    pub backoff_cap: Duration,
}

impl Default for CommitPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            backoff_base: Duration::from_millis(150),
            backoff_cap: Duration::from_secs(5),
        }
    }
}

impl CommitPolicy {
    /// Backoff for the given zero-based conflict round, with random jitter
    /// to de-synchronize workers that conflicted on the same version.
    fn backoff(&self, round: usize) -> Duration {
        let exp = u32::try_from(round).unwrap_or(u32::MAX).min(16);
        let base = self
            .backoff_base
            .saturating_mul(2u32.saturating_pow(exp))
            .min(self.backoff_cap);
        let jitter_ms = rand::thread_rng().gen_range(0..=base.as_millis().max(1) as u64 / 2);
        base + Duration::from_millis(jitter_ms)
    }
}

/// Outcome of a successful [`commit_with_retry`] round.
#[derive(Debug, Clone)]
pub struct CommitOutcome {
    /// Version the store advanced to.
    pub version: u64,
    /// The mutation set that actually landed.
    pub mutations: Vec<JobMutation>,
}

/// Runs the optimistic fetch-build-commit loop.
///
/// `build` receives the freshest snapshot on every round and must return the
/// mutation set that is valid against exactly that snapshot; intents that no
/// longer hold (a job reassigned in the interim) are for `build` to drop, not
/// for the store to force. An empty mutation set short-circuits as a no-op
/// `Ok(None)`.
pub async fn commit_with_retry<F>(
    store: &dyn QueueStore,
    policy: &CommitPolicy,
    mut build: F,
) -> Result<Option<CommitOutcome>, StoreError>
where
    F: FnMut(&QueueDocument) -> Vec<JobMutation>,
{
    for round in 0..policy.max_attempts {
        let snapshot = store.fetch()?;
        let mutations = build(&snapshot);
        if mutations.is_empty() {
            return Ok(None);
        }

        match store.commit(&mutations, snapshot.version) {
            Ok(version) => {
                return Ok(Some(CommitOutcome { version, mutations }));
            }
            Err(StoreError::Conflict { expected, actual }) => {
                tracing::debug!(
                    "Commit conflict at version {} (store at {}), round {}/{}",
                    expected,
                    actual,
                    round + 1,
                    policy.max_attempts
                );
                if round + 1 < policy.max_attempts {
                    tokio::time::sleep(policy.backoff(round)).await;
                }
            }
            Err(other) => return Err(other),
        }
    }

    Err(StoreError::RetriesExhausted {
        attempts: policy.max_attempts,
    })
}
