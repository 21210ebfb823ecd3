//! Batch Worker Module
//!
//! This module drives the actual work: claiming a bounded slice of pending
//! jobs, translating them through a bounded-concurrency pool, gating each
//! result, and committing outcomes back to the queue.
//!
//! ## Architecture Overview
//! A batch run has three phases:
//! 1. **Claim**: select pending jobs in queue order and commit them to
//!    `in_progress` under this worker's id. The optimistic commit is what
//!    keeps two concurrent workers from claiming the same job.
//! 2. **Process**: a pool of worker tasks pulls claimed jobs from a shared
//!    deque; each job independently loads its source, calls the translator
//!    under a timeout, runs the quality gate, and writes its artifact. One
//!    job's failure never touches its siblings.
//! 3. **Commit**: the per-job terminal transitions land in one optimistic
//!    commit. A job reclaimed mid-run has its local result discarded, never
//!    forced onto the now-differently-owned job.
//!
//! If the process dies at any point, uncommitted claims stay `in_progress`
//! and the reclaimer returns them to the pool; there is no graceful-flush
//! requirement.
//!
//! ## Submodules
//! - **`batch`**: One batch run, start to finish.
//! - **`orchestrator`**: Sequences repeated batch runs until the queue is
//!   drained or a budget is exhausted.

pub mod batch;
pub mod orchestrator;
