//! Distributed Job Queue Module
//!
//! This module implements the coordination core of the translation pipeline: a
//! versioned job queue shared by many independent, short-lived worker
//! processes that have no channel to each other besides the queue document
//! itself.
//!
//! ## Architecture Overview
//! The queue follows an **optimistic concurrency** model:
//! 1. **Fetch**: A writer reads the latest committed snapshot of the queue
//!    document, including its `version` counter.
//! 2. **Mutate**: The writer decides on a set of per-job state transitions
//!    (claims, terminal results, releases) valid against that snapshot.
//! 3. **Commit**: The store applies the transitions atomically, but only if
//!    the writer's observed version is still current. A stale writer gets a
//!    `Conflict` and must re-fetch, re-validate its transitions, and retry.
//!
//! There is no lock server and no broker; the compare-and-swap commit is the
//! only mutual-exclusion mechanism in the system.
//!
//! ## Submodules
//! - **`types`**: The job/queue data model and the closed set of state
//!   transitions a commit may carry.
//! - **`store`**: The `QueueStore` contract, error taxonomy, and the shared
//!   conflict-retry discipline (`commit_with_retry`).
//! - **`file`**: The file-backed store adapter (one JSON document, lockfile +
//!   atomic rename).
//! - **`memory`**: An in-memory adapter with the same contract, for tests and
//!   embedding.
//! - **`ops`**: Operator-facing queue administration (init, listing, retries).
//! - **`reclaim`**: The stuck-job reclaimer that returns abandoned claims to
//!   the pending pool.

pub mod types;
pub mod store;
pub mod file;
pub mod memory;
pub mod ops;
pub mod reclaim;
