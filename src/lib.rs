//! Translation Pipeline Coordination Library
//!
//! This library crate implements the batch-coordination engine that drives a
//! large document-translation backlog across many independent, short-lived
//! worker processes. The workers share no memory and no network connection
//! with each other; the only coordination medium is a versioned queue
//! document mutated through optimistic, conflict-checked commits.
//!
//! ## Architecture Modules
//! The system is composed of five loosely coupled subsystems:
//!
//! - **`queue`**: The job queue core. Owns the versioned queue document, the
//!   `QueueStore` contract with its compare-and-swap commit, the file-backed
//!   and in-memory adapters, operator administration, and the stuck-job
//!   reclaimer.
//! - **`translate`**: The translation boundary. Source/translated document
//!   types, the `Translator` interface, the HTTP engine client, and the
//!   source-document repository.
//! - **`qa`**: The quality gate, a pure pass/flag decision function applied
//!   to every translation before it counts as done.
//! - **`artifact`**: Durable output storage, split into approved and flagged
//!   locations keyed by job id.
//! - **`worker`**: The batch worker (claim, bounded-concurrency processing,
//!   outcome commit) and the orchestrator that sequences runs until the
//!   queue is drained.

pub mod artifact;
pub mod qa;
pub mod queue;
pub mod translate;
pub mod worker;
