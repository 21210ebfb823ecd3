//! In-Memory Store Adapter
//!
//! Mutex-guarded queue document with the same contract as the file adapter.
//! Used by unit tests and by embedders that drive the pipeline inside a
//! single process.

use super::store::{QueueStore, StoreError};
use super::types::{JobMutation, QueueDocument};
use std::sync::Mutex;

/// Queue store held entirely in process memory.
pub struct MemoryStore {
    document: Mutex<QueueDocument>,
}

impl MemoryStore {
    /// An empty queue at version zero.
    pub fn new() -> Self {
        Self {
            document: Mutex::new(QueueDocument::empty()),
        }
    }

    /// A store seeded with an existing document, e.g. a fixture.
    pub fn with_document(document: QueueDocument) -> Self {
        Self {
            document: Mutex::new(document),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, QueueDocument>, StoreError> {
        self.document
            .lock()
            .map_err(|_| StoreError::Unavailable("queue mutex poisoned".to_string()))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl QueueStore for MemoryStore {
    fn fetch(&self) -> Result<QueueDocument, StoreError> {
        Ok(self.lock()?.clone())
    }

    fn commit(
        &self,
        mutations: &[JobMutation],
        expected_version: u64,
    ) -> Result<u64, StoreError> {
        let mut current = self.lock()?;
        if current.version != expected_version {
            return Err(StoreError::Conflict {
                expected: expected_version,
                actual: current.version,
            });
        }

        // Apply on a scratch copy so a rejected mutation leaves no trace.
        let mut next = current.clone();
        next.apply(mutations)?;
        next.version += 1;
        *current = next;
        Ok(current.version)
    }
}
