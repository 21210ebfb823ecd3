//! File-Backed Store Adapter
//!
//! Persists the queue as one JSON document on shared storage. This is the
//! production adapter: independent worker processes on different hosts
//! coordinate through nothing but this file.
//!
//! ## Commit protocol
//! 1. Acquire the sibling lockfile (`queue.json.lock`, `create_new`), with
//!    bounded waiting and stale-lock takeover.
//! 2. Re-read the document and compare versions; a stale `expected_version`
//!    is a `Conflict`, surfaced to the caller's retry loop.
//! 3. Apply the mutation batch to a scratch copy, bump the version, write to
//!    a temp file, and atomically rename over the document.
//!
//! A committer that dies mid-write leaves either the old document or the new
//! one, never a torn file; a committer that dies holding the lock is healed
//! by the stale-lock takeover.

use super::store::{QueueStore, StoreError};
use super::types::{JobMutation, QueueDocument};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

const LOCK_WAIT: Duration = Duration::from_millis(25);
const LOCK_WAIT_ROUNDS: usize = 200;
const LOCK_STALE_AFTER: Duration = Duration::from_secs(30);

/// Queue store persisted as a single versioned JSON document.
pub struct FileStore {
    path: PathBuf,
    lock_path: PathBuf,
}

impl FileStore {
    /// Creates a handle for the queue document at `path`. The document is
    /// not touched until the first operation.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut lock_name = path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_else(|| "queue.json".into());
        lock_name.push(".lock");
        let lock_path = path.with_file_name(lock_name);
        Self { path, lock_path }
    }

    /// Writes an empty document at version zero if none exists yet.
    /// Returns `true` if this call created it.
    pub fn ensure_initialized(&self) -> Result<bool, StoreError> {
        if self.path.exists() {
            return Ok(false);
        }
        let _guard = LockGuard::acquire(&self.lock_path)?;
        if self.path.exists() {
            return Ok(false);
        }
        write_document(&self.path, &QueueDocument::empty())?;
        tracing::info!("Initialized empty queue document at {:?}", self.path);
        Ok(true)
    }

    fn read_document(&self) -> Result<QueueDocument, StoreError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::Unavailable(format!(
                    "queue document not found at {:?} (run `init` first)",
                    self.path
                )));
            }
            Err(err) => return Err(err.into()),
        };
        serde_json::from_str(&raw).map_err(|err| StoreError::Corrupt(err.to_string()))
    }
}

impl QueueStore for FileStore {
    fn fetch(&self) -> Result<QueueDocument, StoreError> {
        self.read_document()
    }

    fn commit(
        &self,
        mutations: &[JobMutation],
        expected_version: u64,
    ) -> Result<u64, StoreError> {
        let _guard = LockGuard::acquire(&self.lock_path)?;

        let current = self.read_document()?;
        if current.version != expected_version {
            return Err(StoreError::Conflict {
                expected: expected_version,
                actual: current.version,
            });
        }

        let mut next = current;
        next.apply(mutations)?;
        next.version += 1;
        write_document(&self.path, &next)?;

        tracing::debug!(
            "Committed {} mutation(s), queue at version {}",
            mutations.len(),
            next.version
        );
        Ok(next.version)
    }
}

fn write_document(path: &Path, document: &QueueDocument) -> Result<(), StoreError> {
    let serialized = serde_json::to_string_pretty(document)
        .map_err(|err| StoreError::Corrupt(err.to_string()))?;
    let tmp_path = path.with_extension("json.tmp");
    {
        let mut tmp = fs::File::create(&tmp_path)?;
        tmp.write_all(serialized.as_bytes())?;
        tmp.sync_all()?;
    }
    fs::rename(&tmp_path, path)?;
    Ok(())
}

/// Exclusive advisory lock held for the duration of one commit.
struct LockGuard {
    path: PathBuf,
}

impl LockGuard {
    fn acquire(path: &Path) -> Result<Self, StoreError> {
        for _ in 0..LOCK_WAIT_ROUNDS {
            match fs::OpenOptions::new().write(true).create_new(true).open(path) {
                Ok(mut file) => {
                    // Contents are diagnostic only; exclusivity comes from create_new.
                    let _ = write!(file, "{}", std::process::id());
                    return Ok(Self {
                        path: path.to_path_buf(),
                    });
                }
                Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => {
                    if lock_is_stale(path) {
                        tracing::warn!("Taking over stale queue lock at {:?}", path);
                        let _ = fs::remove_file(path);
                        continue;
                    }
                    std::thread::sleep(LOCK_WAIT);
                }
                Err(err) => return Err(err.into()),
            }
        }
        Err(StoreError::Unavailable(format!(
            "could not acquire queue lock at {:?}",
            path
        )))
    }
}

fn lock_is_stale(path: &Path) -> bool {
    let Ok(metadata) = fs::metadata(path) else {
        return false;
    };
    let Ok(modified) = metadata.modified() else {
        return false;
    };
    match modified.elapsed() {
        Ok(age) => age > LOCK_STALE_AFTER,
        Err(_) => false,
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.path);
    }
}
