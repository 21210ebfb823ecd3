//! Artifact Storage
//!
//! One JSON file per job id, under the shelf matching the gate verdict.

use crate::translate::types::TranslatedDocument;
use anyhow::{Context, Result};
use dashmap::DashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Which output location an artifact belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shelf {
    /// Passed the quality gate; publishable.
    Approved,
    /// Flagged by the quality gate; held for review.
    Flagged,
}

impl Shelf {
    pub fn dir_name(&self) -> &'static str {
        match self {
            Shelf::Approved => "approved",
            Shelf::Flagged => "flagged",
        }
    }
}

/// Durable storage for translation output.
pub trait ArtifactStore: Send + Sync {
    /// Writes the document under the given shelf, keyed by its id, and
    /// returns a reference the queue records as `result_ref`. Overwrites any
    /// previous artifact for the same id.
    fn put(&self, shelf: Shelf, doc: &TranslatedDocument) -> Result<String>;
}

/// Work-root artifact directories (`approved/`, `flagged/`).
pub struct FileArtifacts {
    root: PathBuf,
}

impl FileArtifacts {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn shelf_path(&self, shelf: Shelf, doc_id: &str) -> PathBuf {
        self.root
            .join(shelf.dir_name())
            .join(format!("{}.json", doc_id))
    }
}

impl ArtifactStore for FileArtifacts {
    fn put(&self, shelf: Shelf, doc: &TranslatedDocument) -> Result<String> {
        let path = self.shelf_path(shelf, &doc.doc_id);
        let dir = path.parent().unwrap_or(Path::new("."));
        fs::create_dir_all(dir)?;

        let serialized = serde_json::to_string_pretty(doc)?;
        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, serialized)
            .with_context(|| format!("writing artifact {:?}", tmp_path))?;
        fs::rename(&tmp_path, &path)?;

        tracing::debug!("Stored {} artifact for {}", shelf.dir_name(), doc.doc_id);
        Ok(path.to_string_lossy().into_owned())
    }
}

/// In-memory artifact store for tests and embedding.
pub struct MemoryArtifacts {
    entries: DashMap<String, TranslatedDocument>,
}

impl MemoryArtifacts {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Fetches a stored artifact by its `result_ref`.
    pub fn get(&self, result_ref: &str) -> Option<TranslatedDocument> {
        self.entries.get(result_ref).map(|entry| entry.clone())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for MemoryArtifacts {
    fn default() -> Self {
        Self::new()
    }
}

impl ArtifactStore for MemoryArtifacts {
    fn put(&self, shelf: Shelf, doc: &TranslatedDocument) -> Result<String> {
        let result_ref = format!("{}/{}", shelf.dir_name(), doc.doc_id);
        self.entries.insert(result_ref.clone(), doc.clone());
        Ok(result_ref)
    }
}
