//! Source Document Repository
//!
//! The work root keeps one JSON `SourceDocument` per file under `sources/`.
//! Queue initialization scans this directory; workers load individual
//! documents by job id at process time, so the coordination document itself
//! never carries document content.

use super::types::SourceDocument;
use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Repository of source documents under a work root.
pub struct SourceStore {
    dir: PathBuf,
}

impl SourceStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Lists all document ids in the repository, sorted by file name.
    ///
    /// The sort gives queue initialization a stable insertion order, which
    /// in turn makes batch selection reproducible across re-initializations.
    pub fn scan_ids(&self) -> Result<Vec<String>> {
        let entries = fs::read_dir(&self.dir)
            .with_context(|| format!("reading source directory {:?}", self.dir))?;

        let mut names: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .filter_map(|entry| {
                let path = entry.path();
                if path.extension().and_then(|ext| ext.to_str()) == Some("json") {
                    path.file_stem()
                        .and_then(|stem| stem.to_str())
                        .map(|stem| stem.to_string())
                } else {
                    None
                }
            })
            .collect();
        names.sort();
        Ok(names)
    }

    /// Loads the source document for a job id.
    pub fn load(&self, doc_id: &str) -> Result<SourceDocument> {
        let path = self.doc_path(doc_id);
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("reading source document {:?}", path))?;
        let doc: SourceDocument = serde_json::from_str(&raw)
            .with_context(|| format!("parsing source document {:?}", path))?;
        Ok(doc)
    }

    /// Writes a source document, creating the directory on first use.
    /// Harvest tooling feeds the repository through this.
    pub fn save(&self, doc: &SourceDocument) -> Result<()> {
        fs::create_dir_all(&self.dir)?;
        let path = self.doc_path(&doc.doc_id);
        let serialized = serde_json::to_string_pretty(doc)?;
        fs::write(&path, serialized)
            .with_context(|| format!("writing source document {:?}", path))?;
        Ok(())
    }

    fn doc_path(&self, doc_id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", doc_id))
    }
}

/// Conventional work-root layout shared by the CLI commands.
pub fn sources_dir(root: &Path) -> PathBuf {
    root.join("sources")
}
