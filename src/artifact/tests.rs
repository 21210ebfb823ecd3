//! Artifact Store Tests
//!
//! ## Test Scopes
//! - **FileArtifacts**: Shelf layout, returned `result_ref`, and overwrite
//!   semantics (re-runs rewrite the same file).
//! - **MemoryArtifacts**: The in-memory stand-in honors the same contract.

#[cfg(test)]
mod tests {
    use crate::artifact::{ArtifactStore, FileArtifacts, MemoryArtifacts, Shelf};
    use crate::translate::types::TranslatedDocument;
    use std::path::Path;

    fn translated(doc_id: &str, body: &str) -> TranslatedDocument {
        TranslatedDocument {
            doc_id: doc_id.to_string(),
            title: "A title".to_string(),
            abstract_text: "An abstract.".to_string(),
            body: body.to_string(),
            engine: Some("engine-v2".to_string()),
        }
    }

    // ============================================================
    // TEST 1: Shelf layout
    // ============================================================

    #[test]
    fn test_artifacts_land_on_their_shelf() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileArtifacts::new(dir.path());

        let approved_ref = store.put(Shelf::Approved, &translated("doc-1", "ok")).unwrap();
        let flagged_ref = store.put(Shelf::Flagged, &translated("doc-2", "meh")).unwrap();

        assert!(Path::new(&approved_ref).exists());
        assert!(Path::new(&flagged_ref).exists());
        assert!(approved_ref.contains("approved"));
        assert!(flagged_ref.contains("flagged"));
        assert!(dir.path().join("approved").join("doc-1.json").exists());
        assert!(dir.path().join("flagged").join("doc-2.json").exists());
    }

    // ============================================================
    // TEST 2: Overwrite by job id
    // ============================================================

    #[test]
    fn test_rerun_overwrites_the_same_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileArtifacts::new(dir.path());

        let first_ref = store.put(Shelf::Approved, &translated("doc-1", "first")).unwrap();
        let second_ref = store.put(Shelf::Approved, &translated("doc-1", "second")).unwrap();
        assert_eq!(first_ref, second_ref);

        let raw = std::fs::read_to_string(&second_ref).unwrap();
        let stored: TranslatedDocument = serde_json::from_str(&raw).unwrap();
        assert_eq!(stored.body, "second");
    }

    // ============================================================
    // TEST 3: In-memory contract
    // ============================================================

    #[test]
    fn test_memory_artifacts_put_and_get() {
        let store = MemoryArtifacts::new();
        assert!(store.is_empty());

        let result_ref = store.put(Shelf::Flagged, &translated("doc-3", "text")).unwrap();
        assert_eq!(result_ref, "flagged/doc-3");
        assert_eq!(store.len(), 1);

        let stored = store.get(&result_ref).expect("artifact should be stored");
        assert_eq!(stored.doc_id, "doc-3");
        assert!(store.get("approved/doc-3").is_none());
    }
}
