//! Translation Module Tests
//!
//! ## Test Scopes
//! - **SourceStore**: Repository scan order, load/save mechanics, and the
//!   error paths workers turn into per-job failures.
//!
//! *Note: The HTTP client is exercised against a live engine in deployment
//! smoke tests; only the repository mechanics are covered here.*

#[cfg(test)]
mod tests {
    use crate::translate::source::SourceStore;
    use crate::translate::types::SourceDocument;

    fn source(doc_id: &str) -> SourceDocument {
        SourceDocument {
            doc_id: doc_id.to_string(),
            title: format!("Title {}", doc_id),
            abstract_text: "摘要内容".to_string(),
            body: "正文内容".to_string(),
            source_url: Some(format!("https://example.org/{}", doc_id)),
        }
    }

    // ============================================================
    // TEST 1: Save / load round trip
    // ============================================================

    #[test]
    fn test_save_then_load_returns_the_document() {
        let dir = tempfile::tempdir().unwrap();
        let store = SourceStore::new(dir.path());

        store.save(&source("doc-7")).unwrap();
        let loaded = store.load("doc-7").unwrap();

        assert_eq!(loaded.doc_id, "doc-7");
        assert_eq!(loaded.title, "Title doc-7");
        assert_eq!(loaded.abstract_text, "摘要内容");
    }

    // ============================================================
    // TEST 2: Scan order is stable
    // ============================================================

    #[test]
    fn test_scan_ids_sorted_by_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let store = SourceStore::new(dir.path());

        // Written out of order on purpose.
        for id in ["doc-003", "doc-001", "doc-002"] {
            store.save(&source(id)).unwrap();
        }
        // Non-document files are ignored by the scan.
        std::fs::write(dir.path().join("notes.txt"), "scratch").unwrap();

        let ids = store.scan_ids().unwrap();
        assert_eq!(ids, vec!["doc-001", "doc-002", "doc-003"]);
    }

    // ============================================================
    // TEST 3: Missing document is an error, not a panic
    // ============================================================

    #[test]
    fn test_load_missing_document_fails() {
        let dir = tempfile::tempdir().unwrap();
        let store = SourceStore::new(dir.path());
        assert!(store.load("ghost").is_err());
    }

    // ============================================================
    // TEST 4: Malformed document is an error with context
    // ============================================================

    #[test]
    fn test_load_malformed_document_fails() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("doc-9.json"), "{ nope").unwrap();

        let store = SourceStore::new(dir.path());
        let err = store.load("doc-9").unwrap_err();
        assert!(format!("{:#}", err).contains("doc-9"));
    }
}
