//! Document Types
//!
//! Records exchanged with the translation engine and stored in the work
//! root. The body/abstract split exists because the quality gate applies a
//! dedicated length rule to the abstract.

use serde::{Deserialize, Serialize};

/// A harvested document awaiting translation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceDocument {
    /// Stable identifier; doubles as the queue job id.
    pub doc_id: String,
    pub title: String,
    /// The document abstract in the source language.
    pub abstract_text: String,
    /// The full body in the source language.
    pub body: String,
    /// Where the document was harvested from, for provenance.
    pub source_url: Option<String>,
}

/// The translation engine's output for one source document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranslatedDocument {
    pub doc_id: String,
    pub title: String,
    pub abstract_text: String,
    pub body: String,
    /// Engine identifier reported by the translator, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine: Option<String>,
}
