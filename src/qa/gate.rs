//! Quality Gate
//!
//! Decision rules over a translated document:
//! - source-script characters left in the translated text above a small
//!   ceiling mean untranslated leakage;
//! - source-script punctuation above a ceiling means the engine kept the
//!   original typography;
//! - an abstract below a minimum length usually means truncation or an
//!   engine failure that still returned 200.
//!
//! All triggered rules accumulate into one flagged verdict; reviewers see
//! the full picture, not just the first hit.

use crate::translate::types::TranslatedDocument;
use regex::Regex;
use std::fmt;

/// Tunable thresholds and source-script definition for the gate.
///
/// The defaults target the production corpus (Chinese-to-English). Both the
/// script and the thresholds are configuration, not constants.
#[derive(Debug, Clone)]
pub struct QaConfig {
    /// Ceiling on the share of source-script characters in the translated
    /// text (over non-whitespace characters).
    pub max_source_char_ratio: f64,
    /// Ceiling on the share of source-script punctuation.
    pub max_source_punct_ratio: f64,
    /// Minimum length of the translated abstract, in characters.
    pub min_abstract_chars: usize,
    /// Character class matching one source-script character.
    pub source_chars: Regex,
    /// Character class matching one source-script punctuation mark.
    pub source_punct: Regex,
}

impl Default for QaConfig {
    fn default() -> Self {
        Self {
            max_source_char_ratio: 0.05,
            max_source_punct_ratio: 0.02,
            min_abstract_chars: 80,
            source_chars: Regex::new(r"\p{Han}").unwrap(),
            source_punct: Regex::new("[，。、！？；：《》「」『』（）【】]").unwrap(),
        }
    }
}

/// A single triggered gate rule.
#[derive(Debug, Clone, PartialEq)]
pub enum QaReason {
    SourceScriptLeakage { ratio: f64 },
    SourcePunctuation { ratio: f64 },
    AbstractTooShort { chars: usize },
}

impl fmt::Display for QaReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QaReason::SourceScriptLeakage { ratio } => {
                write!(f, "source-script characters at {:.1}% of text", ratio * 100.0)
            }
            QaReason::SourcePunctuation { ratio } => {
                write!(f, "source-script punctuation at {:.1}% of text", ratio * 100.0)
            }
            QaReason::AbstractTooShort { chars } => {
                write!(f, "translated abstract only {} chars", chars)
            }
        }
    }
}

/// Gate verdict: done, or terminal-but-reviewable.
#[derive(Debug, Clone, PartialEq)]
pub enum QaVerdict {
    Pass,
    Flagged(Vec<QaReason>),
}

impl QaVerdict {
    pub fn is_pass(&self) -> bool {
        matches!(self, QaVerdict::Pass)
    }
}

/// The pass/flag decision function.
#[derive(Debug, Clone)]
pub struct QaGate {
    config: QaConfig,
}

impl QaGate {
    pub fn new(config: QaConfig) -> Self {
        Self { config }
    }

    /// Evaluates one translated document. Pure: no I/O, no clock, no state.
    pub fn evaluate(&self, doc: &TranslatedDocument) -> QaVerdict {
        let text = full_text(doc);
        let denominator = text.chars().filter(|c| !c.is_whitespace()).count();

        let mut reasons = Vec::new();

        if denominator > 0 {
            let char_ratio =
                self.config.source_chars.find_iter(&text).count() as f64 / denominator as f64;
            if char_ratio > self.config.max_source_char_ratio {
                reasons.push(QaReason::SourceScriptLeakage { ratio: char_ratio });
            }

            let punct_ratio =
                self.config.source_punct.find_iter(&text).count() as f64 / denominator as f64;
            if punct_ratio > self.config.max_source_punct_ratio {
                reasons.push(QaReason::SourcePunctuation { ratio: punct_ratio });
            }
        }

        let abstract_chars = doc.abstract_text.trim().chars().count();
        if abstract_chars < self.config.min_abstract_chars {
            reasons.push(QaReason::AbstractTooShort {
                chars: abstract_chars,
            });
        }

        if reasons.is_empty() {
            QaVerdict::Pass
        } else {
            QaVerdict::Flagged(reasons)
        }
    }
}

impl Default for QaGate {
    fn default() -> Self {
        Self::new(QaConfig::default())
    }
}

fn full_text(doc: &TranslatedDocument) -> String {
    format!("{}\n{}\n{}", doc.title, doc.abstract_text, doc.body)
}
