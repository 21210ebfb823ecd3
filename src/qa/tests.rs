//! Quality Gate Tests
//!
//! ## Test Scopes
//! - **Rules**: Each decision rule triggers on the right metric and all
//!   triggered rules accumulate into one verdict.
//! - **Purity**: Identical input yields identical verdicts and reasons
//!   across repeated evaluations.
//! - **Tuning**: Thresholds are configuration; loosening them changes the
//!   verdict without touching the document.

#[cfg(test)]
mod tests {
    use crate::qa::gate::{QaConfig, QaGate, QaReason, QaVerdict};
    use crate::translate::types::TranslatedDocument;

    fn doc(title: &str, abstract_text: &str, body: &str) -> TranslatedDocument {
        TranslatedDocument {
            doc_id: "doc-1".to_string(),
            title: title.to_string(),
            abstract_text: abstract_text.to_string(),
            body: body.to_string(),
            engine: None,
        }
    }

    fn clean_doc() -> TranslatedDocument {
        doc(
            "Methods for Alloy Fatigue Testing",
            "This study examines fatigue behavior in aluminium alloys under \
             cyclic loading, with emphasis on crack initiation at grain \
             boundaries and the influence of surface treatments.",
            "The experimental series covered twelve specimens machined from \
             extruded stock. Each specimen was polished, measured, and \
             subjected to load cycles until failure or runout.",
        )
    }

    // ============================================================
    // TEST 1: Clean translations pass
    // ============================================================

    #[test]
    fn test_clean_translation_passes() {
        let gate = QaGate::default();
        assert_eq!(gate.evaluate(&clean_doc()), QaVerdict::Pass);
    }

    // ============================================================
    // TEST 2: Source-script leakage
    // ============================================================

    #[test]
    fn test_source_script_leakage_is_flagged() {
        let gate = QaGate::default();
        let mut leaked = clean_doc();
        leaked.body = format!("{} 该试件在循环载荷下的疲劳行为表明裂纹萌生于晶界附近区域", leaked.body);

        let verdict = gate.evaluate(&leaked);
        let QaVerdict::Flagged(reasons) = verdict else {
            panic!("expected a flagged verdict");
        };
        assert!(reasons
            .iter()
            .any(|reason| matches!(reason, QaReason::SourceScriptLeakage { .. })));
    }

    // ============================================================
    // TEST 3: Source punctuation
    // ============================================================

    #[test]
    fn test_source_punctuation_is_flagged() {
        let gate = QaGate::default();
        // Latin text, but the engine kept the original typography.
        let kept_typography = doc(
            "Fatigue testing of alloys",
            "This study examines fatigue，crack initiation，and surface \
             treatments。The results are reported in the sections below。",
            "The specimens were tested under cyclic loading。Crack growth \
             was recorded，and analyzed。",
        );

        let QaVerdict::Flagged(reasons) = gate.evaluate(&kept_typography) else {
            panic!("expected a flagged verdict");
        };
        assert!(reasons
            .iter()
            .any(|reason| matches!(reason, QaReason::SourcePunctuation { .. })));
    }

    // ============================================================
    // TEST 4: Truncated abstract
    // ============================================================

    #[test]
    fn test_short_abstract_is_flagged() {
        let gate = QaGate::default();
        let short = doc(
            "Methods for Alloy Fatigue Testing",
            "Too short.",
            &clean_doc().body,
        );

        let QaVerdict::Flagged(reasons) = gate.evaluate(&short) else {
            panic!("expected a flagged verdict");
        };
        assert_eq!(reasons.len(), 1);
        assert!(matches!(
            reasons[0],
            QaReason::AbstractTooShort { chars: 10 }
        ));
    }

    // ============================================================
    // TEST 5: Reasons accumulate
    // ============================================================

    #[test]
    fn test_multiple_rules_accumulate_into_one_verdict() {
        let gate = QaGate::default();
        let bad = doc(
            "合金疲劳试验方法研究与分析报告",
            "过短。",
            "该试件在循环载荷下的疲劳行为，表明裂纹萌生于晶界附近。表面处理的影响，亦有讨论。",
        );

        let QaVerdict::Flagged(reasons) = gate.evaluate(&bad) else {
            panic!("expected a flagged verdict");
        };
        assert!(reasons.len() >= 3, "all triggered rules must be listed, got {:?}", reasons);
    }

    // ============================================================
    // TEST 6: Purity
    // ============================================================

    #[test]
    fn test_gate_is_pure() {
        let gate = QaGate::default();
        let mut subject = clean_doc();
        subject.body = format!("{} 晶界裂纹萌生，如图所示。", subject.body);

        let first = gate.evaluate(&subject);
        let second = gate.evaluate(&subject);
        let third = gate.evaluate(&subject);
        assert_eq!(first, second);
        assert_eq!(second, third);
    }

    // ============================================================
    // TEST 7: Thresholds are tunable
    // ============================================================

    #[test]
    fn test_loosened_thresholds_change_the_verdict() {
        let mut short = clean_doc();
        short.abstract_text = "A short but intentional abstract.".to_string();

        let strict = QaGate::default();
        assert!(!strict.evaluate(&short).is_pass());

        let loose = QaGate::new(QaConfig {
            min_abstract_chars: 10,
            ..QaConfig::default()
        });
        assert!(loose.evaluate(&short).is_pass());
    }

    // ============================================================
    // TEST 8: Empty text does not divide by zero
    // ============================================================

    #[test]
    fn test_empty_document_only_trips_the_length_rule() {
        let gate = QaGate::default();
        let empty = doc("", "", "");

        let QaVerdict::Flagged(reasons) = gate.evaluate(&empty) else {
            panic!("expected a flagged verdict");
        };
        assert_eq!(reasons.len(), 1);
        assert!(matches!(reasons[0], QaReason::AbstractTooShort { chars: 0 }));
    }
}
