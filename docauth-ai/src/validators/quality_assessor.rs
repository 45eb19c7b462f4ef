//! Quality Assessor
//!
//! Derives coarse text-clarity and document-structure flags from an
//! extraction.
//!
//! # Text Clarity
//! - High: > 50 words and > 300 characters
//! - Medium: > 20 words and > 100 characters
//! - Low: anything else, or no usable text
//!
//! # Structure
//! Three signals:
//! - formal text: at least two formality keywords present
//! - logo: any logo annotation above 0.3 confidence
//! - certificate structure: "certificado" or "diploma" present
//!
//! Formal when all three hold, informal when either text signal holds,
//! doubtful otherwise.
//!
//! # Resolution
//! Not measured. Always [`QualityAssessment::DEFAULT_RESOLUTION`].

use crate::detectors::rules::{DetectionRules, OBJECT_MIN_CONFIDENCE};
use crate::types::{DocumentStructure, QualityAssessment, QualityLevel, RawExtraction};
use tracing::debug;

/// Quality Assessor with configurable clarity bands
#[derive(Debug, Clone)]
pub struct QualityAssessor {
    high_min_words: usize,
    high_min_chars: usize,
    medium_min_words: usize,
    medium_min_chars: usize,
}

impl Default for QualityAssessor {
    fn default() -> Self {
        Self::new()
    }
}

impl QualityAssessor {
    /// Assessor with the standard clarity bands
    pub fn new() -> Self {
        Self {
            high_min_words: 50,
            high_min_chars: 300,
            medium_min_words: 20,
            medium_min_chars: 100,
        }
    }

    /// Assessor with custom clarity bands (exclusive lower bounds)
    pub fn with_bands(
        high_min_words: usize,
        high_min_chars: usize,
        medium_min_words: usize,
        medium_min_chars: usize,
    ) -> Self {
        Self {
            high_min_words,
            high_min_chars,
            medium_min_words,
            medium_min_chars,
        }
    }

    /// Assess an extraction
    pub fn assess(&self, extraction: &RawExtraction, rules: &DetectionRules) -> QualityAssessment {
        if !extraction.has_usable_text() {
            debug!(
                fallback = extraction.is_fallback(),
                "No usable text; quality forced to low/doubtful"
            );
            return QualityAssessment::unreadable();
        }

        let words = extraction.word_count();
        let chars = extraction.char_count();
        let text_clarity = self.text_clarity(words, chars);

        let lower = extraction.text.to_lowercase();
        let formality_matches = rules
            .formality_keywords
            .iter()
            .filter(|k| lower.contains(k.as_str()))
            .count();
        let formal_text = formality_matches >= crate::detectors::rules::FORMALITY_MIN_MATCHES;
        let has_logo = extraction
            .logos
            .iter()
            .any(|l| l.score > OBJECT_MIN_CONFIDENCE);
        let cert_structure = rules
            .certificate_structure_keywords
            .iter()
            .any(|k| lower.contains(k.as_str()));

        let structure = if formal_text && has_logo && cert_structure {
            DocumentStructure::Formal
        } else if formal_text || cert_structure {
            DocumentStructure::Informal
        } else {
            DocumentStructure::Doubtful
        };

        debug!(
            words,
            chars,
            clarity = ?text_clarity,
            formality_matches,
            has_logo,
            cert_structure,
            structure = ?structure,
            "Quality assessment complete"
        );

        QualityAssessment {
            text_clarity,
            resolution: QualityAssessment::DEFAULT_RESOLUTION,
            structure,
        }
    }

    fn text_clarity(&self, words: usize, chars: usize) -> QualityLevel {
        if words > self.high_min_words && chars > self.high_min_chars {
            QualityLevel::High
        } else if words > self.medium_min_words && chars > self.medium_min_chars {
            QualityLevel::Medium
        } else {
            QualityLevel::Low
        }
    }
}

/// Assess with the standard bands
pub fn assess_quality(extraction: &RawExtraction, rules: &DetectionRules) -> QualityAssessment {
    QualityAssessor::new().assess(extraction, rules)
}
