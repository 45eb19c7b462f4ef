//! Security element detectors
//!
//! Two independent heuristic detectors produce [`SecurityElementSet`]s:
//! - **security_elements** - vision annotations (logos, objects, labels)
//! - **text_patterns** - organizations, signature lines, certification keywords
//!
//! [`detect_elements`] runs both and merges them: flags are OR-ed and the
//! text-side evidence is appended after the vision-side evidence.

pub mod rules;
pub mod security_elements;
pub mod text_patterns;

pub use rules::DetectionRules;
pub use security_elements::detect_security_elements;
pub use text_patterns::{analyze_text, TextAnalysis};

use crate::types::{RawExtraction, SecurityElementSet};
use tracing::debug;

/// Run both detectors over one extraction
///
/// The text analyzer is skipped when the extraction carries no usable text
/// (PDF fallback placeholder or empty OCR result).
pub fn detect_elements(extraction: &RawExtraction, rules: &DetectionRules) -> SecurityElementSet {
    let mut elements = detect_security_elements(extraction, rules);

    if extraction.has_usable_text() {
        let text_analysis = analyze_text(&extraction.text, rules);
        elements.merge(text_analysis.elements);
    } else {
        debug!("No usable text; skipping text pattern analysis");
    }

    elements
}
