//! Vision-side security element detection
//!
//! Builds a [`SecurityElementSet`] from the logo, localized-object and label
//! annotations of a [`RawExtraction`]. The three sources are additive: a flag
//! set by any source stays set, and evidence is appended in source order
//! (logos, then objects, then labels).

use crate::detectors::rules::{DetectionRules, LABEL_MIN_CONFIDENCE, OBJECT_MIN_CONFIDENCE};
use crate::types::{Annotation, RawExtraction, SecurityElementSet};
use tracing::debug;

/// Detect seals, signatures and logos from vision annotations
pub fn detect_security_elements(
    extraction: &RawExtraction,
    rules: &DetectionRules,
) -> SecurityElementSet {
    let mut elements = SecurityElementSet::default();

    for logo in extraction
        .logos
        .iter()
        .filter(|l| l.score > OBJECT_MIN_CONFIDENCE)
    {
        elements.add_logo(format!("{} ({}%)", logo.description, logo.percent()));
    }

    for object in extraction
        .objects
        .iter()
        .filter(|o| o.score > OBJECT_MIN_CONFIDENCE)
    {
        let name = object.description.to_lowercase();
        if contains_any(&name, &rules.seal_object_keywords) {
            elements.add_seal(evidence("Object", object));
        }
        if contains_any(&name, &rules.signature_object_keywords) {
            elements.add_signature(evidence("Object", object));
        }
    }

    for label in extraction
        .labels
        .iter()
        .filter(|l| l.score > LABEL_MIN_CONFIDENCE)
    {
        let name = label.description.to_lowercase();
        if contains_any(&name, &rules.seal_label_keywords) {
            elements.add_seal(evidence("Label", label));
        }
        if contains_any(&name, &rules.signature_label_keywords) {
            elements.add_signature(evidence("Label", label));
        }
        if contains_any(&name, &rules.logo_label_keywords) {
            elements.add_logo(evidence("Label", label));
        }
    }

    debug!(
        seals = elements.seal_details.len(),
        signatures = elements.signature_details.len(),
        logos = elements.logo_details.len(),
        "Vision-side element detection complete"
    );

    elements
}

fn evidence(source: &str, annotation: &Annotation) -> String {
    format!("{}: {} ({}%)", source, annotation.description, annotation.percent())
}

/// Lowercase substring match against any keyword
pub(crate) fn contains_any(haystack: &str, keywords: &[String]) -> bool {
    keywords.iter().any(|k| haystack.contains(k.as_str()))
}
