//! Text-side security element detection
//!
//! Looks for organization names, signature lines and weighted certification
//! keywords in the cleaned document text. Only meaningful when real text
//! was extracted; callers skip it for the PDF fallback placeholder.

use crate::detectors::rules::{DetectionRules, SignatureLayout};
use crate::types::SecurityElementSet;
use tracing::debug;

/// Result of text pattern analysis
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextAnalysis {
    pub elements: SecurityElementSet,
    /// Sum of matched certification keyword weights; reported, not scored
    pub certification_points: u32,
}

/// Analyze cleaned document text
pub fn analyze_text(text: &str, rules: &DetectionRules) -> TextAnalysis {
    let mut elements = SecurityElementSet::default();

    for org in &rules.organizations {
        if org.regex.is_match(text) {
            elements.add_logo(format!("Organization in text: {}", org.label));
        }
    }

    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        if let Some(detail) = match_signature_line(line, rules) {
            elements.add_signature(detail);
        }
    }

    let lower = text.to_lowercase();
    let mut certification_points = 0;
    for (keyword, points) in &rules.certification_keywords {
        if lower.contains(keyword.as_str()) {
            certification_points += points;
            elements.add_seal(format!("Certification keyword: \"{}\" (+{})", keyword, points));
        }
    }

    debug!(
        organizations = elements.logo_details.len(),
        signature_lines = elements.signature_details.len(),
        certification_keywords = elements.seal_details.len(),
        certification_points,
        "Text pattern analysis complete"
    );

    TextAnalysis {
        elements,
        certification_points,
    }
}

/// First signature pattern matching the line, rendered as evidence
fn match_signature_line(line: &str, rules: &DetectionRules) -> Option<String> {
    rules.signature_patterns.iter().find_map(|pattern| {
        let caps = pattern.regex.captures(line)?;
        let name = caps.name("name")?.as_str();
        let title = caps.name("title")?.as_str();
        let layout = match pattern.layout {
            SignatureLayout::NameDashTitle => "name-title",
            SignatureLayout::NameCommaTitle => "name, title",
            SignatureLayout::TitleColonName => "title: name",
        };
        Some(format!("Signature line: {} ({}) [{}]", name, title, layout))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const CERTIFICATE: &str = "UNIVERSIDAD NACIONAL\n\
        Certificado de Reconocimiento\n\
        Se expide el presente certificado a Laura Gómez\n\
        por su participación en el programa Microsoft Learn Student Ambassadors\n\
        \n\
        Carlos Andrés Méndez - Director\n\
        Coordinador: Sofía Herrera";

    #[test]
    fn test_organizations_detected_in_table_order() {
        let analysis = analyze_text(CERTIFICATE, DetectionRules::standard());
        assert_eq!(
            analysis.elements.logo_details,
            vec![
                "Organization in text: Microsoft Learn Student Ambassadors".to_string(),
                "Organization in text: Microsoft".to_string(),
                "Organization in text: University".to_string(),
            ]
        );
        assert!(analysis.elements.logos);
    }

    #[test]
    fn test_signature_lines() {
        let analysis = analyze_text(CERTIFICATE, DetectionRules::standard());
        assert!(analysis.elements.signatures);
        assert_eq!(
            analysis.elements.signature_details,
            vec![
                "Signature line: Carlos Andrés Méndez (Director) [name-title]".to_string(),
                "Signature line: Sofía Herrera (Coordinador) [title: name]".to_string(),
            ]
        );
    }

    #[test]
    fn test_signature_line_with_prefix_or_upper_case() {
        let analysis = analyze_text(
            "Firmado: Carlos Méndez - Director\nANA LUCÍA TORRES, RECTOR",
            DetectionRules::standard(),
        );
        assert_eq!(
            analysis.elements.signature_details,
            vec![
                "Signature line: Carlos Méndez (Director) [name-title]".to_string(),
                "Signature line: ANA LUCÍA TORRES (RECTOR) [name, title]".to_string(),
            ]
        );
    }

    #[test]
    fn test_certification_points_accumulate() {
        let analysis = analyze_text(CERTIFICATE, DetectionRules::standard());
        // certificado 3 + se expide 2 + reconocimiento 2
        assert_eq!(analysis.certification_points, 7);
        assert_eq!(analysis.elements.seal_details.len(), 3);
        assert_eq!(
            analysis.elements.seal_details[0],
            "Certification keyword: \"certificado\" (+3)"
        );
        assert!(analysis.elements.seals);
    }

    #[test]
    fn test_plain_text_has_no_elements() {
        let analysis = analyze_text("grocery list\nmilk\neggs", DetectionRules::standard());
        assert!(analysis.elements.is_empty());
        assert_eq!(analysis.certification_points, 0);
    }

    #[test]
    fn test_keywords_are_case_insensitive() {
        let analysis = analyze_text("THIS CERTIFICATE WAS ISSUED TODAY", DetectionRules::standard());
        assert_eq!(analysis.certification_points, 5);
        assert_eq!(analysis.elements.seal_details.len(), 2);
    }
}
