//! Detection rule tables
//!
//! Keyword lists, organization patterns, signature-line patterns and weighted
//! certification keywords used by the detectors and the quality assessor.
//! The tables are plain data: [`DetectionRules::standard`] compiles them once,
//! and [`DetectionRules::builder`] starts from the same data for callers that
//! need to extend it.

use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;

/// Minimum confidence for logo and localized-object annotations
pub const OBJECT_MIN_CONFIDENCE: f32 = 0.3;

/// Minimum confidence for label annotations
pub const LABEL_MIN_CONFIDENCE: f32 = 0.5;

/// Localized-object names that indicate a seal
pub const SEAL_OBJECT_KEYWORDS: &[&str] = &[
    "seal", "stamp", "emblem", "badge", "crest", "insignia", "official", "government",
    "institutional", "circular", "sello", "estampa", "emblema", "escudo", "oficial", "gobierno",
    "institucional",
];

/// Localized-object names that indicate a signature
pub const SIGNATURE_OBJECT_KEYWORDS: &[&str] = &[
    "signature", "handwriting", "autograph", "signing", "firma", "escritura", "autógrafo",
    "rúbrica",
];

pub const SEAL_LABEL_KEYWORDS: &[&str] = &[
    "seal", "stamp", "emblem", "badge", "crest", "rubber stamp", "sello", "escudo",
];

pub const SIGNATURE_LABEL_KEYWORDS: &[&str] = &[
    "signature", "handwriting", "calligraphy", "autograph", "firma",
];

pub const LOGO_LABEL_KEYWORDS: &[&str] = &["logo", "brand", "trademark", "symbol", "marca"];

/// Words that make a text read as a formal document
pub const FORMALITY_KEYWORDS: &[&str] = &[
    "certificate", "diploma", "university", "universidad", "director", "registrar", "official",
    "oficial", "degree", "college", "institute", "instituto", "otorgado", "reconocimiento",
];

/// Formality keywords needed for the formal-text signal
pub const FORMALITY_MIN_MATCHES: usize = 2;

/// Words that mark a certificate-like layout
pub const CERTIFICATE_STRUCTURE_KEYWORDS: &[&str] = &["certificado", "diploma"];

/// Organization patterns, checked in order; (case-insensitive regex, label)
pub const ORGANIZATION_PATTERNS: &[(&str, &str)] = &[
    (r"\b(?:mlsa|microsoft learn student ambassadors?)\b", "Microsoft Learn Student Ambassadors"),
    (r"\b(?:mvp|most valuable professional)\b", "Microsoft MVP Program"),
    (r"\bmicrosoft\b", "Microsoft"),
    (r"\bgoogle\b", "Google"),
    (r"\b(?:aws|amazon web services)\b", "Amazon Web Services"),
    (r"\bcisco\b", "Cisco"),
    (r"\boracle\b", "Oracle"),
    (r"\bibm\b", "IBM"),
    (r"\bcoursera\b", "Coursera"),
    (r"\budemy\b", "Udemy"),
    (r"\bedx\b", "edX"),
    (r"\bplatzi\b", "Platzi"),
    (r"\bsena\b", "SENA"),
    (r"\b(?:universidad|university)\b", "University"),
];

/// Titles accepted on a signature line
pub const SIGNATURE_TITLES: &[&str] = &[
    "Director", "Rector", "Coordinador", "Presidente", "Gerente", "MVP", "MLSA",
];

/// Weighted certification keywords (lowercase substring, points)
pub const CERTIFICATION_KEYWORDS: &[(&str, u32)] = &[
    ("certificado", 3),
    ("diploma", 3),
    ("se expide", 2),
    ("otorgado", 2),
    ("reconocimiento", 2),
    ("registro oficial", 3),
    ("válido hasta", 2),
    ("certificate", 3),
    ("issued", 2),
    ("certified", 2),
];

/// Given name followed by at least one surname, each capitalized or all caps
const PERSON_NAME: &str = r"\b\p{Lu}(?:\p{Ll}+|\p{Lu}+)(?:\s+\p{Lu}(?:\p{Ll}+|\p{Lu}+))+";

/// Shape of a signature line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureLayout {
    /// `Name Surname - Title`
    NameDashTitle,
    /// `Name Surname, Title`
    NameCommaTitle,
    /// `Title: Name Surname`
    TitleColonName,
}

/// Compiled signature-line pattern
#[derive(Debug, Clone)]
pub struct SignaturePattern {
    pub layout: SignatureLayout,
    pub regex: Regex,
}

/// Compiled organization pattern
#[derive(Debug, Clone)]
pub struct OrganizationPattern {
    pub regex: Regex,
    pub label: String,
}

/// All tables used by detection, with regexes compiled
#[derive(Debug, Clone)]
pub struct DetectionRules {
    pub seal_object_keywords: Vec<String>,
    pub signature_object_keywords: Vec<String>,
    pub seal_label_keywords: Vec<String>,
    pub signature_label_keywords: Vec<String>,
    pub logo_label_keywords: Vec<String>,
    pub formality_keywords: Vec<String>,
    pub certificate_structure_keywords: Vec<String>,
    pub organizations: Vec<OrganizationPattern>,
    pub signature_patterns: Vec<SignaturePattern>,
    pub certification_keywords: Vec<(String, u32)>,
}

static STANDARD_RULES: Lazy<Arc<DetectionRules>> =
    Lazy::new(|| Arc::new(DetectionRules::builder().build()));

impl DetectionRules {
    /// Built-in tables, compiled once per process
    pub fn standard() -> &'static DetectionRules {
        &STANDARD_RULES
    }

    /// Shared handle to the built-in tables
    pub fn shared() -> Arc<DetectionRules> {
        Arc::clone(&STANDARD_RULES)
    }

    /// Builder preloaded with the built-in tables
    pub fn builder() -> DetectionRulesBuilder {
        DetectionRulesBuilder::default()
    }
}

impl Default for DetectionRules {
    fn default() -> Self {
        Self::standard().clone()
    }
}

/// Builder for [`DetectionRules`]
///
/// Extension patterns are validated on insertion so `build` cannot fail.
#[derive(Debug, Clone)]
pub struct DetectionRulesBuilder {
    seal_object_keywords: Vec<String>,
    signature_object_keywords: Vec<String>,
    seal_label_keywords: Vec<String>,
    signature_label_keywords: Vec<String>,
    logo_label_keywords: Vec<String>,
    formality_keywords: Vec<String>,
    certificate_structure_keywords: Vec<String>,
    organizations: Vec<OrganizationPattern>,
    signature_titles: Vec<String>,
    certification_keywords: Vec<(String, u32)>,
}

impl Default for DetectionRulesBuilder {
    fn default() -> Self {
        Self {
            seal_object_keywords: to_owned(SEAL_OBJECT_KEYWORDS),
            signature_object_keywords: to_owned(SIGNATURE_OBJECT_KEYWORDS),
            seal_label_keywords: to_owned(SEAL_LABEL_KEYWORDS),
            signature_label_keywords: to_owned(SIGNATURE_LABEL_KEYWORDS),
            logo_label_keywords: to_owned(LOGO_LABEL_KEYWORDS),
            formality_keywords: to_owned(FORMALITY_KEYWORDS),
            certificate_structure_keywords: to_owned(CERTIFICATE_STRUCTURE_KEYWORDS),
            organizations: ORGANIZATION_PATTERNS
                .iter()
                .map(|(pattern, label)| OrganizationPattern {
                    regex: case_insensitive(pattern),
                    label: (*label).to_string(),
                })
                .collect(),
            signature_titles: to_owned(SIGNATURE_TITLES),
            certification_keywords: CERTIFICATION_KEYWORDS
                .iter()
                .map(|(k, w)| ((*k).to_string(), *w))
                .collect(),
        }
    }
}

impl DetectionRulesBuilder {
    /// Append an organization pattern (matched case-insensitively)
    pub fn organization(mut self, pattern: &str, label: &str) -> Result<Self, regex::Error> {
        let regex = Regex::new(&format!("(?i){}", pattern))?;
        self.organizations.push(OrganizationPattern {
            regex,
            label: label.to_string(),
        });
        Ok(self)
    }

    /// Append a weighted certification keyword
    pub fn certification_keyword(mut self, keyword: &str, points: u32) -> Self {
        self.certification_keywords
            .push((keyword.to_lowercase(), points));
        self
    }

    pub fn signature_title(mut self, title: &str) -> Self {
        self.signature_titles.push(title.to_string());
        self
    }

    pub fn seal_object_keyword(mut self, keyword: &str) -> Self {
        self.seal_object_keywords.push(keyword.to_lowercase());
        self
    }

    pub fn signature_object_keyword(mut self, keyword: &str) -> Self {
        self.signature_object_keywords.push(keyword.to_lowercase());
        self
    }

    pub fn seal_label_keyword(mut self, keyword: &str) -> Self {
        self.seal_label_keywords.push(keyword.to_lowercase());
        self
    }

    pub fn signature_label_keyword(mut self, keyword: &str) -> Self {
        self.signature_label_keywords.push(keyword.to_lowercase());
        self
    }

    pub fn logo_label_keyword(mut self, keyword: &str) -> Self {
        self.logo_label_keywords.push(keyword.to_lowercase());
        self
    }

    /// Word counted toward the formal-text signal
    pub fn formality_keyword(mut self, keyword: &str) -> Self {
        self.formality_keywords.push(keyword.to_lowercase());
        self
    }

    /// Word that marks a certificate-like layout
    pub fn certificate_structure_keyword(mut self, keyword: &str) -> Self {
        self.certificate_structure_keywords.push(keyword.to_lowercase());
        self
    }

    pub fn build(self) -> DetectionRules {
        DetectionRules {
            seal_object_keywords: self.seal_object_keywords,
            signature_object_keywords: self.signature_object_keywords,
            seal_label_keywords: self.seal_label_keywords,
            signature_label_keywords: self.signature_label_keywords,
            logo_label_keywords: self.logo_label_keywords,
            formality_keywords: self.formality_keywords,
            certificate_structure_keywords: self.certificate_structure_keywords,
            organizations: self.organizations,
            signature_patterns: signature_patterns(&self.signature_titles),
            certification_keywords: self.certification_keywords,
        }
    }
}

fn to_owned(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| (*w).to_string()).collect()
}

/// Compile a pattern from the static tables
fn case_insensitive(pattern: &str) -> Regex {
    // Static table entries are covered by test_standard_rules_compile
    Regex::new(&format!("(?i){}", pattern)).unwrap_or_else(|e| {
        panic!("invalid built-in pattern {}: {}", pattern, e)
    })
}

/// The three signature-line patterns, in evaluation order
///
/// Patterns are unanchored so a line may carry a prefix such as `Firmado:`.
fn signature_patterns(titles: &[String]) -> Vec<SignaturePattern> {
    let titles = titles
        .iter()
        .map(|t| regex::escape(t))
        .collect::<Vec<_>>()
        .join("|");
    let title = format!(r"\b(?i:{})\b", titles);

    let layouts = [
        (
            SignatureLayout::NameDashTitle,
            format!(r"(?P<name>{})\s*[-–—]\s*(?P<title>{})", PERSON_NAME, title),
        ),
        (
            SignatureLayout::NameCommaTitle,
            format!(r"(?P<name>{})\s*,\s*(?P<title>{})", PERSON_NAME, title),
        ),
        (
            SignatureLayout::TitleColonName,
            format!(r"(?P<title>{})\s*:\s*(?P<name>{})", title, PERSON_NAME),
        ),
    ];

    layouts
        .into_iter()
        .map(|(layout, pattern)| SignaturePattern {
            layout,
            regex: Regex::new(&pattern).unwrap_or_else(|e| {
                panic!("invalid signature pattern {}: {}", pattern, e)
            }),
        })
        .collect()
}
