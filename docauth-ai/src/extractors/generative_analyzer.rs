//! Generative Document Analyzer
//!
//! Best-effort second opinion from a vision-language model. The analyzer
//! never fails: every transport, timeout or parse problem is logged and
//! replaced by [`GenerativeSignal::fallback`].
//!
//! # Eligibility
//! The pipeline only asks for a signal when a generative client is
//! configured, the document is smaller than the size gate, and the document
//! is not a PDF. Ineligible documents get no signal at all, which changes
//! the fusion weighting.

use crate::types::{
    AnalysisInput, DocumentStructure, GenerativeRequest, GenerativeService, GenerativeSignal,
    QualityAssessment, SecurityElementSet, ServiceError,
};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Documents at or above this size skip the generative signal
pub const DEFAULT_MAX_BYTES: usize = 20 * 1024 * 1024;

/// Default time budget for one generative call
pub const DEFAULT_GENERATIVE_TIMEOUT: Duration = Duration::from_secs(30);

/// Fixed structured-output prompt
pub const ANALYSIS_PROMPT: &str = r#"You are a document authenticity examiner. Inspect the attached document image (certificate, diploma, identification, license or transcript) and look for physical security features.

Answer ONLY with a single JSON object, no prose and no markdown, with exactly this shape:
{
  "hasSignatures": boolean,
  "signatureCount": integer,
  "hasSeals": boolean,
  "sealCount": integer,
  "hasWatermarks": boolean,
  "formatConsistency": number from 0 to 100,
  "overallSecurity": number from 0 to 100,
  "suspiciousElements": [string],
  "documentType": "certificate" | "diploma" | "identification" | "license" | "transcript" | "other",
  "authenticityScore": number from 0 to 100
}

List in suspiciousElements every sign of editing, inconsistent fonts, misaligned elements or missing expected features."#;

/// Failure to read a signal out of the model's answer
#[derive(Debug, Error, PartialEq)]
pub enum ParseError {
    #[error("No JSON object found in response")]
    NoJsonObject,

    #[error("Invalid JSON: {0}")]
    InvalidJson(String),

    #[error("JSON does not match the signal shape: {0}")]
    MalformedShape(String),
}

/// Any generative-analysis failure; absorbed into the fallback signal
#[derive(Debug, Error)]
pub enum GenerativeError {
    #[error("Generative service error: {0}")]
    Service(#[from] ServiceError),

    #[error("Response parse error: {0}")]
    Parse(#[from] ParseError),
}

/// Generative Document Analyzer
pub struct GenerativeAnalyzer {
    service: Option<Arc<dyn GenerativeService>>,
    max_bytes: usize,
    timeout: Duration,
}

impl GenerativeAnalyzer {
    pub fn new(service: Arc<dyn GenerativeService>) -> Self {
        Self {
            service: Some(service),
            max_bytes: DEFAULT_MAX_BYTES,
            timeout: DEFAULT_GENERATIVE_TIMEOUT,
        }
    }

    /// Analyzer without a client; never produces a signal
    pub fn disabled() -> Self {
        Self {
            service: None,
            max_bytes: DEFAULT_MAX_BYTES,
            timeout: DEFAULT_GENERATIVE_TIMEOUT,
        }
    }

    pub fn with_max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.service.is_some()
    }

    /// Whether the pipeline should request a signal for this input
    pub fn is_eligible(&self, input: &AnalysisInput) -> bool {
        self.service.is_some() && input.len() < self.max_bytes && !input.media_type.is_pdf()
    }

    /// Pipeline entry point: `None` when the input is ineligible
    pub async fn analyze(&self, input: &AnalysisInput) -> Option<GenerativeSignal> {
        if !self.is_eligible(input) {
            debug!(
                enabled = self.is_enabled(),
                size_bytes = input.len(),
                max_bytes = self.max_bytes,
                media_type = %input.media_type,
                "Generative signal skipped"
            );
            return None;
        }
        Some(self.analyze_document(input).await)
    }

    /// Ask the model for a signal; always returns one
    ///
    /// PDFs and unconfigured analyzers return the fallback without a call.
    pub async fn analyze_document(&self, input: &AnalysisInput) -> GenerativeSignal {
        let Some(service) = self.service.as_ref() else {
            return GenerativeSignal::fallback();
        };
        if input.media_type.is_pdf() {
            debug!("PDF input not supported by generative analyzer; using fallback signal");
            return GenerativeSignal::fallback();
        }

        match self.request_signal(service.as_ref(), input).await {
            Ok(signal) => {
                info!(
                    service = service.name(),
                    authenticity_score = signal.authenticity_score,
                    suspicious = signal.suspicious_elements.len(),
                    document_type = ?signal.document_type,
                    "Generative signal received"
                );
                signal
            }
            Err(e) => {
                warn!(service = service.name(), error = %e, "Generative analysis failed; using fallback signal");
                GenerativeSignal::fallback()
            }
        }
    }

    async fn request_signal(
        &self,
        service: &dyn GenerativeService,
        input: &AnalysisInput,
    ) -> Result<GenerativeSignal, GenerativeError> {
        let request = GenerativeRequest {
            prompt: ANALYSIS_PROMPT,
            image: &input.bytes,
            media_type: input.media_type,
        };

        let text = tokio::time::timeout(self.timeout, service.generate(&request))
            .await
            .unwrap_or_else(|_| Err(ServiceError::timeout(service.name(), self.timeout)))?;

        debug!(response_chars = text.chars().count(), "Parsing generative response");
        Ok(parse_structured_response(&text)?)
    }
}

/// Read a [`GenerativeSignal`] out of free-form model text
///
/// Takes the first balanced `{...}` region (braces inside JSON strings are
/// ignored), decodes it, and clamps the 0-100 fields.
///
/// # Errors
/// - `NoJsonObject` when no balanced region exists
/// - `InvalidJson` when the region is not valid JSON
/// - `MalformedShape` when the JSON lacks fields or has wrong types
///
/// Counts may be written as any number and `suspiciousElements` may be
/// `null`; document types match without regard to case.
pub fn parse_structured_response(text: &str) -> Result<GenerativeSignal, ParseError> {
    let region = first_json_object(text).ok_or(ParseError::NoJsonObject)?;
    let value: serde_json::Value =
        serde_json::from_str(region).map_err(|e| ParseError::InvalidJson(e.to_string()))?;
    let signal: GenerativeSignal =
        serde_json::from_value(value).map_err(|e| ParseError::MalformedShape(e.to_string()))?;
    Ok(signal.normalized())
}

fn first_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..=start + offset]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Fold a generative signal into the heuristic results
///
/// Signatures and seals reported with a positive count set the matching
/// flag when the heuristics missed it. The structure class is always
/// replaced by one derived from `formatConsistency`.
pub fn apply_generative_signal(
    elements: &mut SecurityElementSet,
    quality: &mut QualityAssessment,
    signal: &GenerativeSignal,
) {
    if signal.has_signatures && signal.signature_count > 0 && !elements.signatures {
        elements.add_signature(format!(
            "{} signature(s) detected by secondary analyzer",
            signal.signature_count
        ));
    }
    if signal.has_seals && signal.seal_count > 0 && !elements.seals {
        elements.add_seal(format!(
            "{} seal(s) detected by secondary analyzer",
            signal.seal_count
        ));
    }

    quality.structure = if signal.format_consistency > 80.0 {
        DocumentStructure::Formal
    } else if signal.format_consistency > 50.0 {
        DocumentStructure::Informal
    } else {
        DocumentStructure::Doubtful
    };
}
