//! Vision Extractor
//!
//! Sends document bytes to the OCR/vision service and normalizes the
//! annotation bundle into a [`RawExtraction`].
//!
//! # Error Policy
//! - Image inputs: service errors (including timeouts) propagate as
//!   `AnalysisError::ExternalService` with their cause tag.
//! - PDF inputs: a service error or an empty text result yields the basic
//!   fallback extraction (placeholder text, no annotations) instead of an
//!   error.

use crate::error::{AnalysisError, AnalysisResult};
use crate::types::{
    AnalysisInput, AnnotationBundle, ExtractionSource, ImageProperties, RawExtraction,
    ServiceError, VisionFeature, VisionRequest, VisionService,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Placeholder text of the PDF fallback extraction
pub const PDF_FALLBACK_TEXT: &str =
    "PDF document: text could not be extracted automatically. Manual review recommended.";

/// Default OCR language hints
pub const DEFAULT_LANGUAGE_HINTS: &[&str] = &["es", "en"];

/// Default time budget for one OCR call
pub const DEFAULT_OCR_TIMEOUT: Duration = Duration::from_secs(30);

/// Vision Extractor
pub struct VisionExtractor {
    service: Arc<dyn VisionService>,
    language_hints: Vec<String>,
    timeout: Duration,
}

impl VisionExtractor {
    /// Extractor with default language hints and timeout
    pub fn new(service: Arc<dyn VisionService>) -> Self {
        Self {
            service,
            language_hints: DEFAULT_LANGUAGE_HINTS.iter().map(|h| h.to_string()).collect(),
            timeout: DEFAULT_OCR_TIMEOUT,
        }
    }

    pub fn with_language_hints(mut self, hints: Vec<String>) -> Self {
        self.language_hints = hints;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn language_hints(&self) -> &[String] {
        &self.language_hints
    }

    /// Extract text and annotations from a document
    ///
    /// # Errors
    /// - `EmptyInput` for a zero-length buffer
    /// - `ExternalService` when the service fails on an image input
    pub async fn extract(&self, input: &AnalysisInput) -> AnalysisResult<RawExtraction> {
        if input.is_empty() {
            return Err(AnalysisError::EmptyInput);
        }

        debug!(
            service = self.service.name(),
            media_type = %input.media_type,
            size_bytes = input.len(),
            "Requesting OCR/vision annotations"
        );

        let request = VisionRequest {
            content: &input.bytes,
            media_type: input.media_type,
            features: &VisionFeature::ALL,
            language_hints: &self.language_hints,
        };

        let response = tokio::time::timeout(self.timeout, self.service.annotate(&request))
            .await
            .unwrap_or_else(|_| Err(ServiceError::timeout(self.service.name(), self.timeout)));

        if input.media_type.is_pdf() {
            return Ok(self.pdf_extraction(response));
        }

        match response {
            Ok(bundle) => {
                let extraction = normalize(bundle);
                info!(
                    chars = extraction.char_count(),
                    logos = extraction.logos.len(),
                    objects = extraction.objects.len(),
                    labels = extraction.labels.len(),
                    "Vision extraction complete"
                );
                Ok(extraction)
            }
            Err(e) => {
                warn!(cause = %e.cause, error = %e.message, "Vision service failed on image input");
                Err(e.into())
            }
        }
    }

    fn pdf_extraction(&self, response: Result<AnnotationBundle, ServiceError>) -> RawExtraction {
        match response {
            Ok(bundle) => {
                let extraction = normalize(bundle);
                if extraction.text.is_empty() {
                    warn!("Vision service returned no text for PDF; using fallback extraction");
                    fallback_extraction()
                } else {
                    info!(chars = extraction.char_count(), "PDF text extracted");
                    extraction
                }
            }
            Err(e) => {
                warn!(
                    cause = %e.cause,
                    error = %e.message,
                    "Vision service failed on PDF; using fallback extraction"
                );
                fallback_extraction()
            }
        }
    }
}

/// Basic extraction for unreadable PDFs
pub fn fallback_extraction() -> RawExtraction {
    RawExtraction {
        text: PDF_FALLBACK_TEXT.to_string(),
        logos: Vec::new(),
        objects: Vec::new(),
        labels: Vec::new(),
        image_properties: ImageProperties::default(),
        source: ExtractionSource::PdfFallback,
    }
}

/// Convert a service bundle into a cleaned extraction
fn normalize(bundle: AnnotationBundle) -> RawExtraction {
    let raw_text = bundle
        .full_text
        .filter(|t| !t.trim().is_empty())
        .or_else(|| bundle.text_annotations.into_iter().next())
        .unwrap_or_default();

    RawExtraction {
        text: clean_text(&raw_text),
        logos: bundle.logos,
        objects: bundle.objects,
        labels: bundle.labels,
        image_properties: bundle.image_properties,
        source: ExtractionSource::Vision,
    }
}

/// Clean OCR text
///
/// Normalizes line endings, collapses runs of spaces and tabs, trims every
/// line, reduces each run of two or more blank lines to a single blank line,
/// and strips leading and trailing blank lines.
pub fn clean_text(raw: &str) -> String {
    let normalized = raw.replace("\r\n", "\n").replace('\r', "\n");

    let mut lines: Vec<String> = Vec::new();
    let mut blank_run = 0;
    for line in normalized.split('\n') {
        let collapsed = line.split([' ', '\t']).filter(|w| !w.is_empty()).collect::<Vec<_>>().join(" ");
        if collapsed.is_empty() {
            blank_run += 1;
            if blank_run == 1 {
                lines.push(String::new());
            }
        } else {
            blank_run = 0;
            lines.push(collapsed);
        }
    }

    while lines.first().is_some_and(|l| l.is_empty()) {
        lines.remove(0);
    }
    while lines.last().is_some_and(|l| l.is_empty()) {
        lines.pop();
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_text_line_endings_and_spaces() {
        let raw = "  CERTIFICADO\t de   LOGRO  \r\nOtorgado a:\rAna   Ruiz ";
        assert_eq!(clean_text(raw), "CERTIFICADO de LOGRO\nOtorgado a:\nAna Ruiz");
    }

    #[test]
    fn test_clean_text_collapses_blank_runs() {
        let raw = "\n\nTitle\n\n\n\n   \nBody\n\nFooter\n\n\n";
        assert_eq!(clean_text(raw), "Title\n\nBody\n\nFooter");
    }

    #[test]
    fn test_clean_text_empty() {
        assert_eq!(clean_text(""), "");
        assert_eq!(clean_text(" \n\t\n "), "");
    }

    #[test]
    fn test_normalize_prefers_full_text() {
        let bundle = AnnotationBundle {
            full_text: Some("Full  text".to_string()),
            text_annotations: vec!["First annotation".to_string()],
            ..Default::default()
        };
        assert_eq!(normalize(bundle).text, "Full text");

        let bundle = AnnotationBundle {
            full_text: Some("   ".to_string()),
            text_annotations: vec!["First annotation".to_string(), "First".to_string()],
            ..Default::default()
        };
        assert_eq!(normalize(bundle).text, "First annotation");
    }

    #[test]
    fn test_fallback_extraction_shape() {
        let fallback = fallback_extraction();
        assert!(fallback.is_fallback());
        assert!(!fallback.has_usable_text());
        assert_eq!(fallback.text, PDF_FALLBACK_TEXT);
        assert!(fallback.logos.is_empty() && fallback.objects.is_empty() && fallback.labels.is_empty());
    }
}
