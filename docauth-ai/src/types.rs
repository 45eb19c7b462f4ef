//! Core Types and Trait Definitions for docauth-ai
//!
//! Defines the request-scoped data model of one analysis and the two
//! collaborator seams the pipeline talks to:
//! - [`VisionService`]: OCR + vision annotation of document bytes
//! - [`GenerativeService`]: free-text answer from a vision-language model
//!
//! # Architecture
//! Extraction → quality assessment → element detection → optional
//! generative signal → fusion into one score and recommendation.

use crate::error::{AnalysisError, AnalysisResult};
use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use thiserror::Error;

// ============================================================================
// Input
// ============================================================================

/// Supported document media types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MediaType {
    #[serde(rename = "image/jpeg")]
    Jpeg,
    #[serde(rename = "image/png")]
    Png,
    #[serde(rename = "image/gif")]
    Gif,
    #[serde(rename = "image/bmp")]
    Bmp,
    #[serde(rename = "image/webp")]
    Webp,
    #[serde(rename = "image/tiff")]
    Tiff,
    #[serde(rename = "application/pdf")]
    Pdf,
}

impl MediaType {
    /// Parse a mime type string (case-insensitive, `image/jpg` accepted)
    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime.trim().to_ascii_lowercase().as_str() {
            "image/jpeg" | "image/jpg" => Some(Self::Jpeg),
            "image/png" => Some(Self::Png),
            "image/gif" => Some(Self::Gif),
            "image/bmp" => Some(Self::Bmp),
            "image/webp" => Some(Self::Webp),
            "image/tiff" => Some(Self::Tiff),
            "application/pdf" => Some(Self::Pdf),
            _ => None,
        }
    }

    /// Canonical mime string
    pub fn mime(&self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Gif => "image/gif",
            Self::Bmp => "image/bmp",
            Self::Webp => "image/webp",
            Self::Tiff => "image/tiff",
            Self::Pdf => "application/pdf",
        }
    }

    pub fn is_pdf(&self) -> bool {
        matches!(self, Self::Pdf)
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mime())
    }
}

/// Document bytes plus their validated media type
///
/// Created once per analysis call and owned by that invocation.
#[derive(Debug, Clone)]
pub struct AnalysisInput {
    pub bytes: Vec<u8>,
    pub media_type: MediaType,
}

impl AnalysisInput {
    /// Validate raw bytes and a mime string
    ///
    /// # Errors
    /// - `UnsupportedMediaType` for any mime outside the supported set
    /// - `EmptyInput` for a zero-length buffer
    pub fn new(bytes: Vec<u8>, mime: &str) -> AnalysisResult<Self> {
        let media_type = MediaType::from_mime(mime)
            .ok_or_else(|| AnalysisError::UnsupportedMediaType(mime.to_string()))?;

        if bytes.is_empty() {
            return Err(AnalysisError::EmptyInput);
        }

        Ok(Self { bytes, media_type })
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

// ============================================================================
// Vision annotations and raw extraction
// ============================================================================

/// One scored annotation (logo, localized object, or label)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    /// Description or object name as reported by the service
    pub description: String,
    /// Service confidence (0.0-1.0)
    pub score: f32,
}

impl Annotation {
    pub fn new(description: impl Into<String>, score: f32) -> Self {
        Self {
            description: description.into(),
            score,
        }
    }

    /// Confidence rendered as a whole percentage
    pub fn percent(&self) -> i64 {
        (f64::from(self.score) * 100.0).round() as i64
    }
}

/// Dominant color reported by the image-properties feature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DominantColor {
    pub red: f32,
    pub green: f32,
    pub blue: f32,
    pub score: f32,
    pub pixel_fraction: f32,
}

/// Image-level properties
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImageProperties {
    pub dominant_colors: Vec<DominantColor>,
}

/// Features requested from the vision service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisionFeature {
    TextDetection,
    DocumentTextDetection,
    LogoDetection,
    ObjectLocalization,
    LabelDetection,
    ImageProperties,
}

impl VisionFeature {
    /// Every feature, in request order
    pub const ALL: [VisionFeature; 6] = [
        VisionFeature::TextDetection,
        VisionFeature::DocumentTextDetection,
        VisionFeature::LogoDetection,
        VisionFeature::ObjectLocalization,
        VisionFeature::LabelDetection,
        VisionFeature::ImageProperties,
    ];

    /// Wire name of the feature
    pub fn api_name(&self) -> &'static str {
        match self {
            Self::TextDetection => "TEXT_DETECTION",
            Self::DocumentTextDetection => "DOCUMENT_TEXT_DETECTION",
            Self::LogoDetection => "LOGO_DETECTION",
            Self::ObjectLocalization => "OBJECT_LOCALIZATION",
            Self::LabelDetection => "LABEL_DETECTION",
            Self::ImageProperties => "IMAGE_PROPERTIES",
        }
    }
}

/// Request sent to a [`VisionService`]
#[derive(Debug, Clone, Copy)]
pub struct VisionRequest<'a> {
    pub content: &'a [u8],
    pub media_type: MediaType,
    pub features: &'a [VisionFeature],
    pub language_hints: &'a [String],
}

/// Normalized annotation bundle returned by a [`VisionService`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnnotationBundle {
    /// Full document text, when the document-text feature produced one
    pub full_text: Option<String>,
    /// Per-block text annotations; the first entry is the whole text
    pub text_annotations: Vec<String>,
    pub logos: Vec<Annotation>,
    pub objects: Vec<Annotation>,
    pub labels: Vec<Annotation>,
    pub image_properties: ImageProperties,
}

/// How the raw extraction was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionSource {
    /// Annotations returned by the vision service
    Vision,
    /// PDF that could not be read; placeholder text, no annotations
    PdfFallback,
}

/// Normalized output of the vision extraction step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawExtraction {
    /// Cleaned document text
    pub text: String,
    pub logos: Vec<Annotation>,
    pub objects: Vec<Annotation>,
    pub labels: Vec<Annotation>,
    pub image_properties: ImageProperties,
    pub source: ExtractionSource,
}

impl RawExtraction {
    pub fn is_fallback(&self) -> bool {
        self.source == ExtractionSource::PdfFallback
    }

    /// True when real text was extracted (not the fallback placeholder)
    pub fn has_usable_text(&self) -> bool {
        !self.is_fallback() && !self.text.trim().is_empty()
    }

    pub fn word_count(&self) -> usize {
        word_count(&self.text)
    }

    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}

/// Whitespace-separated word count
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

// ============================================================================
// Security elements
// ============================================================================

/// Seals, signatures, and logos found in a document
///
/// Detail lists are append-only evidence in detection order; overlapping
/// evidence from several detectors is kept as-is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SecurityElementSet {
    pub seals: bool,
    pub signatures: bool,
    pub logos: bool,
    pub seal_details: Vec<String>,
    pub signature_details: Vec<String>,
    pub logo_details: Vec<String>,
}

impl SecurityElementSet {
    pub fn add_seal(&mut self, detail: impl Into<String>) {
        self.seals = true;
        self.seal_details.push(detail.into());
    }

    pub fn add_signature(&mut self, detail: impl Into<String>) {
        self.signatures = true;
        self.signature_details.push(detail.into());
    }

    pub fn add_logo(&mut self, detail: impl Into<String>) {
        self.logos = true;
        self.logo_details.push(detail.into());
    }

    /// OR the flags and append the other set's details after ours
    pub fn merge(&mut self, other: SecurityElementSet) {
        self.seals |= other.seals;
        self.signatures |= other.signatures;
        self.logos |= other.logos;
        self.seal_details.extend(other.seal_details);
        self.signature_details.extend(other.signature_details);
        self.logo_details.extend(other.logo_details);
    }

    pub fn is_empty(&self) -> bool {
        !self.seals && !self.signatures && !self.logos
    }
}

// ============================================================================
// Quality
// ============================================================================

/// Coarse three-step quality level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityLevel {
    High,
    Medium,
    Low,
}

/// Document structure classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentStructure {
    Formal,
    Informal,
    Doubtful,
}

/// Quality flags derived from the extraction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityAssessment {
    pub text_clarity: QualityLevel,
    /// Never measured; always [`QualityAssessment::DEFAULT_RESOLUTION`]
    pub resolution: QualityLevel,
    pub structure: DocumentStructure,
}

impl QualityAssessment {
    pub const DEFAULT_RESOLUTION: QualityLevel = QualityLevel::Medium;

    /// Assessment used when nothing could be read
    pub fn unreadable() -> Self {
        Self {
            text_clarity: QualityLevel::Low,
            resolution: Self::DEFAULT_RESOLUTION,
            structure: DocumentStructure::Doubtful,
        }
    }
}

// ============================================================================
// Generative signal
// ============================================================================

/// Document type reported by the generative analyzer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentType {
    Certificate,
    Diploma,
    Identification,
    License,
    Transcript,
    Other,
}

impl DocumentType {
    /// Case-insensitive lookup; unknown labels map to `Other`
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "certificate" => Self::Certificate,
            "diploma" => Self::Diploma,
            "identification" => Self::Identification,
            "license" => Self::License,
            "transcript" => Self::Transcript,
            _ => Self::Other,
        }
    }
}

impl<'de> Deserialize<'de> for DocumentType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let label = String::deserialize(deserializer)?;
        Ok(Self::from_label(&label))
    }
}

/// Structured opinion of the generative document analyzer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerativeSignal {
    pub has_signatures: bool,
    #[serde(deserialize_with = "lenient::count")]
    pub signature_count: u32,
    pub has_seals: bool,
    #[serde(deserialize_with = "lenient::count")]
    pub seal_count: u32,
    pub has_watermarks: bool,
    /// 0-100
    pub format_consistency: f64,
    /// 0-100
    pub overall_security: f64,
    #[serde(default, deserialize_with = "lenient::list")]
    pub suspicious_elements: Vec<String>,
    pub document_type: DocumentType,
    /// 0-100
    pub authenticity_score: f64,
}

impl GenerativeSignal {
    /// Neutral signal substituted when the analyzer cannot give an answer
    pub fn fallback() -> Self {
        Self {
            has_signatures: false,
            signature_count: 0,
            has_seals: false,
            seal_count: 0,
            has_watermarks: false,
            format_consistency: 50.0,
            overall_security: 30.0,
            suspicious_elements: Vec::new(),
            document_type: DocumentType::Other,
            authenticity_score: 30.0,
        }
    }

    /// Clamp the 0-100 fields into range
    pub fn normalized(mut self) -> Self {
        self.format_consistency = self.format_consistency.clamp(0.0, 100.0);
        self.overall_security = self.overall_security.clamp(0.0, 100.0);
        self.authenticity_score = self.authenticity_score.clamp(0.0, 100.0);
        self
    }
}

/// Deserializers for model-written JSON, which is looser than the prompt asks
mod lenient {
    use serde::{Deserialize, Deserializer};

    /// Any JSON number; rounded, saturating at 0 and `u32::MAX`
    pub fn count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u32, D::Error> {
        let value = f64::deserialize(deserializer)?;
        Ok(value.round() as u32)
    }

    /// `null` reads as an empty list
    pub fn list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
        Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
    }
}

/// Request sent to a [`GenerativeService`]
#[derive(Debug, Clone, Copy)]
pub struct GenerativeRequest<'a> {
    pub prompt: &'a str,
    pub image: &'a [u8],
    pub media_type: MediaType,
}

// ============================================================================
// Fusion output
// ============================================================================

/// Discrete trust decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Recommendation {
    Accept,
    Review,
    Reject,
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Accept => f.write_str("accept"),
            Self::Review => f.write_str("review"),
            Self::Reject => f.write_str("reject"),
        }
    }
}

/// Every intermediate factor of the fused score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub vision_weight: f64,
    pub text_factor: f64,
    pub elements_factor: f64,
    pub quality_factor: f64,
    pub generative_factor: f64,
    pub hybrid_bonus: f64,
    pub vision_score: f64,
    pub generative_portion: f64,
    pub word_count: usize,
    pub char_count: usize,
    pub generative_present: bool,
    pub suspicious_count: usize,
}

/// Final score and recommendation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusedResult {
    /// Always within 0-100
    pub score: f64,
    pub recommendation: Recommendation,
    pub elements: SecurityElementSet,
    pub breakdown: ScoreBreakdown,
}

// ============================================================================
// Collaborator traits
// ============================================================================

/// Why an external service call failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceErrorCause {
    Quota,
    Permission,
    MalformedInput,
    Unknown,
}

impl fmt::Display for ServiceErrorCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Quota => f.write_str("quota"),
            Self::Permission => f.write_str("permission"),
            Self::MalformedInput => f.write_str("malformed input"),
            Self::Unknown => f.write_str("unknown"),
        }
    }
}

impl ServiceErrorCause {
    /// Classify a service error message
    pub fn classify(message: &str) -> Self {
        let lower = message.to_lowercase();
        if lower.contains("quota") || lower.contains("resource_exhausted") || lower.contains("rate limit") {
            Self::Quota
        } else if lower.contains("permission")
            || lower.contains("api key")
            || lower.contains("billing")
            || lower.contains("unauthenticated")
        {
            Self::Permission
        } else if lower.contains("invalid_argument") || lower.contains("bad image") || lower.contains("image") {
            Self::MalformedInput
        } else {
            Self::Unknown
        }
    }

    /// Classify an HTTP status, falling back to the message text
    pub fn from_status(status: u16, message: &str) -> Self {
        match status {
            429 => Self::Quota,
            401 | 403 => Self::Permission,
            400 => Self::MalformedInput,
            _ => Self::classify(message),
        }
    }
}

/// Error returned by collaborator adapters
#[derive(Debug, Clone, Error)]
#[error("{cause} error: {message}")]
pub struct ServiceError {
    pub cause: ServiceErrorCause,
    pub message: String,
}

impl ServiceError {
    pub fn new(cause: ServiceErrorCause, message: impl Into<String>) -> Self {
        Self {
            cause,
            message: message.into(),
        }
    }

    /// Error whose cause is inferred from its message
    pub fn from_message(message: impl Into<String>) -> Self {
        let message = message.into();
        Self {
            cause: ServiceErrorCause::classify(&message),
            message,
        }
    }

    /// A call that did not answer within its time budget
    pub fn timeout(service: &str, after: std::time::Duration) -> Self {
        Self::new(
            ServiceErrorCause::Quota,
            format!("{} did not respond within {:?}", service, after),
        )
    }
}

/// OCR + vision annotation service
#[async_trait]
pub trait VisionService: Send + Sync {
    /// Service name for logs
    fn name(&self) -> &'static str;

    /// Annotate document bytes with the requested features
    ///
    /// # Errors
    /// Returns `ServiceError` for transport failures and service-reported errors
    async fn annotate(&self, request: &VisionRequest<'_>) -> Result<AnnotationBundle, ServiceError>;
}

/// Vision-language model answering a prompt about an image
#[async_trait]
pub trait GenerativeService: Send + Sync {
    /// Service name for logs
    fn name(&self) -> &'static str;

    /// Free-text model answer
    ///
    /// # Errors
    /// Returns `ServiceError` for transport failures and service-reported errors
    async fn generate(&self, request: &GenerativeRequest<'_>) -> Result<String, ServiceError>;
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_type_parsing() {
        assert_eq!(MediaType::from_mime("image/jpg"), Some(MediaType::Jpeg));
        assert_eq!(MediaType::from_mime(" Image/PNG "), Some(MediaType::Png));
        assert_eq!(MediaType::from_mime("application/pdf"), Some(MediaType::Pdf));
        assert_eq!(MediaType::from_mime("text/plain"), None);
        assert_eq!(MediaType::from_mime("image/svg+xml"), None);
    }

    #[test]
    fn test_analysis_input_validation() {
        assert!(matches!(
            AnalysisInput::new(vec![1, 2, 3], "text/html"),
            Err(AnalysisError::UnsupportedMediaType(m)) if m == "text/html"
        ));
        assert!(matches!(
            AnalysisInput::new(Vec::new(), "image/png"),
            Err(AnalysisError::EmptyInput)
        ));

        let input = AnalysisInput::new(vec![0xFF, 0xD8], "image/jpeg").unwrap();
        assert_eq!(input.media_type, MediaType::Jpeg);
        assert_eq!(input.len(), 2);
    }

    #[test]
    fn test_annotation_percent_rounds() {
        assert_eq!(Annotation::new("x", 0.876).percent(), 88);
        assert_eq!(Annotation::new("x", 0.3).percent(), 30);
    }

    #[test]
    fn test_element_merge_is_or_and_concat() {
        let mut vision = SecurityElementSet::default();
        vision.add_logo("Acme (91%)");

        let mut text = SecurityElementSet::default();
        text.add_logo("Organization in text: Acme");
        text.add_seal("Certification keyword: certificado (+3)");

        vision.merge(text);
        assert!(vision.logos && vision.seals && !vision.signatures);
        assert_eq!(
            vision.logo_details,
            vec!["Acme (91%)".to_string(), "Organization in text: Acme".to_string()]
        );
        assert_eq!(vision.seal_details.len(), 1);
    }

    #[test]
    fn test_generative_signal_camel_case_and_unknown_type() {
        let json = r#"{
            "hasSignatures": true, "signatureCount": 1,
            "hasSeals": false, "sealCount": 0, "hasWatermarks": false,
            "formatConsistency": 120, "overallSecurity": 40,
            "documentType": "passport", "authenticityScore": 75
        }"#;
        let signal: GenerativeSignal = serde_json::from_str(json).unwrap();
        assert_eq!(signal.document_type, DocumentType::Other);
        assert!(signal.suspicious_elements.is_empty());
        assert_eq!(signal.normalized().format_consistency, 100.0);
    }

    #[test]
    fn test_document_type_labels_ignore_case() {
        assert_eq!(DocumentType::from_label("Certificate"), DocumentType::Certificate);
        assert_eq!(DocumentType::from_label(" DIPLOMA "), DocumentType::Diploma);
        assert_eq!(DocumentType::from_label("Passport"), DocumentType::Other);
        let parsed: DocumentType = serde_json::from_str(r#""Transcript""#).unwrap();
        assert_eq!(parsed, DocumentType::Transcript);
        assert_eq!(serde_json::to_string(&DocumentType::License).unwrap(), r#""license""#);
    }

    #[test]
    fn test_service_error_classification() {
        assert_eq!(ServiceErrorCause::from_status(429, ""), ServiceErrorCause::Quota);
        assert_eq!(ServiceErrorCause::from_status(403, ""), ServiceErrorCause::Permission);
        assert_eq!(ServiceErrorCause::from_status(400, ""), ServiceErrorCause::MalformedInput);
        assert_eq!(
            ServiceErrorCause::from_status(500, "RESOURCE_EXHAUSTED: Quota exceeded"),
            ServiceErrorCause::Quota
        );
        assert_eq!(
            ServiceErrorCause::classify("Bad image data."),
            ServiceErrorCause::MalformedInput
        );
        assert_eq!(ServiceErrorCause::classify("connection reset"), ServiceErrorCause::Unknown);
    }

    #[test]
    fn test_unreadable_quality() {
        let q = QualityAssessment::unreadable();
        assert_eq!(q.text_clarity, QualityLevel::Low);
        assert_eq!(q.resolution, QualityLevel::Medium);
        assert_eq!(q.structure, DocumentStructure::Doubtful);
    }
}
