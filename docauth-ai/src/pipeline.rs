//! Analysis Pipeline
//!
//! Orchestrates one document analysis end to end.
//!
//! # Phases
//! 1. **Validate**: supported mime type, non-empty buffer
//! 2. **Extract**: OCR/vision call (the only fallible external step)
//! 3. **Assess**: text clarity and document structure
//! 4. **Detect**: vision-side and text-side security elements, merged
//! 5. **Generative**: optional second opinion, gated and best-effort
//! 6. **Refine**: fold the generative signal into elements and structure
//! 7. **Fuse**: deterministic score and recommendation
//!
//! The analyzer holds no per-request state; one instance can serve any
//! number of concurrent analyses.
//!
//! # Example
//! ```rust,ignore
//! let analyzer = DocumentAnalyzer::from_settings(&settings);
//! let report = analyzer.analyze(bytes, "image/png").await?;
//! println!("{} -> {}", report.result.score, report.result.recommendation);
//! ```

use crate::config::AnalyzerSettings;
use crate::detectors::{detect_elements, DetectionRules};
use crate::error::AnalysisResult;
use crate::extractors::{
    apply_generative_signal, CloudVisionClient, GeminiClient, GenerativeAnalyzer, VisionExtractor,
};
use crate::fusion::fuse;
use crate::types::{
    AnalysisInput, FusedResult, GenerativeService, GenerativeSignal, MediaType, QualityAssessment,
    RawExtraction, SecurityElementSet, VisionService,
};
use crate::validators::QualityAssessor;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

/// Everything one analysis produced, ready for persistence
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub analysis_id: Uuid,
    pub analyzed_at: DateTime<Utc>,
    pub media_type: MediaType,
    pub size_bytes: usize,
    pub extraction: RawExtraction,
    /// Quality after generative refinement
    pub quality: QualityAssessment,
    /// Elements after generative refinement
    pub elements: SecurityElementSet,
    /// Absent when the generative signal was not requested
    pub generative: Option<GenerativeSignal>,
    pub result: FusedResult,
}

/// Document Analyzer
pub struct DocumentAnalyzer {
    extractor: VisionExtractor,
    generative: GenerativeAnalyzer,
    rules: Arc<DetectionRules>,
    assessor: QualityAssessor,
}

impl DocumentAnalyzer {
    /// Analyzer over injected collaborators with default settings
    pub fn new(
        vision: Arc<dyn VisionService>,
        generative: Option<Arc<dyn GenerativeService>>,
    ) -> Self {
        Self {
            extractor: VisionExtractor::new(vision),
            generative: generative.map_or_else(GenerativeAnalyzer::disabled, GenerativeAnalyzer::new),
            rules: DetectionRules::shared(),
            assessor: QualityAssessor::new(),
        }
    }

    /// Analyzer over the HTTP clients described by `settings`
    pub fn from_settings(settings: &AnalyzerSettings) -> Self {
        let vision = &settings.vision;
        let client = CloudVisionClient::with_endpoint(
            vision.api_key.clone(),
            vision.endpoint.clone(),
            vision.requests_per_minute,
        );
        let extractor = VisionExtractor::new(Arc::new(client))
            .with_language_hints(vision.language_hints.clone())
            .with_timeout(vision.timeout);

        let generative = match &settings.generative {
            Some(generative) => {
                let client = GeminiClient::with_endpoint(
                    generative.api_key.clone(),
                    generative.endpoint.clone(),
                    generative.model.clone(),
                    generative.requests_per_minute,
                );
                GenerativeAnalyzer::new(Arc::new(client))
                    .with_max_bytes(generative.max_bytes)
                    .with_timeout(generative.timeout)
            }
            None => GenerativeAnalyzer::disabled(),
        };

        Self {
            extractor,
            generative,
            rules: DetectionRules::shared(),
            assessor: QualityAssessor::new(),
        }
    }

    pub fn with_extractor(mut self, extractor: VisionExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    pub fn with_generative(mut self, generative: GenerativeAnalyzer) -> Self {
        self.generative = generative;
        self
    }

    /// Use custom detection tables, owned or shared between analyzers
    pub fn with_rules(mut self, rules: impl Into<Arc<DetectionRules>>) -> Self {
        self.rules = rules.into();
        self
    }

    pub fn with_assessor(mut self, assessor: QualityAssessor) -> Self {
        self.assessor = assessor;
        self
    }

    pub fn generative_enabled(&self) -> bool {
        self.generative.is_enabled()
    }

    /// Analyze raw bytes with a declared mime type
    ///
    /// # Errors
    /// - `UnsupportedMediaType` / `EmptyInput` for invalid input
    /// - `ExternalService` when OCR fails on an image input
    pub async fn analyze(&self, bytes: Vec<u8>, mime: &str) -> AnalysisResult<AnalysisReport> {
        let input = AnalysisInput::new(bytes, mime)?;
        self.analyze_input(&input).await
    }

    /// Analyze a validated input
    pub async fn analyze_input(&self, input: &AnalysisInput) -> AnalysisResult<AnalysisReport> {
        let analysis_id = Uuid::new_v4();
        info!(
            %analysis_id,
            media_type = %input.media_type,
            size_bytes = input.len(),
            "Starting document analysis"
        );

        // Phase 2: Extract
        let extraction = self.extractor.extract(input).await?;

        // Phase 3-4: Assess and detect
        let mut quality = self.assessor.assess(&extraction, &self.rules);
        let mut elements = detect_elements(&extraction, &self.rules);
        debug!(
            seals = elements.seals,
            signatures = elements.signatures,
            logos = elements.logos,
            "Heuristic detection complete"
        );

        // Phase 5-6: Generative signal
        let generative = self.generative.analyze(input).await;
        if let Some(signal) = &generative {
            apply_generative_signal(&mut elements, &mut quality, signal);
        }

        // Phase 7: Fuse; placeholder text is not document text
        let scored_text = if extraction.is_fallback() {
            ""
        } else {
            extraction.text.as_str()
        };
        let result = fuse(&quality, &elements, scored_text, generative.as_ref());

        info!(
            %analysis_id,
            score = result.score,
            recommendation = %result.recommendation,
            generative = generative.is_some(),
            fallback_extraction = extraction.is_fallback(),
            "Document analysis complete"
        );

        Ok(AnalysisReport {
            analysis_id,
            analyzed_at: Utc::now(),
            media_type: input.media_type,
            size_bytes: input.len(),
            extraction,
            quality,
            elements,
            generative,
            result,
        })
    }
}
