//! Scripted collaborators
//!
//! In-process [`VisionService`] / [`GenerativeService`] doubles that return a
//! fixed answer, fail with a fixed cause, or never answer. Each counts its
//! calls so tests can assert that a service was (or was not) contacted.

use async_trait::async_trait;
use docauth_ai::types::{
    Annotation, AnnotationBundle, GenerativeRequest, GenerativeService, ServiceError,
    ServiceErrorCause, VisionRequest, VisionService,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// OCR text of a small certificate
///
/// 9 words: "certificado" (+3) and "otorgado" (+2) are certification
/// keywords; "otorgado" and "director" are the two formality keywords;
/// the last line is a name-title signature line.
pub const CERTIFICATE_TEXT: &str = "CERTIFICADO\nOtorgado a Laura Gómez\nCarlos Méndez - Director";

/// Bundle for [`CERTIFICATE_TEXT`] with one confident logo
pub fn certificate_bundle() -> AnnotationBundle {
    AnnotationBundle {
        full_text: Some(CERTIFICATE_TEXT.to_string()),
        text_annotations: vec![CERTIFICATE_TEXT.to_string(), "CERTIFICADO".to_string()],
        logos: vec![Annotation::new("Microsoft", 0.9)],
        objects: vec![],
        labels: vec![Annotation::new("Document", 0.95)],
        ..Default::default()
    }
}

/// Model answer wrapping a signal object in prose
pub fn signal_json(
    signature_count: u32,
    seal_count: u32,
    format_consistency: u32,
    authenticity_score: u32,
    document_type: &str,
) -> String {
    format!(
        "Analysis result:\n{{\"hasSignatures\": {}, \"signatureCount\": {}, \"hasSeals\": {}, \
         \"sealCount\": {}, \"hasWatermarks\": false, \"formatConsistency\": {}, \
         \"overallSecurity\": 80, \"suspiciousElements\": [], \"documentType\": \"{}\", \
         \"authenticityScore\": {}}}",
        signature_count > 0,
        signature_count,
        seal_count > 0,
        seal_count,
        format_consistency,
        document_type,
        authenticity_score
    )
}

enum Script<T> {
    Answer(T),
    Fail(ServiceErrorCause, String),
    Hang,
}

async fn play<T: Clone>(script: &Script<T>) -> Result<T, ServiceError> {
    match script {
        Script::Answer(value) => Ok(value.clone()),
        Script::Fail(cause, message) => Err(ServiceError::new(*cause, message.clone())),
        Script::Hang => {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Err(ServiceError::from_message("unreachable"))
        }
    }
}

/// Scripted vision service
pub struct MockVision {
    script: Script<AnnotationBundle>,
    calls: AtomicUsize,
    last_language_hints: Mutex<Vec<String>>,
}

impl MockVision {
    fn with_script(script: Script<AnnotationBundle>) -> Arc<Self> {
        Arc::new(Self {
            script,
            calls: AtomicUsize::new(0),
            last_language_hints: Mutex::new(Vec::new()),
        })
    }

    pub fn returning(bundle: AnnotationBundle) -> Arc<Self> {
        Self::with_script(Script::Answer(bundle))
    }

    pub fn failing(cause: ServiceErrorCause, message: &str) -> Arc<Self> {
        Self::with_script(Script::Fail(cause, message.to_string()))
    }

    pub fn hanging() -> Arc<Self> {
        Self::with_script(Script::Hang)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_language_hints(&self) -> Vec<String> {
        self.last_language_hints.lock().unwrap().clone()
    }
}

#[async_trait]
impl VisionService for MockVision {
    fn name(&self) -> &'static str {
        "MockVision"
    }

    async fn annotate(&self, request: &VisionRequest<'_>) -> Result<AnnotationBundle, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_language_hints.lock().unwrap() = request.language_hints.to_vec();
        play(&self.script).await
    }
}

/// Scripted generative service
pub struct MockGenerative {
    script: Script<String>,
    calls: AtomicUsize,
}

impl MockGenerative {
    fn with_script(script: Script<String>) -> Arc<Self> {
        Arc::new(Self {
            script,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn replying(text: impl Into<String>) -> Arc<Self> {
        Self::with_script(Script::Answer(text.into()))
    }

    pub fn failing(cause: ServiceErrorCause, message: &str) -> Arc<Self> {
        Self::with_script(Script::Fail(cause, message.to_string()))
    }

    pub fn hanging() -> Arc<Self> {
        Self::with_script(Script::Hang)
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl GenerativeService for MockGenerative {
    fn name(&self) -> &'static str {
        "MockGenerative"
    }

    async fn generate(&self, _request: &GenerativeRequest<'_>) -> Result<String, ServiceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        play(&self.script).await
    }
}
