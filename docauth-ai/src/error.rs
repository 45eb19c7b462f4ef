//! Error types for docauth-ai
//!
//! Only caller-visible failures live here. Generative-analysis and response
//! parsing failures are absorbed inside the generative adapter and never
//! reach this type.

use crate::types::{ServiceError, ServiceErrorCause};
use thiserror::Error;

/// Analysis error surfaced to the caller
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Mime type outside the supported set
    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),

    /// Zero-length document buffer
    #[error("Empty input: document has no bytes")]
    EmptyInput,

    /// OCR/vision service failure on an image input
    #[error("External service error ({cause}): {message}")]
    ExternalService {
        cause: ServiceErrorCause,
        message: String,
    },
}

impl From<ServiceError> for AnalysisError {
    fn from(err: ServiceError) -> Self {
        AnalysisError::ExternalService {
            cause: err.cause,
            message: err.message,
        }
    }
}

impl AnalysisError {
    /// Cause tag for external service failures
    pub fn service_cause(&self) -> Option<ServiceErrorCause> {
        match self {
            AnalysisError::ExternalService { cause, .. } => Some(*cause),
            _ => None,
        }
    }
}

/// Result type for analysis operations
pub type AnalysisResult<T> = Result<T, AnalysisError>;
