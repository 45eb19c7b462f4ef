//! docauth-ai library interface
//!
//! Document authenticity analysis: OCR/vision extraction, heuristic
//! security-element detection, an optional generative second opinion, and
//! deterministic score fusion.

pub mod config;
pub mod detectors;
pub mod error;
pub mod extractors;
pub mod fusion;
pub mod pipeline;
pub mod types;
pub mod validators;

pub use crate::error::{AnalysisError, AnalysisResult};
pub use crate::pipeline::{AnalysisReport, DocumentAnalyzer};
