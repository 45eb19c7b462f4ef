//! Extraction quality validators

pub mod quality_assessor;

pub use quality_assessor::{assess_quality, QualityAssessor};
