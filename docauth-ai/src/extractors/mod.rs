//! Extraction collaborators
//!
//! # Modules
//! 1. **vision_client** - Cloud Vision HTTP adapter ([`crate::types::VisionService`])
//! 2. **vision_extractor** - OCR call, text cleaning, PDF fallback policy
//! 3. **generative_client** - Gemini HTTP adapter ([`crate::types::GenerativeService`])
//! 4. **generative_analyzer** - Gated best-effort generative signal
//!
//! Only the vision extractor can fail an analysis, and only for image
//! inputs. Generative failures always degrade to the fallback signal.

pub mod generative_analyzer;
pub mod generative_client;
pub mod vision_client;
pub mod vision_extractor;

pub use generative_analyzer::{
    apply_generative_signal, parse_structured_response, GenerativeAnalyzer, GenerativeError,
    ParseError,
};
pub use generative_client::GeminiClient;
pub use vision_client::CloudVisionClient;
pub use vision_extractor::{clean_text, VisionExtractor};
