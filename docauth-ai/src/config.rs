//! Analyzer settings resolution
//!
//! API keys resolve with ENV → TOML priority. Everything else comes from the
//! TOML bootstrap file or falls back to the built-in defaults.

use crate::extractors::generative_analyzer::{DEFAULT_GENERATIVE_TIMEOUT, DEFAULT_MAX_BYTES};
use crate::extractors::generative_client::{
    DEFAULT_GENERATIVE_ENDPOINT, DEFAULT_GENERATIVE_MODEL, DEFAULT_GENERATIVE_RPM,
};
use crate::extractors::vision_client::{DEFAULT_VISION_ENDPOINT, DEFAULT_VISION_RPM};
use crate::extractors::vision_extractor::{DEFAULT_LANGUAGE_HINTS, DEFAULT_OCR_TIMEOUT};
use docauth_common::config::TomlConfig;
use docauth_common::{Error, Result};
use std::time::Duration;
use tracing::{info, warn};

/// Environment variable holding the vision API key
pub const VISION_API_KEY_ENV: &str = "DOCAUTH_VISION_API_KEY";

/// Environment variable holding the generative API key
pub const GENERATIVE_API_KEY_ENV: &str = "DOCAUTH_GENERATIVE_API_KEY";

/// OCR/vision client settings
#[derive(Debug, Clone)]
pub struct VisionSettings {
    pub api_key: String,
    pub endpoint: String,
    pub language_hints: Vec<String>,
    pub timeout: Duration,
    pub requests_per_minute: u32,
}

/// Generative client settings
#[derive(Debug, Clone)]
pub struct GenerativeSettings {
    pub api_key: String,
    pub endpoint: String,
    pub model: String,
    pub timeout: Duration,
    /// Size gate: documents at or above this many bytes get no signal
    pub max_bytes: usize,
    pub requests_per_minute: u32,
}

/// Fully resolved analyzer settings
#[derive(Debug, Clone)]
pub struct AnalyzerSettings {
    pub vision: VisionSettings,
    /// `None` when no generative key is configured or the section is disabled
    pub generative: Option<GenerativeSettings>,
}

impl AnalyzerSettings {
    /// Resolve settings from environment and TOML
    ///
    /// # Errors
    /// `Error::Config` when no vision API key is configured
    pub fn resolve(toml_config: &TomlConfig) -> Result<Self> {
        let vision_section = &toml_config.vision;
        let vision = VisionSettings {
            api_key: resolve_vision_api_key(toml_config)?,
            endpoint: vision_section
                .endpoint
                .clone()
                .unwrap_or_else(|| DEFAULT_VISION_ENDPOINT.to_string()),
            language_hints: vision_section
                .language_hints
                .clone()
                .filter(|hints| !hints.is_empty())
                .unwrap_or_else(|| DEFAULT_LANGUAGE_HINTS.iter().map(|h| h.to_string()).collect()),
            timeout: vision_section
                .timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_OCR_TIMEOUT),
            requests_per_minute: vision_section.requests_per_minute.unwrap_or(DEFAULT_VISION_RPM),
        };

        let generative_section = &toml_config.generative;
        let generative = if generative_section.enabled == Some(false) {
            info!("Generative analysis disabled in TOML config");
            None
        } else {
            resolve_generative_api_key(toml_config).map(|api_key| GenerativeSettings {
                api_key,
                endpoint: generative_section
                    .endpoint
                    .clone()
                    .unwrap_or_else(|| DEFAULT_GENERATIVE_ENDPOINT.to_string()),
                model: generative_section
                    .model
                    .clone()
                    .unwrap_or_else(|| DEFAULT_GENERATIVE_MODEL.to_string()),
                timeout: generative_section
                    .timeout_secs
                    .map(Duration::from_secs)
                    .unwrap_or(DEFAULT_GENERATIVE_TIMEOUT),
                max_bytes: generative_section.max_bytes.unwrap_or(DEFAULT_MAX_BYTES),
                requests_per_minute: generative_section
                    .requests_per_minute
                    .unwrap_or(DEFAULT_GENERATIVE_RPM),
            })
        };

        Ok(Self { vision, generative })
    }

    /// Drop the generative client (e.g. `--no-generative`)
    pub fn without_generative(mut self) -> Self {
        self.generative = None;
        self
    }
}

/// Resolve the vision API key
///
/// **Priority:** ENV → TOML
///
/// # Errors
/// `Error::Config` when neither source holds a valid key
pub fn resolve_vision_api_key(toml_config: &TomlConfig) -> Result<String> {
    resolve_key(
        "Vision",
        VISION_API_KEY_ENV,
        toml_config.vision.api_key.as_deref(),
    )
    .ok_or_else(|| {
        Error::Config(format!(
            "Vision API key not configured. Please configure using one of:\n\
             1. Environment: {}=your-key-here\n\
             2. TOML config: ~/.config/docauth/config.toml ([vision] api_key = \"your-key\")",
            VISION_API_KEY_ENV
        ))
    })
}

/// Resolve the generative API key; `None` disables the generative signal
pub fn resolve_generative_api_key(toml_config: &TomlConfig) -> Option<String> {
    let key = resolve_key(
        "Generative",
        GENERATIVE_API_KEY_ENV,
        toml_config.generative.api_key.as_deref(),
    );
    if key.is_none() {
        info!("Generative API key not configured; generative signal disabled");
    }
    key
}

fn resolve_key(service: &str, env_var: &str, toml_key: Option<&str>) -> Option<String> {
    let env_key = std::env::var(env_var).ok().filter(|k| is_valid_key(k));
    let toml_key = toml_key.filter(|k| is_valid_key(k));

    if env_key.is_some() && toml_key.is_some() {
        warn!(
            "{} API key found in multiple sources: environment, TOML. Using environment (highest priority).",
            service
        );
    }

    if let Some(key) = env_key {
        info!("{} API key loaded from environment variable", service);
        return Some(key);
    }
    if let Some(key) = toml_key {
        info!("{} API key loaded from TOML config", service);
        return Some(key.to_string());
    }
    None
}

/// Validate API key (non-empty, non-whitespace)
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_valid_key() {
        assert!(is_valid_key("abc123"));
        assert!(!is_valid_key(""));
        assert!(!is_valid_key("   \t"));
    }
}
