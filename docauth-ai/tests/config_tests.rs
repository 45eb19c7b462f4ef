//! Analyzer settings resolution tests
//!
//! Tests that touch DOCAUTH_VISION_API_KEY / DOCAUTH_GENERATIVE_API_KEY are
//! marked #[serial] so they never run in parallel with each other.

use docauth_ai::config::{
    is_valid_key, resolve_generative_api_key, resolve_vision_api_key, AnalyzerSettings,
    GENERATIVE_API_KEY_ENV, VISION_API_KEY_ENV,
};
use docauth_ai::DocumentAnalyzer;
use docauth_common::config::{load_toml_config, TomlConfig};
use docauth_common::Error;
use serial_test::serial;
use std::io::Write;
use std::time::Duration;
use tempfile::NamedTempFile;

fn clear_env() {
    std::env::remove_var(VISION_API_KEY_ENV);
    std::env::remove_var(GENERATIVE_API_KEY_ENV);
}

fn toml_with_keys(vision: Option<&str>, generative: Option<&str>) -> TomlConfig {
    let mut config = TomlConfig::default();
    config.vision.api_key = vision.map(str::to_string);
    config.generative.api_key = generative.map(str::to_string);
    config
}

// ============================================================================
// Key resolution
// ============================================================================

#[test]
#[serial]
fn test_env_overrides_toml() {
    clear_env();
    std::env::set_var(VISION_API_KEY_ENV, "env-vision");

    let key = resolve_vision_api_key(&toml_with_keys(Some("toml-vision"), None)).unwrap();
    assert_eq!(key, "env-vision");

    clear_env();
}

#[test]
#[serial]
fn test_toml_used_when_env_missing_or_blank() {
    clear_env();
    let config = toml_with_keys(Some("toml-vision"), None);
    assert_eq!(resolve_vision_api_key(&config).unwrap(), "toml-vision");

    std::env::set_var(VISION_API_KEY_ENV, "   ");
    assert_eq!(resolve_vision_api_key(&config).unwrap(), "toml-vision");

    clear_env();
}

#[test]
#[serial]
fn test_missing_vision_key_is_config_error() {
    clear_env();
    let err = resolve_vision_api_key(&toml_with_keys(Some(""), None)).unwrap_err();
    match err {
        Error::Config(message) => assert!(message.contains(VISION_API_KEY_ENV)),
        other => panic!("expected config error, got {:?}", other),
    }
    assert!(AnalyzerSettings::resolve(&TomlConfig::default()).is_err());
}

#[test]
#[serial]
fn test_missing_generative_key_disables_signal() {
    clear_env();
    let config = toml_with_keys(Some("vision"), None);

    assert!(resolve_generative_api_key(&config).is_none());
    let settings = AnalyzerSettings::resolve(&config).unwrap();
    assert!(settings.generative.is_none());
    assert!(!DocumentAnalyzer::from_settings(&settings).generative_enabled());
}

#[test]
#[serial]
fn test_generative_key_from_env() {
    clear_env();
    std::env::set_var(GENERATIVE_API_KEY_ENV, "env-generative");

    let settings = AnalyzerSettings::resolve(&toml_with_keys(Some("vision"), None)).unwrap();
    let generative = settings.generative.as_ref().unwrap();
    assert_eq!(generative.api_key, "env-generative");
    assert!(DocumentAnalyzer::from_settings(&settings).generative_enabled());

    let without = settings.without_generative();
    assert!(without.generative.is_none());

    clear_env();
}

#[test]
fn test_is_valid_key() {
    assert!(is_valid_key("k"));
    assert!(!is_valid_key(" \n"));
}

// ============================================================================
// Settings from TOML
// ============================================================================

#[test]
#[serial]
fn test_defaults_applied() {
    clear_env();
    let settings =
        AnalyzerSettings::resolve(&toml_with_keys(Some("vision"), Some("generative"))).unwrap();

    assert_eq!(settings.vision.language_hints, vec!["es".to_string(), "en".to_string()]);
    assert_eq!(settings.vision.timeout, Duration::from_secs(30));

    let generative = settings.generative.unwrap();
    assert_eq!(generative.max_bytes, 20 * 1024 * 1024);
    assert_eq!(generative.timeout, Duration::from_secs(30));
}

#[test]
#[serial]
fn test_toml_sections_override_defaults() {
    clear_env();
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
[vision]
api_key = "v-key"
endpoint = "http://localhost:9000/annotate"
language_hints = ["pt"]
timeout_secs = 5
requests_per_minute = 10

[generative]
api_key = "g-key"
model = "test-model"
timeout_secs = 12
max_bytes = 1024
"#
    )
    .unwrap();

    let config = load_toml_config(file.path()).unwrap();
    let settings = AnalyzerSettings::resolve(&config).unwrap();

    assert_eq!(settings.vision.endpoint, "http://localhost:9000/annotate");
    assert_eq!(settings.vision.language_hints, vec!["pt".to_string()]);
    assert_eq!(settings.vision.timeout, Duration::from_secs(5));
    assert_eq!(settings.vision.requests_per_minute, 10);

    let generative = settings.generative.unwrap();
    assert_eq!(generative.model, "test-model");
    assert_eq!(generative.timeout, Duration::from_secs(12));
    assert_eq!(generative.max_bytes, 1024);
}

#[test]
#[serial]
fn test_generative_section_can_be_disabled() {
    clear_env();
    let mut config = toml_with_keys(Some("vision"), Some("generative"));
    config.generative.enabled = Some(false);

    let settings = AnalyzerSettings::resolve(&config).unwrap();
    assert!(settings.generative.is_none());
}
