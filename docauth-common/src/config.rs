//! Bootstrap configuration loading and config-file discovery
//!
//! Configuration sources, highest priority first:
//! 1. Command-line argument (explicit `--config` path)
//! 2. Environment variables (resolved per setting by the consuming crate)
//! 3. TOML config file
//! 4. Built-in defaults (code constants)

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_PATH_ENV: &str = "DOCAUTH_CONFIG";

/// Bootstrap configuration loaded from TOML
///
/// Every section is optional; missing values fall back to built-in defaults
/// when the consuming crate resolves its settings.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TomlConfig {
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// OCR/vision service section
    #[serde(default)]
    pub vision: VisionSection,

    /// Generative document analyzer section
    #[serde(default)]
    pub generative: GenerativeSection,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log level or filter directives (e.g. "info", "docauth_ai=debug")
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Include module targets in log lines
    #[serde(default)]
    pub show_targets: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            show_targets: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// `[vision]` section
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct VisionSection {
    pub api_key: Option<String>,
    pub endpoint: Option<String>,
    pub language_hints: Option<Vec<String>>,
    pub timeout_secs: Option<u64>,
    pub requests_per_minute: Option<u32>,
}

/// `[generative]` section
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct GenerativeSection {
    /// Set to false to never request the secondary signal
    pub enabled: Option<bool>,
    pub api_key: Option<String>,
    pub endpoint: Option<String>,
    pub model: Option<String>,
    pub timeout_secs: Option<u64>,
    /// Inputs at or above this size are never sent
    pub max_bytes: Option<usize>,
    pub requests_per_minute: Option<u32>,
}

/// Read and parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read TOML {} failed: {}", path.display(), e)))?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse TOML {} failed: {}", path.display(), e)))
}

/// Resolve the bootstrap configuration
///
/// An explicit path (argument, then `DOCAUTH_CONFIG`) must exist and parse.
/// A discovered file that fails to parse is reported and replaced by defaults,
/// and a missing file silently yields defaults.
pub fn resolve_toml_config(cli_path: Option<&Path>) -> Result<TomlConfig> {
    if let Some(path) = cli_path {
        return load_toml_config(path);
    }

    if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
        return load_toml_config(Path::new(&path));
    }

    match locate_config_file() {
        Some(path) => match load_toml_config(&path) {
            Ok(config) => {
                debug!("Loaded configuration from {}", path.display());
                Ok(config)
            }
            Err(e) => {
                warn!("Ignoring unreadable config file: {}", e);
                Ok(TomlConfig::default())
            }
        },
        None => {
            debug!("No config file found, using built-in defaults");
            Ok(TomlConfig::default())
        }
    }
}

/// Find the platform config file, if one exists
///
/// Linux checks the per-user location before `/etc/docauth/config.toml`.
pub fn locate_config_file() -> Option<PathBuf> {
    let user_config = dirs::config_dir().map(|d| d.join("docauth").join("config.toml"));
    if let Some(path) = user_config {
        if path.exists() {
            return Some(path);
        }
    }

    if cfg!(target_os = "linux") {
        let system_config = PathBuf::from("/etc/docauth/config.toml");
        if system_config.exists() {
            return Some(system_config);
        }
    }

    None
}
