//! Bootstrap configuration loading
//!
//! Resolution priority used by the services:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. Compiled default (fallback)
//!
//! This module owns tiers 3 and 4. Tiers 1 and 2 are handled by each
//! service's `clap` argument parser.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Default HTTP port (matches the capture client's expectation)
pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_BIND: &str = "0.0.0.0";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_DETECTIONS_PATH: &str = "data/detections.json";
/// 10 MiB
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
pub const DEFAULT_UPSTREAM_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_ALLOWED_MEDIA_TYPES: &[&str] = &[
    "image/jpeg",
    "image/png",
    "image/webp",
    "image/heic",
    "image/heif",
];

/// Values used when neither CLI, environment nor TOML supply a setting
#[derive(Debug, Clone)]
pub struct CompiledDefaults {
    pub port: u16,
    pub bind: String,
    pub gemini_model: String,
    pub gemini_base_url: String,
    pub detections_path: PathBuf,
    pub max_upload_bytes: usize,
    pub allowed_media_types: Vec<String>,
    pub upstream_timeout_secs: u64,
    pub log_level: String,
}

impl Default for CompiledDefaults {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            bind: DEFAULT_BIND.to_string(),
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            gemini_base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            detections_path: PathBuf::from(DEFAULT_DETECTIONS_PATH),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            allowed_media_types: DEFAULT_ALLOWED_MEDIA_TYPES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            upstream_timeout_secs: DEFAULT_UPSTREAM_TIMEOUT_SECS,
            log_level: default_log_level(),
        }
    }
}

/// Bootstrap configuration loaded from TOML file
///
/// Every field is optional; anything left out falls through to the
/// compiled defaults. The file is read once at startup.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TomlConfig {
    #[serde(default)]
    pub port: Option<u16>,

    #[serde(default)]
    pub bind: Option<String>,

    /// Generative-AI API key (prefer the environment for secrets)
    #[serde(default)]
    pub gemini_api_key: Option<String>,

    #[serde(default)]
    pub gemini_model: Option<String>,

    #[serde(default)]
    pub gemini_base_url: Option<String>,

    /// Allowed cross-origin client address
    #[serde(default)]
    pub client_origin: Option<String>,

    /// Packaged static detection dataset
    #[serde(default)]
    pub detections_path: Option<PathBuf>,

    /// Live detection endpoint; when set it replaces the static dataset
    #[serde(default)]
    pub detection_api_url: Option<String>,

    #[serde(default)]
    pub max_upload_bytes: Option<usize>,

    #[serde(default)]
    pub allowed_media_types: Option<Vec<String>>,

    #[serde(default)]
    pub upstream_timeout_secs: Option<u64>,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Per-user config file location: `<config_dir>/reefscan/reefscan.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("reefscan").join("reefscan.toml"))
}

/// Read and parse a TOML config file
pub fn load_toml_config(path: &Path) -> Result<TomlConfig> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::Config(format!("Read {} failed: {}", path.display(), e)))?;

    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Parse {} failed: {}", path.display(), e)))
}

/// Load the TOML config if it exists
///
/// A missing file is not an error: logs a warning and returns defaults.
/// A file that exists but does not parse IS an error.
pub fn load_toml_config_or_default(path: Option<&Path>) -> Result<TomlConfig> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => match default_config_path() {
            Some(p) => p,
            None => {
                warn!("Could not determine config directory, using defaults");
                return Ok(TomlConfig::default());
            }
        },
    };

    if !path.exists() {
        warn!("Config file {} not found, using defaults", path.display());
        return Ok(TomlConfig::default());
    }

    let config = load_toml_config(&path)?;
    info!("Loaded config from {}", path.display());
    Ok(config)
}

/// Non-empty, non-whitespace
pub fn is_valid_key(key: &str) -> bool {
    !key.trim().is_empty()
}
