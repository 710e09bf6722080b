//! Configuration resolution for reefscan-api
//!
//! **Priority:** command line → environment → TOML → compiled default
//!
//! `clap` covers the first two tiers (every flag has an `env` fallback);
//! [`reefscan_common::config`] covers the TOML file and the defaults.

use clap::Parser;
use reefscan_common::config::{is_valid_key, CompiledDefaults, TomlConfig};
use reefscan_common::{Error, Result};
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

/// Secondary environment variable accepted for the API key
pub const FALLBACK_API_KEY_ENV: &str = "GOOGLE_API_KEY";

/// Command-line arguments for reefscan-api
#[derive(Parser, Debug, Clone, Default)]
#[command(name = "reefscan-api")]
#[command(about = "Detection reconciliation service for marine-species images")]
#[command(version)]
pub struct Args {
    /// Port to listen on
    #[arg(short, long, env = "PORT")]
    pub port: Option<u16>,

    /// Address to bind
    #[arg(long, env = "REEFSCAN_BIND")]
    pub bind: Option<String>,

    /// Gemini API key
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    pub gemini_api_key: Option<String>,

    /// Gemini model name
    #[arg(long, env = "GEMINI_MODEL")]
    pub gemini_model: Option<String>,

    /// Allowed cross-origin client address (any origin when unset)
    #[arg(long, env = "CLIENT_ORIGIN")]
    pub client_origin: Option<String>,

    /// Static baseline detection dataset (JSON)
    #[arg(short, long, env = "REEFSCAN_DETECTIONS")]
    pub detections: Option<PathBuf>,

    /// Live detection endpoint; replaces the static dataset when set
    #[arg(long, env = "ML_MODEL_API")]
    pub detection_api_url: Option<String>,

    /// Maximum accepted image size in bytes
    #[arg(long, env = "REEFSCAN_MAX_UPLOAD_BYTES")]
    pub max_upload_bytes: Option<usize>,

    /// Timeout for outbound API calls, in seconds
    #[arg(long, env = "REEFSCAN_UPSTREAM_TIMEOUT_SECS")]
    pub upstream_timeout_secs: Option<u64>,

    /// TOML config file
    #[arg(short, long, env = "REEFSCAN_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Upload size and format limits enforced by request intake
#[derive(Debug, Clone)]
pub struct UploadLimits {
    pub max_upload_bytes: usize,
    /// Lowercase `type/subtype` entries
    pub allowed_media_types: Vec<String>,
}

impl Default for UploadLimits {
    fn default() -> Self {
        let defaults = CompiledDefaults::default();
        Self {
            max_upload_bytes: defaults.max_upload_bytes,
            allowed_media_types: defaults.allowed_media_types,
        }
    }
}

impl UploadLimits {
    pub fn allows(&self, media_type: &str) -> bool {
        self.allowed_media_types
            .iter()
            .any(|allowed| allowed.eq_ignore_ascii_case(media_type))
    }
}

/// Fully resolved service configuration
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub bind: String,
    pub port: u16,
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub gemini_base_url: String,
    pub client_origin: Option<String>,
    pub detections_path: PathBuf,
    pub detection_api_url: Option<String>,
    pub limits: UploadLimits,
    pub upstream_timeout: Duration,
}

impl ServiceConfig {
    /// Merge CLI/ENV arguments over the TOML file over compiled defaults
    pub fn resolve(args: &Args, toml: &TomlConfig) -> Result<Self> {
        let defaults = CompiledDefaults::default();

        let gemini_api_key = resolve_api_key(args, toml)?;

        let limits = UploadLimits {
            max_upload_bytes: args
                .max_upload_bytes
                .or(toml.max_upload_bytes)
                .unwrap_or(defaults.max_upload_bytes),
            allowed_media_types: toml
                .allowed_media_types
                .clone()
                .unwrap_or(defaults.allowed_media_types)
                .into_iter()
                .map(|t| t.trim().to_ascii_lowercase())
                .collect(),
        };

        if limits.max_upload_bytes == 0 {
            return Err(Error::Config("max_upload_bytes must be greater than 0".to_string()));
        }

        let upstream_timeout_secs = args
            .upstream_timeout_secs
            .or(toml.upstream_timeout_secs)
            .unwrap_or(defaults.upstream_timeout_secs);
        if upstream_timeout_secs == 0 {
            return Err(Error::Config("upstream_timeout_secs must be greater than 0".to_string()));
        }

        Ok(Self {
            bind: args.bind.clone().or_else(|| toml.bind.clone()).unwrap_or(defaults.bind),
            port: args.port.or(toml.port).unwrap_or(defaults.port),
            gemini_api_key,
            gemini_model: args
                .gemini_model
                .clone()
                .or_else(|| toml.gemini_model.clone())
                .unwrap_or(defaults.gemini_model),
            gemini_base_url: toml
                .gemini_base_url
                .clone()
                .unwrap_or(defaults.gemini_base_url),
            client_origin: args
                .client_origin
                .clone()
                .or_else(|| toml.client_origin.clone())
                .filter(|o| !o.trim().is_empty()),
            detections_path: args
                .detections
                .clone()
                .or_else(|| toml.detections_path.clone())
                .unwrap_or(defaults.detections_path),
            detection_api_url: args
                .detection_api_url
                .clone()
                .or_else(|| toml.detection_api_url.clone())
                .filter(|u| !u.trim().is_empty()),
            limits,
            upstream_timeout: Duration::from_secs(upstream_timeout_secs),
        })
    }

    /// `bind:port`
    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}

/// API key: `--gemini-api-key`/`GEMINI_API_KEY` → `GOOGLE_API_KEY` → TOML
fn resolve_api_key(args: &Args, toml: &TomlConfig) -> Result<String> {
    let candidates = [
        ("command line/GEMINI_API_KEY", args.gemini_api_key.clone()),
        (FALLBACK_API_KEY_ENV, std::env::var(FALLBACK_API_KEY_ENV).ok()),
        ("TOML", toml.gemini_api_key.clone()),
    ];

    let valid: Vec<(&str, String)> = candidates
        .into_iter()
        .filter_map(|(source, key)| key.filter(|k| is_valid_key(k)).map(|k| (source, k)))
        .collect();

    if valid.len() > 1 {
        let sources: Vec<&str> = valid.iter().map(|(s, _)| *s).collect();
        warn!(
            "Gemini API key found in multiple sources: {}. Using {} (highest priority).",
            sources.join(", "),
            sources[0]
        );
    }

    valid
        .into_iter()
        .next()
        .map(|(_, key)| key.trim().to_string())
        .ok_or_else(|| {
            Error::Config(
                "Gemini API key not configured. Please configure using one of:\n\
                 1. Command line: --gemini-api-key <key>\n\
                 2. Environment: GEMINI_API_KEY=<key> (or GOOGLE_API_KEY)\n\
                 3. TOML config: gemini_api_key = \"<key>\""
                    .to_string(),
            )
        })
}
