//! TOML configuration for the `hidcap` command.
//!
//! Looked up at `--config <PATH>` (or `HIDCAP_CONFIG`), otherwise at
//! `./hidcap.toml` when that file exists.  Every key is optional:
//!
//! ```toml
//! log_level = "info"
//!
//! [encode]
//! base_increment_us = 10000
//! anomaly_interval = 20
//! anomaly_increment_us = 50000
//! # start_micros = 1700000000000000
//!
//! [scan]
//! marker_prefixes = ["CTF", "flag"]
//! anomaly_threshold_us = 10000
//! ```
//!
//! Fields annotated with `#[serde(default = "some_fn")]` use the return value
//! of `some_fn()` when the key is absent, so a missing file and an empty file
//! give the same configuration.

use std::path::{Path, PathBuf};

use hidcap_core::markers::DEFAULT_PREFIXES;
use hidcap_core::TimingProfile;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// File name probed in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "hidcap.toml";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A file system I/O error occurred.
    #[error("I/O error accessing config at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The TOML content could not be parsed.
    #[error("failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    /// The values parsed but cannot be used.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ── Config schema types ───────────────────────────────────────────────────────

/// Top-level configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    /// `tracing` level used when `RUST_LOG` is not set.
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub encode: EncodeConfig,
    #[serde(default)]
    pub scan: ScanConfig,
}

/// Timing of generated captures.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EncodeConfig {
    #[serde(default = "default_base_increment_us")]
    pub base_increment_us: u64,
    /// 0 disables the periodic jump.
    #[serde(default = "default_anomaly_interval")]
    pub anomaly_interval: u64,
    #[serde(default = "default_anomaly_increment_us")]
    pub anomaly_increment_us: u64,
    /// Fixed start time in microseconds since the Unix epoch.  The current
    /// time is used when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_micros: Option<u64>,
}

/// Marker and timing analysis of decoded captures.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScanConfig {
    #[serde(default = "default_marker_prefixes")]
    pub marker_prefixes: Vec<String>,
    /// Record gaps above this many microseconds are reported as anomalies.
    #[serde(default = "default_anomaly_threshold_us")]
    pub anomaly_threshold_us: u64,
}

// ── Default helpers ───────────────────────────────────────────────────────────

fn default_log_level() -> String {
    "info".to_string()
}
fn default_base_increment_us() -> u64 {
    TimingProfile::default().base_increment_us
}
fn default_anomaly_interval() -> u64 {
    TimingProfile::default().anomaly_interval
}
fn default_anomaly_increment_us() -> u64 {
    TimingProfile::default().anomaly_increment_us
}
fn default_marker_prefixes() -> Vec<String> {
    DEFAULT_PREFIXES.iter().map(|p| p.to_string()).collect()
}
fn default_anomaly_threshold_us() -> u64 {
    10_000
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            encode: EncodeConfig::default(),
            scan: ScanConfig::default(),
        }
    }
}

impl Default for EncodeConfig {
    fn default() -> Self {
        Self {
            base_increment_us: default_base_increment_us(),
            anomaly_interval: default_anomaly_interval(),
            anomaly_increment_us: default_anomaly_increment_us(),
            start_micros: None,
        }
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            marker_prefixes: default_marker_prefixes(),
            anomaly_threshold_us: default_anomaly_threshold_us(),
        }
    }
}

impl EncodeConfig {
    pub fn timing_profile(&self) -> TimingProfile {
        TimingProfile {
            base_increment_us: self.base_increment_us,
            anomaly_interval: self.anomaly_interval,
            anomaly_increment_us: self.anomaly_increment_us,
        }
    }
}

impl AppConfig {
    /// Checks values that parse fine but cannot drive the codec.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] describing the first bad value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.encode.base_increment_us == 0 {
            return Err(ConfigError::Invalid(
                "encode.base_increment_us must be greater than 0".to_string(),
            ));
        }
        if self.scan.marker_prefixes.is_empty() {
            return Err(ConfigError::Invalid(
                "scan.marker_prefixes must name at least one prefix".to_string(),
            ));
        }
        if let Some(blank) = self.scan.marker_prefixes.iter().position(|p| p.trim().is_empty()) {
            return Err(ConfigError::Invalid(format!(
                "scan.marker_prefixes[{blank}] is blank"
            )));
        }
        Ok(())
    }
}

// ── Loading ───────────────────────────────────────────────────────────────────

/// Parses and validates configuration text.
///
/// # Errors
///
/// Returns [`ConfigError::Parse`] for malformed TOML and
/// [`ConfigError::Invalid`] for unusable values.
pub fn parse_config(content: &str) -> Result<AppConfig, ConfigError> {
    let cfg: AppConfig = toml::from_str(content)?;
    cfg.validate()?;
    Ok(cfg)
}

/// Loads the configuration.
///
/// With `Some(path)` the file must exist.  With `None`,
/// [`DEFAULT_CONFIG_FILE`] in the working directory is used if present and
/// [`AppConfig::default()`] otherwise.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] for file-system errors (including a missing
/// explicit path), [`ConfigError::Parse`] if the TOML is malformed and
/// [`ConfigError::Invalid`] for unusable values.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    let (path, required) = match path {
        Some(p) => (p.to_path_buf(), true),
        None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
    };

    match std::fs::read_to_string(&path) {
        Ok(content) => parse_config(&content),
        Err(e) if !required && e.kind() == std::io::ErrorKind::NotFound => Ok(AppConfig::default()),
        Err(e) => Err(ConfigError::Io { path, source: e }),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
