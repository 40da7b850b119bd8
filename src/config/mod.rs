use crate::record::Severity;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

pub const ENV_URL: &str = "INFLUX_LOGGER_URL";
pub const ENV_TOKEN: &str = "INFLUX_LOGGER_TOKEN";
pub const ENV_ORG: &str = "INFLUX_LOGGER_ORG";
pub const ENV_BUCKET: &str = "INFLUX_LOGGER_BUCKET";
pub const ENV_HOSTNAME: &str = "INFLUX_LOGGER_HOSTNAME";
pub const ENV_INTERVAL_MS: &str = "INFLUX_LOGGER_INTERVAL_MS";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("InfluxDB API token is missing. Set the {ENV_TOKEN} environment variable or the `token` config field.")]
    MissingToken,

    #[error("invalid value for {var}: {value}")]
    InvalidEnvValue { var: String, value: String },

    #[error("failed to construct write client: {0}")]
    Client(String),
}

/// Shipper configuration. Every field carries a default except `token`,
/// which must be present for initialization to succeed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShipperConfig {
    /// Backend write endpoint
    #[serde(default = "default_url")]
    pub url: String,

    /// API token. Required; construction fails without it.
    #[serde(default)]
    pub token: Option<String>,

    #[serde(default = "default_org")]
    pub org: String,

    #[serde(default = "default_bucket")]
    pub bucket: String,

    /// Host tag applied to every point. Defaults to the machine hostname.
    #[serde(default = "default_hostname")]
    pub hostname: String,

    /// Flush interval in milliseconds. 0 disables batching: every admitted
    /// record triggers an immediate synchronous flush cycle.
    #[serde(default = "default_interval_ms")]
    pub flush_interval_ms: u64,

    /// Upper bound on queued records. 0 means unbounded. When the bound is
    /// reached the oldest pending record is dropped.
    #[serde(default)]
    pub max_pending: usize,

    #[serde(default)]
    pub levels: LevelsConfig,
}

/// Severity admission policy: a global default minimum plus per-module
/// overrides. A module with no override and no default is rejected
/// entirely (fail closed).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LevelsConfig {
    #[serde(default)]
    pub default: Option<Severity>,

    #[serde(default)]
    pub modules: HashMap<String, ModuleLevel>,
}

/// Per-module level override. `Off` silences the module even when a
/// global default is configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModuleLevel {
    Off,
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
}

impl ModuleLevel {
    pub fn min_severity(&self) -> Option<Severity> {
        match self {
            ModuleLevel::Off => None,
            ModuleLevel::Trace => Some(Severity::Trace),
            ModuleLevel::Debug => Some(Severity::Debug),
            ModuleLevel::Info => Some(Severity::Info),
            ModuleLevel::Warn => Some(Severity::Warn),
            ModuleLevel::Error => Some(Severity::Error),
            ModuleLevel::Fatal => Some(Severity::Fatal),
        }
    }
}

fn default_url() -> String {
    "http://localhost:8086".to_string()
}

fn default_org() -> String {
    "personal".to_string()
}

fn default_bucket() -> String {
    "logging".to_string()
}

fn default_hostname() -> String {
    hostname::get()
        .ok()
        .and_then(|h| h.to_str().map(|s| s.to_string()))
        .unwrap_or_else(|| "unknown".to_string())
}

fn default_interval_ms() -> u64 {
    1000
}

impl Default for ShipperConfig {
    fn default() -> Self {
        Self {
            url: default_url(),
            token: None,
            org: default_org(),
            bucket: default_bucket(),
            hostname: default_hostname(),
            flush_interval_ms: default_interval_ms(),
            max_pending: 0,
            levels: LevelsConfig::default(),
        }
    }
}

impl ShipperConfig {
    /// Build a config from defaults plus recognized environment overrides.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Overlay recognized environment variables onto this config.
    /// Unset variables leave the corresponding field unchanged.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(url) = std::env::var(ENV_URL) {
            self.url = url;
        }
        if let Ok(token) = std::env::var(ENV_TOKEN) {
            self.token = Some(token);
        }
        if let Ok(org) = std::env::var(ENV_ORG) {
            self.org = org;
        }
        if let Ok(bucket) = std::env::var(ENV_BUCKET) {
            self.bucket = bucket;
        }
        if let Ok(host) = std::env::var(ENV_HOSTNAME) {
            self.hostname = host;
        }
        if let Ok(interval) = std::env::var(ENV_INTERVAL_MS) {
            self.flush_interval_ms = interval.parse().map_err(|_| ConfigError::InvalidEnvValue {
                var: ENV_INTERVAL_MS.to_string(),
                value: interval,
            })?;
        }
        Ok(())
    }

    /// Validate construction-time requirements. A missing credential is
    /// fatal here rather than at first flush.
    pub fn require_token(&self) -> Result<&str, ConfigError> {
        self.token.as_deref().ok_or(ConfigError::MissingToken)
    }
}
