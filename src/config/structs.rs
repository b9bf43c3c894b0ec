//! Configuration struct definitions.

use crate::inspect::Limits;
use crate::pool::{DEFAULT_MAX_OVERFLOW, DEFAULT_POOL_SIZE, PoolConfig};
use serde::Deserialize;
use std::collections::BTreeMap;

/// Settings shared by every sink.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Application name; falls back to `JLOG_APP_NAME`, then `default`.
    pub app_name: Option<String>,
    /// Host name override.
    pub host_name: Option<String>,
    /// Minimum log level.
    pub level: String,
    /// `json`, `pretty` or `auto`.
    pub format: String,
    /// ANSI colors on pretty lines; unset means "when stdout is a terminal".
    pub colors: Option<bool>,
    /// `utc`, `local` or a fixed offset like `+02:00`.
    pub timezone: String,
    /// Environment variables with this prefix become meta fields.
    pub env_prefix: Option<String>,
    /// Attach a backtrace to ERROR and CRITICAL records.
    pub capture_stack: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            app_name: None,
            host_name: None,
            level: "info".to_string(),
            format: "auto".to_string(),
            colors: None,
            timezone: "utc".to_string(),
            env_prefix: None,
            capture_stack: true,
        }
    }
}

/// Worker pool sizing.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PoolConfigFile {
    pub size: usize,
    /// Defaults to `size`.
    pub overflow_threshold: Option<usize>,
    pub max_overflow: usize,
}

impl Default for PoolConfigFile {
    fn default() -> Self {
        Self {
            size: DEFAULT_POOL_SIZE,
            overflow_threshold: None,
            max_overflow: DEFAULT_MAX_OVERFLOW,
        }
    }
}

impl PoolConfigFile {
    #[must_use]
    pub fn to_pool_config(&self) -> PoolConfig {
        PoolConfig {
            size: self.size,
            overflow_threshold: self.overflow_threshold.unwrap_or(self.size),
            max_overflow: self.max_overflow,
        }
    }
}

/// Inspector bounds.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InspectConfig {
    pub max_attempts: usize,
    pub max_array: usize,
    pub max_map_keys: usize,
    pub max_indirection: usize,
}

impl Default for InspectConfig {
    fn default() -> Self {
        let limits = Limits::default();
        Self {
            max_attempts: limits.max_attempts,
            max_array: limits.max_array,
            max_map_keys: limits.max_map_keys,
            max_indirection: limits.max_indirection,
        }
    }
}

impl InspectConfig {
    #[must_use]
    pub const fn to_limits(&self) -> Limits {
        Limits {
            max_attempts: self.max_attempts,
            max_array: self.max_array,
            max_map_keys: self.max_map_keys,
            max_indirection: self.max_indirection,
        }
    }
}

/// One `[[sinks]]` entry.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct SinkConfig {
    /// `stdout`, `stderr`, or a file path (`~` expanded).
    pub target: String,
    /// Sink minimum level; defaults to the general level.
    pub level: Option<String>,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            target: "stdout".to_string(),
            level: None,
        }
    }
}

/// Per-app overrides under `[apps.<name>]`.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub level: Option<String>,
    pub format: Option<String>,
    /// Replaces the top-level sinks when present.
    pub sinks: Option<Vec<SinkConfig>>,
    /// Added to the top-level meta, overriding equal keys.
    pub meta: BTreeMap<String, String>,
}
