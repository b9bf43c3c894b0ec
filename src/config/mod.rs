//! TOML configuration loading, `source = "..."` include resolution, and per-app override merging.
//!
//! Separated from struct definitions so that the loading logic (file I/O, cycle detection,
//! merge strategy) stays independent of the serde schema.

mod structs;

pub use structs::{AppConfig, GeneralConfig, InspectConfig, PoolConfigFile, SinkConfig};

use crate::fmt::{Format, LOG_JSON_ENV, TimeDisplay};
use crate::internal;
use crate::level::Level;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

/// Overrides `general.level` after loading.
pub const LEVEL_ENV: &str = "JLOG_LEVEL";

/// An empty file still yields a working logger: every section defaults.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,
    pub pool: PoolConfigFile,
    pub inspect: InspectConfig,
    /// No entries means a single stdout sink at the general level.
    pub sinks: Vec<SinkConfig>,
    /// Static tags attached to every record.
    pub meta: BTreeMap<String, String>,
    pub apps: HashMap<String, AppConfig>,
}

/// Scans raw TOML for `source = "..."` lines, which serde cannot represent.
/// Returns the include paths and the remaining TOML.
#[doc(hidden)]
#[must_use]
pub fn extract_sources(content: &str) -> (Vec<String>, String) {
    let mut sources = Vec::new();
    let mut remaining = String::new();

    for line in content.lines() {
        let trimmed = line.trim();
        let is_source = trimmed
            .strip_prefix("source")
            .is_some_and(|rest| rest.trim_start().starts_with('='));
        if is_source {
            if let Some(path) = trimmed
                .split_once('=')
                .map(|(_, value)| value.trim().trim_matches('"').trim_matches('\''))
                && !path.is_empty()
            {
                sources.push(path.to_string());
            }
        } else {
            remaining.push_str(line);
            remaining.push('\n');
        }
    }

    (sources, remaining)
}

impl Config {
    /// Loads `<config_dir>/jlog/jlog.toml` with includes resolved and env overrides applied.
    /// A missing file yields defaults.
    ///
    /// # Errors
    /// Fails if the config directory can't be determined, a file can't be read,
    /// TOML parsing fails, or includes form a cycle.
    pub fn load() -> Result<Self, crate::Error> {
        internal::debug("CONFIG", "Loading config from default location");
        let config_path = Self::get_config_path()?;
        let mut config = Self::load_with_sources(&config_path, &mut HashSet::new())?;
        config.apply_env_overrides();
        internal::info(
            "CONFIG",
            &format!("Config loaded from {}", config_path.display()),
        );
        Ok(config)
    }

    /// Like [`load`](Self::load) from an explicit path.
    ///
    /// # Errors
    /// Returns error if the file cannot be read, parsed, or contains cyclic includes.
    pub fn load_from(path: &Path) -> Result<Self, crate::Error> {
        let mut config = Self::load_with_sources(path, &mut HashSet::new())?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parses a TOML string. Includes and env overrides are not applied.
    ///
    /// # Errors
    /// On TOML syntax or type errors.
    pub fn from_toml(content: &str) -> Result<Self, crate::Error> {
        Ok(toml::from_str(content)?)
    }

    fn load_with_sources(path: &Path, seen: &mut HashSet<PathBuf>) -> Result<Self, crate::Error> {
        if !path.exists() {
            internal::debug("CONFIG", "Config file not found, using defaults");
            return Ok(Self::default());
        }

        let canonical = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());

        if !seen.insert(canonical.clone()) {
            internal::warn(
                "CONFIG",
                &format!("Cyclic include detected: {}", canonical.display()),
            );
            return Err(crate::Error::CyclicInclude(canonical));
        }

        let content = fs::read_to_string(path)?;
        let (sources, toml_content) = extract_sources(&content);
        let mut config: Self = toml::from_str(&toml_content)?;

        for source_path in sources {
            internal::debug("CONFIG", &format!("Processing source: {source_path}"));
            let expanded = shellexpand::tilde(&source_path);
            let mut source_file = PathBuf::from(expanded.as_ref());
            if source_file.is_relative()
                && let Some(dir) = path.parent()
            {
                source_file = dir.join(source_file);
            }
            if source_file.exists() {
                let source_config = Self::load_with_sources(&source_file, seen)?;
                config.merge(source_config);
            } else {
                internal::warn("CONFIG", &format!("Source file not found: {source_path}"));
            }
        }

        Ok(config)
    }

    /// Folds an included config into `self`. Keys and sinks already present win.
    pub fn merge(&mut self, other: Self) {
        for (k, v) in other.meta {
            self.meta.entry(k).or_insert(v);
        }
        for (k, v) in other.apps {
            self.apps.entry(k).or_insert(v);
        }
        if self.sinks.is_empty() {
            self.sinks = other.sinks;
        }
    }

    /// Applies `[apps.<app_name>]` on top of the shared settings.
    #[must_use]
    pub fn for_app(&self, app_name: &str) -> Self {
        let mut config = self.clone();
        config.general.app_name = Some(app_name.to_string());

        if let Some(app_config) = self.apps.get(app_name) {
            if let Some(ref level) = app_config.level {
                config.general.level.clone_from(level);
            }
            if let Some(ref format) = app_config.format {
                config.general.format.clone_from(format);
            }
            if let Some(ref sinks) = app_config.sinks {
                config.sinks.clone_from(sinks);
            }
            for (k, v) in &app_config.meta {
                config.meta.insert(k.clone(), v.clone());
            }
        }

        config
    }

    /// `JLOG_LOG_JSON=yes|no` and `JLOG_LEVEL`, read from the process environment.
    pub fn apply_env_overrides(&mut self) {
        let log_json = std::env::var(LOG_JSON_ENV).ok();
        let level = std::env::var(LEVEL_ENV).ok();
        self.apply_overrides(log_json.as_deref(), level.as_deref());
    }

    /// Environment overrides with explicit values.
    pub fn apply_overrides(&mut self, log_json: Option<&str>, level: Option<&str>) {
        if let Some(format) = Format::from_env_value(log_json) {
            internal::debug("CONFIG", &format!("{LOG_JSON_ENV} forces {format}"));
            self.general.format = format.as_str().to_string();
        }
        if let Some(level) = level.map(str::trim).filter(|l| !l.is_empty()) {
            internal::debug("CONFIG", &format!("{LEVEL_ENV} sets level {level}"));
            self.general.level = level.to_string();
        }
    }

    /// `<config_dir>/jlog/jlog.toml`.
    ///
    /// # Errors
    /// Fails when the platform has no concept of a config directory.
    pub fn get_config_path() -> Result<PathBuf, crate::Error> {
        directories::BaseDirs::new()
            .map(|dirs| dirs.config_dir().join("jlog").join("jlog.toml"))
            .ok_or(crate::Error::ConfigDirNotFound)
    }

    /// # Errors
    /// When `general.level` names no level.
    pub fn parse_level(&self) -> Result<Level, crate::Error> {
        Ok(self.general.level.parse::<Level>()?)
    }

    /// `auto` defers to [`Format::detect`].
    ///
    /// # Errors
    /// When `general.format` is not `json`, `pretty` or `auto`.
    pub fn parse_format(&self) -> Result<Format, crate::Error> {
        if self.general.format.trim().eq_ignore_ascii_case("auto") {
            return Ok(Format::detect());
        }
        self.general
            .format
            .parse()
            .map_err(crate::Error::InvalidConfig)
    }

    /// # Errors
    /// When `general.timezone` is not `utc`, `local` or an offset.
    pub fn parse_timezone(&self) -> Result<TimeDisplay, crate::Error> {
        self.general
            .timezone
            .parse()
            .map_err(crate::Error::InvalidConfig)
    }

    /// Level of one sink, inheriting the general level.
    ///
    /// # Errors
    /// When the sink's or the general level is invalid.
    pub fn sink_level(&self, sink: &SinkConfig) -> Result<Level, crate::Error> {
        match &sink.level {
            Some(level) => Ok(level.parse::<Level>()?),
            None => self.parse_level(),
        }
    }

    /// Sink target with `~` expanded.
    #[must_use]
    pub fn expand_target(target: &str) -> PathBuf {
        PathBuf::from(shellexpand::tilde(target).as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_lines_are_split_off() {
        let (sources, rest) = extract_sources("source = \"a.toml\"\nsources_dir = 1\n[general]\n");
        assert_eq!(sources, vec!["a.toml".to_string()]);
        assert!(rest.contains("sources_dir = 1"));
        assert!(rest.contains("[general]"));
    }

    #[test]
    fn overrides_win_over_file() {
        let mut config = Config::from_toml("[general]\nlevel = \"warn\"\nformat = \"pretty\"\n").unwrap();
        config.apply_overrides(Some("yes"), Some("debug"));
        assert_eq!(config.parse_level().unwrap(), Level::Debug);
        assert_eq!(config.parse_format().unwrap(), Format::Structured);
    }

    #[test]
    fn unknown_override_is_ignored() {
        let mut config = Config::default();
        config.apply_overrides(Some("sometimes"), Some("  "));
        assert_eq!(config.general.format, "auto");
        assert_eq!(config.general.level, "info");
    }
}
