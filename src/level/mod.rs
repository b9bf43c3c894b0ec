//! Severity levels and the per-sink enabled-level flags derived from them.

use std::fmt;
use std::str::FromStr;

/// Derives `Ord` so gates can compare a call's level against a configured minimum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Level {
    /// High-volume instrumentation that would be too noisy outside of development.
    Trace = 0,
    /// Startup, teardown, and state-change details useful for diagnosing issues.
    Debug = 1,
    /// Normal operational milestones.
    #[default]
    Info = 2,
    /// Non-fatal anomalies that may need attention.
    Warn = 3,
    /// Failures that prevent an operation from completing. Always emitted.
    Error = 4,
    /// Failures that threaten the whole process. Always emitted.
    Critical = 5,
}

impl Level {
    /// Lowercase because config files use lowercase level strings.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
            Self::Critical => "critical",
        }
    }

    /// Uppercase label used by both the wire record and the pretty line.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Trace => "TRACE",
            Self::Debug => "DEBUG",
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
            Self::Critical => "CRITICAL",
        }
    }

    #[must_use]
    pub const fn all() -> [Self; 6] {
        [
            Self::Trace,
            Self::Debug,
            Self::Info,
            Self::Warn,
            Self::Error,
            Self::Critical,
        ]
    }

    /// Levels that bypass every minimum-level gate.
    #[must_use]
    pub const fn is_always_enabled(self) -> bool {
        matches!(self, Self::Error | Self::Critical)
    }

    const fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Returned by `FromStr` so callers can distinguish "unknown level" from other parse failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseLevelError(String);

impl fmt::Display for ParseLevelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown log level: '{}'", self.0)
    }
}

impl std::error::Error for ParseLevelError {}

impl FromStr for Level {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "trace" => Ok(Self::Trace),
            "debug" => Ok(Self::Debug),
            "info" => Ok(Self::Info),
            "warn" | "warning" => Ok(Self::Warn),
            "error" | "err" => Ok(Self::Error),
            "critical" | "crit" | "fatal" => Ok(Self::Critical),
            _ => Err(ParseLevelError(s.to_string())),
        }
    }
}

/// Enabled-level flags, computed once when a sink or logger is built.
///
/// Enabling a level enables every more severe level, and `Error`/`Critical`
/// are enabled in every set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LevelSet {
    bits: u8,
}

impl LevelSet {
    /// Everything at or above `min`, plus the always-on levels.
    #[must_use]
    pub const fn from_min(min: Level) -> Self {
        let mut bits = Level::Error.bit() | Level::Critical.bit();
        let mut rank = min as u8;
        while rank <= Level::Critical as u8 {
            bits |= 1 << rank;
            rank += 1;
        }
        Self { bits }
    }

    #[must_use]
    pub const fn contains(self, level: Level) -> bool {
        self.bits & level.bit() != 0
    }

    /// A level enabled in either set.
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self {
            bits: self.bits | other.bits,
        }
    }

    /// A level enabled in both sets.
    #[must_use]
    pub const fn intersection(self, other: Self) -> Self {
        Self {
            bits: self.bits & other.bits,
        }
    }

    /// Least severe enabled level.
    #[must_use]
    pub fn min_level(self) -> Level {
        Level::all()
            .into_iter()
            .find(|level| self.contains(*level))
            .unwrap_or(Level::Error)
    }
}

impl Default for LevelSet {
    fn default() -> Self {
        Self::from_min(Level::Info)
    }
}

impl From<Level> for LevelSet {
    fn from(min: Level) -> Self {
        Self::from_min(min)
    }
}
