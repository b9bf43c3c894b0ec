//! Line formats: the structured wire array or a colored human-readable line.

mod color;
mod pretty;

pub use color::{BOLD, Color, ITALIC, UNDERLINE, colorize, colorize_bg, level_badge, styled};
pub use pretty::{render_line, render_value, short_type_name};

use chrono::{DateTime, FixedOffset, Local, Utc};
use std::fmt;
use std::io::IsTerminal;
use std::str::FromStr;

/// Forces a format regardless of the terminal: `yes` for structured, `no` for pretty.
pub const LOG_JSON_ENV: &str = "JLOG_LOG_JSON";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    /// One JSON array per line.
    #[default]
    Structured,
    Pretty,
}

impl Format {
    /// Env override first, then pretty on a terminal and structured elsewhere.
    #[must_use]
    pub fn detect() -> Self {
        let forced = std::env::var(LOG_JSON_ENV)
            .or_else(|_| std::env::var(LOG_JSON_ENV.to_lowercase()))
            .ok();
        Self::from_env_value(forced.as_deref()).unwrap_or_else(|| {
            if std::io::stdout().is_terminal() {
                Self::Pretty
            } else {
                Self::Structured
            }
        })
    }

    /// Reads a `JLOG_LOG_JSON` value; anything but yes/no means "not forced".
    #[must_use]
    pub fn from_env_value(value: Option<&str>) -> Option<Self> {
        match value.map(|v| v.trim().to_lowercase()).as_deref() {
            Some("yes" | "true" | "1") => Some(Self::Structured),
            Some("no" | "false" | "0") => Some(Self::Pretty),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Structured => "json",
            Self::Pretty => "pretty",
        }
    }
}

impl FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "json" | "structured" => Ok(Self::Structured),
            "pretty" | "text" | "human" => Ok(Self::Pretty),
            other => Err(format!("unknown format: '{other}'")),
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Clock used for the time column of pretty lines. Structured lines are always UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeDisplay {
    #[default]
    Utc,
    Local,
    Fixed(FixedOffset),
}

impl TimeDisplay {
    /// `HH:MM:SS.ffffff`.
    #[must_use]
    pub fn clock(self, timestamp: DateTime<Utc>) -> String {
        const CLOCK: &str = "%H:%M:%S%.6f";
        match self {
            Self::Utc => timestamp.format(CLOCK).to_string(),
            Self::Local => timestamp.with_timezone(&Local).format(CLOCK).to_string(),
            Self::Fixed(offset) => timestamp.with_timezone(&offset).format(CLOCK).to_string(),
        }
    }
}

impl FromStr for TimeDisplay {
    type Err = String;

    /// `utc`, `local`, or a fixed offset such as `+02:00`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "utc" | "z" | "" => Ok(Self::Utc),
            "local" => Ok(Self::Local),
            other => other
                .parse::<FixedOffset>()
                .map(Self::Fixed)
                .map_err(|e| format!("unknown timezone '{other}': {e}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn env_value_forces_format() {
        assert_eq!(Format::from_env_value(Some("yes")), Some(Format::Structured));
        assert_eq!(Format::from_env_value(Some("NO")), Some(Format::Pretty));
        assert_eq!(Format::from_env_value(Some("maybe")), None);
        assert_eq!(Format::from_env_value(None), None);
    }

    #[test]
    fn format_names_parse() {
        assert_eq!("json".parse::<Format>(), Ok(Format::Structured));
        assert_eq!("Pretty".parse::<Format>(), Ok(Format::Pretty));
        assert!("xml".parse::<Format>().is_err());
    }

    #[test]
    fn fixed_offset_shifts_clock() {
        let at = Utc.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();
        assert_eq!(TimeDisplay::Utc.clock(at), "03:04:05.000000");
        let plus_two: TimeDisplay = "+02:00".parse().unwrap();
        assert_eq!(plus_two.clock(at), "05:04:05.000000");
        assert!("mars".parse::<TimeDisplay>().is_err());
    }
}
