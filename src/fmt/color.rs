//! 24-bit ANSI styling for pretty lines.

use crate::level::Level;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    #[must_use]
    pub fn fg_ansi(self) -> String {
        format!("\x1b[38;2;{};{};{}m", self.r, self.g, self.b)
    }

    #[must_use]
    pub fn bg_ansi(self) -> String {
        format!("\x1b[48;2;{};{};{}m", self.r, self.g, self.b)
    }

    pub const RESET: &'static str = "\x1b[0m";

    #[must_use]
    pub const fn white() -> Self {
        Self::new(255, 255, 255)
    }

    /// Gray ramp; `step` 0 is near black, 23 near white.
    #[must_use]
    pub const fn gray(step: u8) -> Self {
        let step = if step > 23 { 23 } else { step };
        let value = 8 + step * 10;
        Self::new(value, value, value)
    }

    #[must_use]
    pub const fn cyan() -> Self {
        Self::new(139, 233, 253)
    }

    #[must_use]
    pub const fn magenta() -> Self {
        Self::new(255, 121, 198)
    }

    #[must_use]
    pub const fn red() -> Self {
        Self::new(255, 85, 85)
    }

    /// Level badge colors.
    #[must_use]
    pub const fn for_level(level: Level) -> Self {
        match level {
            Level::Trace => Self::gray(4),
            Level::Debug => Self::cyan(),
            Level::Info => Self::gray(12),
            Level::Warn => Self::magenta(),
            Level::Error | Level::Critical => Self::red(),
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

pub const BOLD: &str = "\x1b[1m";
pub const ITALIC: &str = "\x1b[3m";
pub const UNDERLINE: &str = "\x1b[4m";

#[must_use]
pub fn colorize(text: &str, color: Color) -> String {
    let fg = color.fg_ansi();
    let reset = Color::RESET;
    format!("{fg}{text}{reset}")
}

#[must_use]
pub fn colorize_bg(text: &str, fg: Color, bg: Color) -> String {
    let fg_code = fg.fg_ansi();
    let bg_code = bg.bg_ansi();
    let reset = Color::RESET;
    format!("{fg_code}{bg_code}{text}{reset}")
}

/// Wraps `text` in one or more SGR attributes.
#[must_use]
pub fn styled(text: &str, attributes: &[&str]) -> String {
    let mut out = attributes.concat();
    out.push_str(text);
    out.push_str(Color::RESET);
    out
}

/// The level as shown on a pretty line.
#[must_use]
pub fn level_badge(level: Level) -> String {
    let label = level.label();
    match level {
        Level::Critical => colorize_bg(&styled(label, &[BOLD]), Color::white(), Color::red()),
        Level::Error => styled(&colorize(label, Color::red()), &[BOLD, UNDERLINE]),
        Level::Debug => styled(label, &[BOLD]),
        _ => colorize(label, Color::for_level(level)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn displays_as_hex() {
        assert_eq!(Color::red().to_string(), "#ff5555");
    }

    #[test]
    fn gray_ramp_clamps() {
        assert_eq!(Color::gray(200), Color::gray(23));
    }

    #[test]
    fn badge_contains_label() {
        for level in Level::all() {
            assert!(level_badge(level).contains(level.label()));
        }
    }
}
