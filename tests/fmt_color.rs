use jlog::fmt::{BOLD, Color, colorize, colorize_bg, level_badge, styled};
use jlog::Level;

#[test]
fn ansi_sequences_match_rgb() {
    let color = Color::new(10, 20, 30);
    assert_eq!(color.fg_ansi(), "\x1b[38;2;10;20;30m");
    assert_eq!(color.bg_ansi(), "\x1b[48;2;10;20;30m");
}

#[test]
fn colorize_helpers_wrap_with_reset() {
    let text = "hi";
    let fg = Color::new(1, 2, 3);
    let bg = Color::new(4, 5, 6);

    let fg_only = colorize(text, fg);
    assert_eq!(fg_only, "\x1b[38;2;1;2;3mhi\x1b[0m");

    let fg_bg = colorize_bg(text, fg, bg);
    assert_eq!(fg_bg, "\x1b[38;2;1;2;3m\x1b[48;2;4;5;6mhi\x1b[0m");
}

#[test]
fn styled_prefixes_attributes() {
    assert_eq!(styled("x", &[BOLD]), "\x1b[1mx\x1b[0m");
}

#[test]
fn critical_badge_has_a_background() {
    let badge = level_badge(Level::Critical);
    assert!(badge.contains(&Color::red().bg_ansi()));
    assert!(!level_badge(Level::Info).contains("\x1b[48;2"));
}

#[test]
fn level_colors_are_distinct_for_warn_and_error() {
    assert_ne!(Color::for_level(Level::Warn), Color::for_level(Level::Error));
    assert_eq!(Color::for_level(Level::Critical), Color::red());
}
