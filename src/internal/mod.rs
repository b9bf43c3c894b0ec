//! jlog's own diagnostic channel.
//!
//! Write failures, encode fallbacks and panicking pool jobs are reported here
//! instead of being raised to the caller. Lines go straight to stderr so a
//! broken sink can never hide its own failure report.
//!
//! The threshold comes from `JLOG_INTERNAL_LEVEL` (default `warn`) and is read
//! once through a `OnceLock`.

use crate::level::Level;
use std::io::Write;
use std::sync::OnceLock;

/// Environment variable holding the minimum diagnostic level.
pub const LEVEL_ENV: &str = "JLOG_INTERNAL_LEVEL";

static THRESHOLD: OnceLock<Level> = OnceLock::new();

fn threshold() -> Level {
    *THRESHOLD.get_or_init(|| {
        std::env::var(LEVEL_ENV)
            .ok()
            .and_then(|raw| raw.parse().ok())
            .unwrap_or(Level::Warn)
    })
}

/// Whether a diagnostic at `level` would be written.
#[must_use]
pub fn enabled(level: Level) -> bool {
    level >= threshold()
}

fn log(level: Level, scope: &str, msg: &str) {
    if !enabled(level) {
        return;
    }
    let line = format!("jlog[{scope}] {} {msg}\n", level.label());
    // Single write_all under the process-wide stderr lock keeps the line whole.
    let mut stderr = std::io::stderr().lock();
    let _ = stderr.write_all(line.as_bytes());
    let _ = stderr.flush();
}

pub fn trace(scope: &str, msg: &str) {
    log(Level::Trace, scope, msg);
}

/// Startup and teardown details: pool sizes, sink identities.
pub fn debug(scope: &str, msg: &str) {
    log(Level::Debug, scope, msg);
}

pub fn info(scope: &str, msg: &str) {
    log(Level::Info, scope, msg);
}

/// Recovered anomalies such as an encode that needed the cleanup fallback.
pub fn warn(scope: &str, msg: &str) {
    log(Level::Warn, scope, msg);
}

/// Failures that lost output, e.g. a destination write error.
pub fn error(scope: &str, msg: &str) {
    log(Level::Error, scope, msg);
}
