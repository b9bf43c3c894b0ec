//! Per-call records and their structured wire form.
//!
//! A record is assembled on the caller's thread (arguments already inspected)
//! and is immutable afterwards, so it can move to a pool worker as-is.

mod meta;
mod process;

pub use meta::{LOG_ID_KEY, LOG_NUM_KEY, LogId, MetaFields, log_id};
pub(crate) use meta::short_id;
pub use process::{host_name, pid};

use crate::error::Error;
use crate::inspect::cleanup::{clean, clean_meta};
use crate::inspect::{InspectableValue, Reflect};
use crate::internal;
use crate::level::Level;
use chrono::{DateTime, SecondsFormat, Utc};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// First element of every structured line.
pub const WIRE_MARKER: &str = "@bunion:v1";

/// Type label of the backtrace argument appended to ERROR and CRITICAL records.
pub const STACK_TRACE_TYPE: &str = "StackTrace";

/// One positional argument of a log call.
///
/// Meta fields and log ids are recognized by type and merged into the
/// record's meta object; everything else is payload.
#[derive(Clone, Copy)]
pub enum Arg<'a> {
    Meta(&'a MetaFields),
    Id(&'a LogId),
    Value(&'a dyn Reflect),
}

impl<'a, T: Reflect + 'a> From<&'a T> for Arg<'a> {
    fn from(value: &'a T) -> Self {
        Self::Value(value)
    }
}

impl<'a> From<&'a MetaFields> for Arg<'a> {
    fn from(fields: &'a MetaFields) -> Self {
        Self::Meta(fields)
    }
}

impl<'a> From<&'a LogId> for Arg<'a> {
    fn from(id: &'a LogId) -> Self {
        Self::Id(id)
    }
}

static SEQUENCE: AtomicU64 = AtomicU64::new(0);

/// Process-wide, strictly increasing, starting at 1.
pub fn next_sequence() -> u64 {
    SEQUENCE.fetch_add(1, Ordering::Relaxed) + 1
}

/// One emitted record, built per call and never changed afterwards.
#[derive(Debug, Clone)]
pub struct LogRecord {
    pub timestamp: DateTime<Utc>,
    pub level: Level,
    pub app_name: Arc<str>,
    pub host_name: Arc<str>,
    pub pid: u32,
    pub meta: MetaFields,
    pub sequence: u64,
    pub args: Vec<InspectableValue>,
}

impl LogRecord {
    /// RFC 3339 in UTC with microseconds and a `Z` suffix, as written on
    /// structured lines.
    #[must_use]
    pub fn iso_timestamp(&self) -> String {
        self.timestamp.to_rfc3339_opts(SecondsFormat::Micros, true)
    }

    /// Strict encoding of the positional wire array.
    ///
    /// # Errors
    /// [`Error::Encode`] when a value has no JSON form, e.g. a non-finite
    /// float.
    pub fn to_json(&self) -> Result<String, Error> {
        let line = serde_json::to_string(&(
            WIRE_MARKER,
            &*self.app_name,
            self.level.label(),
            self.pid,
            &*self.host_name,
            self.iso_timestamp(),
            &self.meta,
            &self.args,
        ))?;
        Ok(line)
    }

    /// Encoding through the cleanup fallback.
    ///
    /// # Errors
    /// [`Error::Encode`] only if the serializer itself fails; cleaned values
    /// always encode.
    pub fn to_clean_json(&self) -> Result<String, Error> {
        let args: Vec<serde_json::Value> = self.args.iter().map(clean).collect();
        let line = serde_json::to_string(&(
            WIRE_MARKER,
            &*self.app_name,
            self.level.label(),
            self.pid,
            &*self.host_name,
            self.iso_timestamp(),
            clean_meta(&self.meta),
            args,
        ))?;
        Ok(line)
    }

    /// Strict first, cleanup on failure. `None` only if both fail.
    #[must_use]
    pub fn encode(&self) -> Option<String> {
        match self.to_json() {
            Ok(line) => Some(line),
            Err(strict) => {
                internal::warn(
                    "RECORD",
                    &format!("record {} needed cleanup: {strict}", self.sequence),
                );
                match self.to_clean_json() {
                    Ok(line) => Some(line),
                    Err(e) => {
                        internal::error(
                            "RECORD",
                            &format!("record {} dropped, cleanup encode failed: {e}", self.sequence),
                        );
                        None
                    }
                }
            }
        }
    }
}
