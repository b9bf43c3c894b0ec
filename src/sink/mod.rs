//! Output destinations, their shared locks, and per-sink level gating.
//!
//! Every physical destination maps to exactly one lock through a
//! [`LockRegistry`], so two sinks opened on the same file never interleave
//! inside a line. A line is written as payload, then newline, then flush, all
//! under that lock.

mod identity;

pub use identity::{DestinationId, StreamKind};

use crate::error::Error;
use crate::internal;
use crate::level::{Level, LevelSet};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Arc, OnceLock, Weak};

/// Exclusive access to one physical destination.
pub type DestinationLock = Mutex<()>;

/// Where a sink's lines go. Consumed when the sink is built.
pub enum Destination {
    Stdout,
    Stderr,
    File(File),
    Writer(Box<dyn Write + Send>),
}

impl Destination {
    /// Opens `path` for appending, creating parent directories as needed.
    ///
    /// # Errors
    /// When the directory cannot be created or the file cannot be opened.
    pub fn append(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self::File(file))
    }

    /// Any writer; it gets an identity of its own.
    #[must_use]
    pub fn writer(writer: impl Write + Send + 'static) -> Self {
        Self::Writer(Box::new(writer))
    }

    /// Identity used to find the destination's lock. Files compare by
    /// device and inode, so two handles on one file match.
    #[must_use]
    pub fn identity(&self) -> DestinationId {
        match self {
            Self::Stdout => DestinationId::of_stream(StreamKind::Stdout),
            Self::Stderr => DestinationId::of_stream(StreamKind::Stderr),
            Self::File(file) => DestinationId::of_file(file),
            Self::Writer(_) => DestinationId::unique(),
        }
    }

    fn into_writer(self) -> Box<dyn Write + Send> {
        match self {
            Self::Stdout => Box::new(io::stdout()),
            Self::Stderr => Box::new(io::stderr()),
            Self::File(file) => Box::new(file),
            Self::Writer(writer) => writer,
        }
    }
}

impl fmt::Debug for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stdout => f.write_str("Stdout"),
            Self::Stderr => f.write_str("Stderr"),
            Self::File(file) => f.debug_tuple("File").field(file).finish(),
            Self::Writer(_) => f.write_str("Writer(..)"),
        }
    }
}

/// Maps destination identities to their locks.
///
/// Holds locks weakly: once every sink on a destination is gone, the entry is
/// pruned on the next lookup.
#[derive(Debug, Default)]
pub struct LockRegistry {
    locks: Mutex<HashMap<DestinationId, Weak<DestinationLock>>>,
}

impl LockRegistry {
    /// An empty registry, for loggers that must not share locks with the
    /// rest of the process.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry used unless a builder supplies another.
    #[must_use]
    pub fn global() -> Arc<Self> {
        static GLOBAL: OnceLock<Arc<LockRegistry>> = OnceLock::new();
        Arc::clone(GLOBAL.get_or_init(|| Arc::new(Self::new())))
    }

    /// The lock for `id`, shared with every live sink on the same destination.
    #[must_use]
    pub fn lock_for(&self, id: DestinationId) -> Arc<DestinationLock> {
        let mut locks = self.locks.lock();
        if let Some(existing) = locks.get(&id).and_then(Weak::upgrade) {
            return existing;
        }
        locks.retain(|_, lock| lock.strong_count() > 0);
        let lock = Arc::new(Mutex::new(()));
        locks.insert(id, Arc::downgrade(&lock));
        lock
    }

    /// Destinations with at least one live sink.
    #[must_use]
    pub fn live_destinations(&self) -> usize {
        self.locks
            .lock()
            .values()
            .filter(|lock| lock.strong_count() > 0)
            .count()
    }
}

/// One destination with its level gate and its shared lock.
pub struct Sink {
    destination_id: DestinationId,
    min_level: Level,
    levels: LevelSet,
    lock: Arc<DestinationLock>,
    writer: Mutex<Box<dyn Write + Send>>,
}

impl Sink {
    /// Registers with the global [`LockRegistry`].
    #[must_use]
    pub fn new(destination: Destination, min_level: Level) -> Self {
        Self::with_registry(destination, min_level, &LockRegistry::global())
    }

    /// Takes the destination's lock from `registry`, shared with any live
    /// sink on the same destination.
    #[must_use]
    pub fn with_registry(destination: Destination, min_level: Level, registry: &LockRegistry) -> Self {
        let destination_id = destination.identity();
        let lock = registry.lock_for(destination_id);
        internal::debug(
            "SINK",
            &format!("sink on {destination_id:?} at {}", min_level.as_str()),
        );
        Self {
            destination_id,
            min_level,
            levels: LevelSet::from_min(min_level),
            lock,
            writer: Mutex::new(destination.into_writer()),
        }
    }

    /// Whether a record at `level` is written here. ERROR and CRITICAL
    /// always are.
    #[must_use]
    pub fn enabled(&self, level: Level) -> bool {
        self.levels.contains(level)
    }

    /// Enabled levels, computed once from the minimum.
    #[must_use]
    pub const fn levels(&self) -> LevelSet {
        self.levels
    }

    #[must_use]
    pub const fn min_level(&self) -> Level {
        self.min_level
    }

    #[must_use]
    pub const fn destination_id(&self) -> DestinationId {
        self.destination_id
    }

    /// Whether both sinks serialize on the same destination lock.
    #[must_use]
    pub fn shares_lock_with(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.lock, &other.lock)
    }

    /// Writes `payload` and a newline under the destination lock, then flushes.
    ///
    /// Each step is attempted even if an earlier one failed.
    ///
    /// # Errors
    /// The first I/O error of the three steps.
    pub fn write_line(&self, payload: &[u8]) -> Result<(), Error> {
        let _exclusive = self.lock.lock();
        let mut writer = self.writer.lock();
        let body = writer.write_all(payload);
        let newline = writer.write_all(b"\n");
        let flushed = writer.flush();
        body.and(newline).and(flushed).map_err(Error::from)
    }

    /// Writes `payload` as-is under the destination lock, then flushes. For
    /// output that is not a record line.
    ///
    /// # Errors
    /// The first I/O error of the two steps.
    pub fn write_raw(&self, payload: &[u8]) -> Result<(), Error> {
        let _exclusive = self.lock.lock();
        let mut writer = self.writer.lock();
        let body = writer.write_all(payload);
        let flushed = writer.flush();
        body.and(flushed).map_err(Error::from)
    }

    /// Flushes under the destination lock.
    ///
    /// # Errors
    /// When the underlying writer fails to flush.
    pub fn flush(&self) -> Result<(), Error> {
        let _exclusive = self.lock.lock();
        self.writer.lock().flush().map_err(Error::from)
    }
}

impl fmt::Debug for Sink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sink")
            .field("destination_id", &self.destination_id)
            .field("min_level", &self.min_level)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writers_never_share_locks() {
        let registry = LockRegistry::new();
        let a = Sink::with_registry(Destination::writer(Vec::new()), Level::Info, &registry);
        let b = Sink::with_registry(Destination::writer(Vec::new()), Level::Info, &registry);
        assert!(!a.shares_lock_with(&b));
        assert_eq!(registry.live_destinations(), 2);
    }

    #[test]
    fn dropped_sinks_release_registry_entries() {
        let registry = LockRegistry::new();
        let sink = Sink::with_registry(Destination::writer(io::sink()), Level::Info, &registry);
        drop(sink);
        assert_eq!(registry.live_destinations(), 0);
    }

    #[test]
    fn gate_keeps_errors() {
        let sink = Sink::with_registry(
            Destination::writer(io::sink()),
            Level::Critical,
            &LockRegistry::new(),
        );
        assert!(sink.enabled(Level::Error));
        assert!(!sink.enabled(Level::Warn));
    }
}
