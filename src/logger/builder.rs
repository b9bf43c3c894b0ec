//! Stepwise construction of a [`Logger`], with a sub-builder per sink.

use super::{Core, Logger};
use crate::error::Error;
use crate::fmt::{Format, TimeDisplay};
use crate::inspect::{Limits, Reflect};
use crate::internal;
use crate::level::{Level, LevelSet};
use crate::pool::WorkerPool;
use crate::record::{MetaFields, host_name, pid};
use crate::session::SessionCoordinator;
use crate::sink::{Destination, LockRegistry, Sink};
use std::fs::File;
use std::io::{IsTerminal, Write};
use std::path::Path;
use std::sync::Arc;

/// Fallback application name when none is configured.
pub const APP_NAME_ENV: &str = "JLOG_APP_NAME";
const DEFAULT_APP_NAME: &str = "default";

enum PendingSink {
    Built(Arc<Sink>),
    /// Opened at `build` so the registry choice applies regardless of call order.
    Pending(Destination, Option<Level>),
}

pub struct LoggerBuilder {
    app_name: Option<String>,
    host_name: Option<String>,
    level: Level,
    sinks: Vec<PendingSink>,
    format: Option<Format>,
    colors: Option<bool>,
    time: TimeDisplay,
    limits: Limits,
    capture_stack: bool,
    pool: Option<Arc<WorkerPool>>,
    coordinator: Option<Arc<SessionCoordinator>>,
    registry: Option<Arc<LockRegistry>>,
    env_prefix: Option<String>,
    meta: MetaFields,
    high_perf: bool,
}

impl Default for LoggerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl LoggerBuilder {
    /// Info level, format detected from the terminal, shared pool and coordinator.
    #[must_use]
    pub fn new() -> Self {
        Self {
            app_name: None,
            host_name: None,
            level: Level::Info,
            sinks: Vec::new(),
            format: None,
            colors: None,
            time: TimeDisplay::Utc,
            limits: Limits::default(),
            capture_stack: true,
            pool: None,
            coordinator: None,
            registry: None,
            env_prefix: None,
            meta: MetaFields::new(),
            high_perf: false,
        }
    }

    #[must_use]
    pub fn app_name(mut self, name: impl Into<String>) -> Self {
        self.app_name = Some(name.into());
        self
    }

    #[must_use]
    pub fn host_name(mut self, name: impl Into<String>) -> Self {
        self.host_name = Some(name.into());
        self
    }

    /// Logger minimum level; also the default for sinks without their own.
    #[must_use]
    pub const fn level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    #[must_use]
    pub const fn format(mut self, format: Format) -> Self {
        self.format = Some(format);
        self
    }

    #[must_use]
    pub const fn colors(mut self, enabled: bool) -> Self {
        self.colors = Some(enabled);
        self
    }

    #[must_use]
    pub const fn time(mut self, time: TimeDisplay) -> Self {
        self.time = time;
        self
    }

    #[must_use]
    pub const fn limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    #[must_use]
    pub const fn capture_stack(mut self, enabled: bool) -> Self {
        self.capture_stack = enabled;
        self
    }

    /// See [`Logger::with_high_perf`].
    #[must_use]
    pub const fn high_perf(mut self, enabled: bool) -> Self {
        self.high_perf = enabled;
        self
    }

    /// A private pool instead of [`WorkerPool::shared`].
    #[must_use]
    pub fn pool(mut self, pool: Arc<WorkerPool>) -> Self {
        self.pool = Some(pool);
        self
    }

    /// A private coordination point instead of [`SessionCoordinator::global`].
    #[must_use]
    pub fn coordinator(mut self, coordinator: Arc<SessionCoordinator>) -> Self {
        self.coordinator = Some(coordinator);
        self
    }

    /// Registry used for the sinks opened by this builder.
    #[must_use]
    pub fn registry(mut self, registry: Arc<LockRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Environment variables starting with `prefix` become meta fields.
    #[must_use]
    pub fn env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = Some(prefix.into());
        self
    }

    #[must_use]
    pub fn meta_field(mut self, key: impl Into<String>, value: &dyn Reflect) -> Self {
        self.meta.insert(key, value);
        self
    }

    #[must_use]
    pub fn meta(mut self, fields: &MetaFields) -> Self {
        self.meta.merge(fields);
        self
    }

    #[must_use]
    pub fn stdout(self) -> SinkBuilder {
        self.destination(Destination::Stdout)
    }

    #[must_use]
    pub fn stderr(self) -> SinkBuilder {
        self.destination(Destination::Stderr)
    }

    #[must_use]
    pub fn file(self, file: File) -> SinkBuilder {
        self.destination(Destination::File(file))
    }

    /// Appends to `path`, creating it and its parent directories.
    ///
    /// # Errors
    /// When the file cannot be opened.
    pub fn path(self, path: impl AsRef<Path>) -> Result<SinkBuilder, Error> {
        let destination = Destination::append(path)?;
        Ok(self.destination(destination))
    }

    #[must_use]
    pub fn writer(self, writer: impl Write + Send + 'static) -> SinkBuilder {
        self.destination(Destination::writer(writer))
    }

    #[must_use]
    pub fn destination(self, destination: Destination) -> SinkBuilder {
        SinkBuilder {
            parent: self,
            destination,
            level: None,
        }
    }

    /// An already built sink, possibly shared with other loggers.
    #[must_use]
    pub fn sink(mut self, sink: Arc<Sink>) -> Self {
        self.sinks.push(PendingSink::Built(sink));
        self
    }

    /// Without any sink, the logger writes to stdout at its own level.
    #[must_use]
    pub fn build(self) -> Logger {
        let registry = self.registry.unwrap_or_else(LockRegistry::global);
        let mut pending = self.sinks;
        if pending.is_empty() {
            pending.push(PendingSink::Pending(Destination::Stdout, None));
        }
        let sinks: Vec<Arc<Sink>> = pending
            .into_iter()
            .map(|sink| match sink {
                PendingSink::Built(sink) => sink,
                PendingSink::Pending(destination, level) => Arc::new(Sink::with_registry(
                    destination,
                    level.unwrap_or(self.level),
                    &registry,
                )),
            })
            .collect();
        let console_out = Arc::new(Sink::with_registry(Destination::Stdout, Level::Trace, &registry));
        let console_err = Arc::new(Sink::with_registry(Destination::Stderr, Level::Trace, &registry));
        let sink_levels = sinks
            .iter()
            .fold(LevelSet::from_min(Level::Critical), |set, sink| {
                set.union(sink.levels())
            });

        let mut meta = self
            .env_prefix
            .as_deref()
            .map(MetaFields::from_env)
            .unwrap_or_default();
        meta.merge(&self.meta);

        let format = self.format.unwrap_or_else(Format::detect);
        let colors = self
            .colors
            .unwrap_or_else(|| std::io::stdout().is_terminal());
        let app_name = self
            .app_name
            .or_else(|| std::env::var(APP_NAME_ENV).ok().filter(|n| !n.is_empty()))
            .unwrap_or_else(|| DEFAULT_APP_NAME.to_string());
        let host_name = self
            .host_name
            .unwrap_or_else(|| host_name().to_string());

        internal::debug(
            "LOGGER",
            &format!(
                "built {app_name}: {} sink(s), {format}, min level {}",
                sinks.len(),
                self.level.as_str()
            ),
        );

        Logger {
            core: Arc::new(Core {
                app_name: Arc::from(app_name),
                host_name: Arc::from(host_name),
                pid: pid(),
                sinks,
                sink_levels,
                format,
                colors,
                time: self.time,
                limits: self.limits,
                capture_stack: self.capture_stack,
                pool: self.pool.unwrap_or_else(WorkerPool::shared),
                coordinator: self.coordinator.unwrap_or_else(SessionCoordinator::global),
                console_out,
                console_err,
            }),
            meta: Arc::new(meta),
            levels: LevelSet::from_min(self.level),
            session: None,
            high_perf: self.high_perf,
        }
    }
}

/// One sink under construction; `done` returns to the logger builder.
pub struct SinkBuilder {
    parent: LoggerBuilder,
    destination: Destination,
    level: Option<Level>,
}

impl SinkBuilder {
    /// Sink minimum level; defaults to the logger's.
    #[must_use]
    pub const fn level(mut self, level: Level) -> Self {
        self.level = Some(level);
        self
    }

    #[must_use]
    pub fn done(mut self) -> LoggerBuilder {
        self.parent
            .sinks
            .push(PendingSink::Pending(self.destination, self.level));
        self.parent
    }
}
