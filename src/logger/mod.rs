//! The logging façade: gate, collect meta, inspect, then hand the record to
//! the pool (structured) or write it in place (pretty, or inside a session).
//!
//! Pooled records take a ticket from the session coordinator at submission,
//! so a session opened later waits for exactly the records submitted before
//! it and never for the pool as a whole.
//!
//! A `Logger` is cheap to clone. Everything shared lives behind one `Arc`;
//! the per-logger parts (meta fields, level set, session id) are copied into
//! children and never mutated after construction.

mod builder;
mod from_config;
mod session;
mod stack;

pub use builder::{LoggerBuilder, SinkBuilder};
pub use session::Session;

use crate::error::Error;
use crate::fmt::{Format, TimeDisplay, render_line};
use crate::inspect::cleanup::clean;
use crate::inspect::{InspectableValue, Inspector, Limits, Reflect, inspect_shallow};
use crate::internal;
use crate::level::{Level, LevelSet};
use crate::pool::WorkerPool;
use crate::record::{Arg, LOG_ID_KEY, LOG_NUM_KEY, LogId, LogRecord, MetaFields, next_sequence};
use crate::session::{SessionCoordinator, SessionId, Ticket, WriteGuard};
use crate::sink::Sink;
use chrono::Utc;
use std::fmt;
use std::sync::Arc;

/// State shared by a logger and everything derived from it.
struct Core {
    app_name: Arc<str>,
    host_name: Arc<str>,
    pid: u32,
    sinks: Vec<Arc<Sink>>,
    /// Union of the sinks' level sets.
    sink_levels: LevelSet,
    format: Format,
    colors: bool,
    time: TimeDisplay,
    limits: Limits,
    capture_stack: bool,
    pool: Arc<WorkerPool>,
    coordinator: Arc<SessionCoordinator>,
    /// Raw console writes; share their locks with any stdout/stderr sink.
    console_out: Arc<Sink>,
    console_err: Arc<Sink>,
}

impl Core {
    fn render(&self, record: &LogRecord) -> Option<String> {
        match self.format {
            Format::Structured => record.encode(),
            Format::Pretty => Some(render_line(record, self.colors, self.time)),
        }
    }

    /// Renders once, then writes to every sink that takes the level.
    fn write(&self, record: &LogRecord, holder: Option<SessionId>) {
        if let Some(line) = self.render(record) {
            self.write_admitted(record, &line, &self.coordinator.enter(holder));
        }
    }

    /// Pool side of [`write`](Self::write); the ticket drops with the job.
    fn write_submitted(&self, record: &LogRecord, ticket: &Ticket) {
        if let Some(line) = self.render(record) {
            self.write_admitted(record, &line, &self.coordinator.enter_submitted(ticket));
        }
    }

    fn write_admitted(&self, record: &LogRecord, line: &str, _admitted: &WriteGuard<'_>) {
        for sink in &self.sinks {
            if !sink.enabled(record.level) {
                continue;
            }
            if let Err(e) = sink.write_line(line.as_bytes()) {
                internal::error(
                    "SINK",
                    &format!(
                        "write of record {} to {:?} failed: {e}",
                        record.sequence,
                        sink.destination_id()
                    ),
                );
            }
        }
    }
}

#[derive(Clone)]
pub struct Logger {
    core: Arc<Core>,
    meta: Arc<MetaFields>,
    levels: LevelSet,
    session: Option<SessionId>,
    high_perf: bool,
}

impl Logger {
    #[must_use]
    pub fn builder() -> LoggerBuilder {
        LoggerBuilder::new()
    }

    /// A stdout logger for `app_name` with every other setting defaulted.
    #[must_use]
    pub fn new(app_name: impl Into<String>) -> Self {
        LoggerBuilder::new().app_name(app_name).build()
    }

    /// Whether a record at `level` would reach at least one sink.
    #[must_use]
    pub fn enabled(&self, level: Level) -> bool {
        self.levels.contains(level) && self.core.sink_levels.contains(level)
    }

    /// Emits one record.
    ///
    /// Positional [`MetaFields`] arguments are merged into the record's meta
    /// object, later ones winning, and a [`LogId`] is stored over them.
    /// Everything else is inspected on this thread and becomes payload. Never
    /// fails: encode and write errors are reported on the diagnostic channel.
    ///
    /// Structured records are written by the pool, so two records from one
    /// caller can reach a sink in a different order than they were logged.
    /// Each line carries `log_num`, which follows call order. Pretty lines
    /// and session lines are written before this returns, in order.
    pub fn log(&self, level: Level, args: &[Arg<'_>]) {
        if !self.enabled(level) {
            return;
        }

        let mut meta = MetaFields::clone(&self.meta);
        let mut inspector = Inspector::new(self.core.limits);
        let mut payload = Vec::with_capacity(args.len() + 1);
        let mut log_id: Option<&LogId> = None;
        for arg in args {
            match arg {
                Arg::Meta(fields) => meta.merge(fields),
                Arg::Id(id) => log_id = Some(*id),
                Arg::Value(value) if self.shallow_args() => payload.push(inspect_shallow(*value)),
                Arg::Value(value) => payload.push(inspector.inspect(*value)),
            }
        }
        // An explicit id beats a `log_id` key in positional meta.
        if let Some(id) = log_id {
            meta.insert_value(LOG_ID_KEY, InspectableValue::text(id.as_str()));
        }

        let sequence = next_sequence();
        meta.insert_value(LOG_NUM_KEY, InspectableValue::from(sequence));
        if self.core.capture_stack && level.is_always_enabled() {
            payload.push(stack::capture());
        }

        let record = LogRecord {
            timestamp: Utc::now(),
            level,
            app_name: Arc::clone(&self.core.app_name),
            host_name: Arc::clone(&self.core.host_name),
            pid: self.core.pid,
            meta,
            sequence,
            args: payload,
        };
        self.dispatch(record);
    }

    fn dispatch(&self, record: LogRecord) {
        if self.session.is_some() || self.core.format == Format::Pretty {
            self.core.write(&record, self.session);
            return;
        }
        let core = Arc::clone(&self.core);
        self.core.coordinator.submit(|ticket| {
            let pool = Arc::clone(&core.pool);
            pool.run(Box::new(move || core.write_submitted(&record, &ticket)));
        });
    }

    /// Pretty lines of a high-performance logger skip the full walk.
    fn shallow_args(&self) -> bool {
        self.high_perf && self.core.format == Format::Pretty
    }

    /// Emits a single pre-formatted message.
    pub fn log_fmt(&self, level: Level, message: fmt::Arguments<'_>) {
        if !self.enabled(level) {
            return;
        }
        let message = message.to_string();
        self.log(level, &[Arg::Value(&message)]);
    }

    pub fn trace(&self, args: &[Arg<'_>]) {
        self.log(Level::Trace, args);
    }

    pub fn debug(&self, args: &[Arg<'_>]) {
        self.log(Level::Debug, args);
    }

    pub fn info(&self, args: &[Arg<'_>]) {
        self.log(Level::Info, args);
    }

    pub fn warn(&self, args: &[Arg<'_>]) {
        self.log(Level::Warn, args);
    }

    /// Also attaches a stack trace unless capture is disabled.
    pub fn error(&self, args: &[Arg<'_>]) {
        self.log(Level::Error, args);
    }

    pub fn critical(&self, args: &[Arg<'_>]) {
        self.log(Level::Critical, args);
    }

    /// A logger sharing this one's sinks and pool, with `fields` merged over
    /// a copy of its meta fields.
    #[must_use]
    pub fn child(&self, fields: &MetaFields) -> Self {
        Self {
            meta: Arc::new(self.meta.merged(fields)),
            ..self.clone()
        }
    }

    #[must_use]
    pub fn with_field(&self, key: impl Into<String>, value: &dyn Reflect) -> Self {
        self.child(&MetaFields::new().with(key, value))
    }

    /// Same sinks with a different minimum level.
    #[must_use]
    pub fn with_level(&self, level: Level) -> Self {
        Self {
            levels: LevelSet::from_min(level),
            ..self.clone()
        }
    }

    /// In pretty format, render arguments one level deep instead of walking
    /// them. Structured records are always fully inspected.
    #[must_use]
    pub fn with_high_perf(&self, enabled: bool) -> Self {
        Self {
            high_perf: enabled,
            ..self.clone()
        }
    }

    #[must_use]
    pub const fn high_perf(&self) -> bool {
        self.high_perf
    }

    /// Writes a bare newline to stdout.
    pub fn newline(&self) {
        self.console(&self.core.console_out, b"\n");
    }

    /// Writes `count` spaces to stdout, without a newline.
    pub fn spaces(&self, count: usize) {
        self.console(&self.core.console_out, " ".repeat(count).as_bytes());
    }

    /// Writes `count` tabs to stdout, without a newline.
    pub fn tabs(&self, count: usize) {
        self.console(&self.core.console_out, "\t".repeat(count).as_bytes());
    }

    /// Writes each value as `((type) value) ` and a newline to stdout, with no
    /// record framing and no level gate.
    pub fn plain_stdout(&self, values: &[&dyn Reflect]) {
        let line = plain_line(values);
        self.console(&self.core.console_out, line.as_bytes());
    }

    /// [`plain_stdout`](Self::plain_stdout) for stderr.
    pub fn plain_stderr(&self, values: &[&dyn Reflect]) {
        let line = plain_line(values);
        self.console(&self.core.console_err, line.as_bytes());
    }

    /// Raw bytes through the console lock and the session gate.
    fn console(&self, sink: &Sink, bytes: &[u8]) {
        let _admitted = self.core.coordinator.enter(self.session);
        if let Err(e) = sink.write_raw(bytes) {
            internal::error(
                "SINK",
                &format!("raw write to {:?} failed: {e}", sink.destination_id()),
            );
        }
    }

    /// A correlation id to pass as an argument.
    #[must_use]
    pub fn id(&self, id: impl Into<String>) -> LogId {
        LogId::new(id)
    }

    /// Opens an exclusive session: until it is released, lines from loggers
    /// outside it wait, so the session's lines stay contiguous.
    ///
    /// Blocks while another session is open. A thread holding a session must
    /// log through it; logging through an outside logger from that thread
    /// would wait on itself.
    #[must_use]
    pub fn locked_session(&self) -> Session {
        Session::open(self)
    }

    /// Waits for records submitted through this logger's coordinator, then
    /// flushes every sink.
    ///
    /// Inside a session only the sinks are flushed: queued records from
    /// outside loggers cannot finish until the session is released.
    ///
    /// # Errors
    /// The first flush error among the sinks.
    pub fn flush(&self) -> Result<(), Error> {
        if self.session.is_none() {
            self.core.coordinator.wait_submitted();
        }
        let mut first = Ok(());
        for sink in &self.core.sinks {
            if let Err(e) = sink.flush()
                && first.is_ok()
            {
                first = Err(e);
            }
        }
        first
    }

    #[must_use]
    pub fn min_level(&self) -> Level {
        self.levels.min_level()
    }

    #[must_use]
    pub const fn levels(&self) -> LevelSet {
        self.levels
    }

    #[must_use]
    pub fn sink_count(&self) -> usize {
        self.core.sinks.len()
    }

    #[must_use]
    pub fn app_name(&self) -> &str {
        &self.core.app_name
    }

    #[must_use]
    pub fn host_name(&self) -> &str {
        &self.core.host_name
    }

    #[must_use]
    pub fn meta(&self) -> &MetaFields {
        &self.meta
    }

    #[must_use]
    pub fn format(&self) -> Format {
        self.core.format
    }

    /// The session this logger writes under, if any.
    #[must_use]
    pub const fn session_id(&self) -> Option<SessionId> {
        self.session
    }

    #[must_use]
    pub fn pool(&self) -> &Arc<WorkerPool> {
        &self.core.pool
    }

    #[must_use]
    pub fn coordinator(&self) -> &Arc<SessionCoordinator> {
        &self.core.coordinator
    }
}

/// `((type) value) ` per value, then a newline.
fn plain_line(values: &[&dyn Reflect]) -> String {
    let mut inspector = Inspector::new(Limits::default());
    let mut line = String::new();
    for value in values {
        let rendered = clean(&inspector.inspect(*value));
        line.push_str(&format!("(({}) {rendered}) ", value.type_label()));
    }
    line.push('\n');
    line
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("app_name", &self.core.app_name)
            .field("format", &self.core.format)
            .field("min_level", &self.min_level())
            .field("sinks", &self.core.sinks.len())
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::{Destination, LockRegistry};
    use std::io::{self, Write};
    use std::sync::Mutex;

    #[derive(Clone, Default)]
    struct Buffer(Arc<Mutex<Vec<u8>>>);

    impl Write for Buffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    fn logger(buffer: &Buffer, level: Level) -> Logger {
        Logger::builder()
            .app_name("unit")
            .format(Format::Pretty)
            .colors(false)
            .registry(Arc::new(LockRegistry::new()))
            .sink(Arc::new(Sink::new(
                Destination::writer(buffer.clone()),
                level,
            )))
            .build()
    }

    #[test]
    fn gated_levels_write_nothing() {
        let buffer = Buffer::default();
        let log = logger(&buffer, Level::Warn);
        log.info(&[Arg::from(&"hidden")]);
        assert!(buffer.0.lock().unwrap().is_empty());
        assert!(!log.enabled(Level::Info));
    }

    #[test]
    fn plain_lines_tag_each_value_with_its_type() {
        let line = plain_line(&[&"ready", &3_u16]);
        assert_eq!(line, "((str) \"ready\") ((u16) 3) \n");
        assert_eq!(plain_line(&[]), "\n");
    }

    #[test]
    fn raw_console_writes_pass_an_open_session() {
        let buffer = Buffer::default();
        let log = logger(&buffer, Level::Trace);
        let session = log.locked_session();
        session.spaces(2);
        session.tabs(1);
        session.newline();
        session.plain_stderr(&[&1_u8]);
        session.release();
        assert_eq!(log.coordinator().depth(), 0);
    }

    #[test]
    fn child_does_not_touch_parent_meta() {
        let buffer = Buffer::default();
        let parent = logger(&buffer, Level::Trace);
        let child = parent.with_field("request", &7u32);
        assert!(child.meta().contains_key("request"));
        assert!(!parent.meta().contains_key("request"));
    }
}
