//! Shared helpers for integration tests.

#![allow(dead_code)]

use jlog::{Format, Level, LockRegistry, Logger, LoggerBuilder, SessionCoordinator, WorkerPool};
use std::io::{self, Write};
use std::sync::{Arc, Mutex};

/// Cloneable in-memory writer; every clone appends to the same buffer.
#[derive(Clone, Default)]
pub struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }

    pub fn lines(&self) -> Vec<String> {
        self.contents().lines().map(str::to_string).collect()
    }

    /// Every line parsed as a JSON value.
    pub fn json_lines(&self) -> Vec<serde_json::Value> {
        self.lines()
            .iter()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// A builder isolated from process-wide state: own pool, registry and coordinator.
pub fn isolated(app: &str, format: Format) -> LoggerBuilder {
    Logger::builder()
        .app_name(app)
        .host_name("test-host")
        .format(format)
        .colors(false)
        .pool(Arc::new(WorkerPool::default()))
        .registry(Arc::new(LockRegistry::new()))
        .coordinator(Arc::new(SessionCoordinator::new()))
}

/// Structured logger writing every level into `buffer`.
pub fn json_logger(buffer: &SharedBuffer) -> Logger {
    isolated("test-app", Format::Structured)
        .level(Level::Trace)
        .writer(buffer.clone())
        .done()
        .build()
}
