//! `jlog` - structured logging for values of any shape.
//!
//! Every argument of a log call is inspected into a bounded, owned tree
//! (cycles, locked mutexes, dead weak pointers and oversized containers all
//! degrade to placeholders), then encoded either as one JSON array per line or
//! as a colored human-readable line. Structured lines are encoded and written
//! on a small worker pool; every destination has exactly one lock, so lines
//! from concurrent loggers never interleave.
//!
//! # Example
//!
//! ```
//! use jlog::{Level, Logger, info, meta};
//!
//! let logger = Logger::builder()
//!     .app_name("billing")
//!     .level(Level::Debug)
//!     .stderr()
//!         .level(Level::Info)
//!         .done()
//!     .build();
//!
//! let request = logger.with_field("request_id", &"r-42");
//! info!(request, "charged", 1299_u64, meta!("currency" => "EUR"));
//! request.flush().unwrap();
//! ```
//!
//! Structured output has the shape
//! `["@bunion:v1", app, LEVEL, pid, host, timestamp, {meta}, [args...]]`.

pub mod config;
pub mod error;
pub mod fmt;
pub mod inspect;
pub mod internal;
pub mod level;
pub mod logger;
pub mod pool;
pub mod record;
pub mod session;
pub mod sink;

pub use config::Config;
pub use error::Error;
pub use fmt::{Format, TimeDisplay};
pub use inspect::{
    AsDebug, AsDisplay, InspectableValue, Inspector, Limits, Reflect, Reflection, inspect,
    inspect_shallow,
};
pub use level::{Level, LevelSet};
pub use logger::{Logger, LoggerBuilder, Session, SinkBuilder};
pub use pool::{PoolConfig, WorkerPool};
pub use record::{Arg, LogId, LogRecord, MetaFields, log_id};
pub use session::{SessionCoordinator, SessionId, Ticket};
pub use sink::{Destination, DestinationId, LockRegistry, Sink};

/// Logs at an explicit level: `log!(logger, Level::Warn, a, b, ...)`.
///
/// Each argument is borrowed; [`MetaFields`] and [`LogId`] arguments are
/// merged into the record's meta object, everything else must implement
/// [`Reflect`].
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr $(, $arg:expr)* $(,)?) => {
        $logger.log($level, &[$($crate::Arg::from(&$arg)),*])
    };
}

#[macro_export]
macro_rules! trace {
    ($logger:expr $(, $arg:expr)* $(,)?) => {
        $crate::log!($logger, $crate::Level::Trace $(, $arg)*)
    };
}

#[macro_export]
macro_rules! debug {
    ($logger:expr $(, $arg:expr)* $(,)?) => {
        $crate::log!($logger, $crate::Level::Debug $(, $arg)*)
    };
}

#[macro_export]
macro_rules! info {
    ($logger:expr $(, $arg:expr)* $(,)?) => {
        $crate::log!($logger, $crate::Level::Info $(, $arg)*)
    };
}

#[macro_export]
macro_rules! warn {
    ($logger:expr $(, $arg:expr)* $(,)?) => {
        $crate::log!($logger, $crate::Level::Warn $(, $arg)*)
    };
}

#[macro_export]
macro_rules! error {
    ($logger:expr $(, $arg:expr)* $(,)?) => {
        $crate::log!($logger, $crate::Level::Error $(, $arg)*)
    };
}

#[macro_export]
macro_rules! critical {
    ($logger:expr $(, $arg:expr)* $(,)?) => {
        $crate::log!($logger, $crate::Level::Critical $(, $arg)*)
    };
}

/// Formatted single-message variant: `logf!(logger, Level::Info, "{} items", n)`.
#[macro_export]
macro_rules! logf {
    ($logger:expr, $level:expr, $($fmt:tt)+) => {
        $logger.log_fmt($level, ::core::format_args!($($fmt)+))
    };
}

/// Builds [`MetaFields`] from `key => value` pairs.
#[macro_export]
macro_rules! meta {
    ($($key:expr => $value:expr),* $(,)?) => {{
        #[allow(unused_mut)]
        let mut fields = $crate::MetaFields::new();
        $(fields.insert($key, &$value);)*
        fields
    }};
}
