//! Logger construction from a loaded [`Config`].

use super::{Logger, LoggerBuilder};
use crate::config::{Config, SinkConfig};
use crate::error::Error;
use crate::internal;
use crate::pool::{PoolConfig, WorkerPool};
use std::sync::Arc;

impl Logger {
    /// Loads the default config file and builds a logger for `app_name`,
    /// applying its `[apps.<app_name>]` overrides.
    ///
    /// # Errors
    /// When the config cannot be loaded or holds an invalid value.
    pub fn load(app_name: &str) -> Result<Self, Error> {
        internal::debug("LOGGER", "Building logger from config");
        let config = Config::load()?;
        Self::from_config(&config.for_app(app_name))
    }

    /// Builds a logger from `config` as-is.
    ///
    /// # Errors
    /// When a level, format, timezone or sink path in `config` is invalid.
    pub fn from_config(config: &Config) -> Result<Self, Error> {
        let level = config.parse_level()?;
        internal::debug("LOGGER", &format!("Log level: {}", level.as_str()));

        let mut builder = LoggerBuilder::new()
            .level(level)
            .format(config.parse_format()?)
            .time(config.parse_timezone()?)
            .limits(config.inspect.to_limits())
            .capture_stack(config.general.capture_stack);

        if let Some(app_name) = &config.general.app_name {
            builder = builder.app_name(app_name);
        }
        if let Some(host_name) = &config.general.host_name {
            builder = builder.host_name(host_name);
        }
        if let Some(colors) = config.general.colors {
            builder = builder.colors(colors);
        }
        if let Some(prefix) = &config.general.env_prefix {
            builder = builder.env_prefix(prefix);
        }
        for (key, value) in &config.meta {
            builder = builder.meta_field(key, value);
        }

        let pool_config = config.pool.to_pool_config();
        if pool_config != PoolConfig::default() {
            internal::debug(
                "LOGGER",
                &format!("Private pool with {} workers", pool_config.size),
            );
            builder = builder.pool(Arc::new(WorkerPool::new(pool_config)));
        }

        for sink in &config.sinks {
            builder = Self::configure_sink(builder, config, sink)?;
        }
        if config.sinks.is_empty() {
            internal::debug("LOGGER", "No sinks configured, using stdout");
        }

        Ok(builder.build())
    }

    fn configure_sink(
        builder: LoggerBuilder,
        config: &Config,
        sink: &SinkConfig,
    ) -> Result<LoggerBuilder, Error> {
        let level = config.sink_level(sink)?;
        let target = sink.target.trim();
        internal::debug(
            "SINK",
            &format!("Configuring sink {target} at {}", level.as_str()),
        );
        let sink_builder = match target.to_lowercase().as_str() {
            "stdout" | "-" => builder.stdout(),
            "stderr" => builder.stderr(),
            "" => {
                return Err(Error::InvalidConfig("sink target is empty".to_string()));
            }
            _ => builder.path(Config::expand_target(target))?,
        };
        Ok(sink_builder.level(level).done())
    }
}
