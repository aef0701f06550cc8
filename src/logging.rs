//! Structured logging setup.
//!
//! The crate emits `tracing` events with structured fields. Applications
//! install a subscriber once at startup, either their own or the one built
//! here from [`LogConfig`]:
//!
//! ```rust,no_run
//! use oasbridge::logging::{init_logging_with_config, LogConfig};
//!
//! init_logging_with_config(&LogConfig::from_env()).unwrap();
//! ```
//!
//! | Variable | Default | Meaning |
//! |----------|---------|---------|
//! | `OASB_LOG_LEVEL` | `info` | trace/debug/info/warn/error |
//! | `OASB_LOG_FORMAT` | `json` | json/pretty |
//! | `OASB_LOG_TARGET_FILTER` | unset | extra comma-separated directives, e.g. `oasbridge::decorators=debug` |
//! | `OASB_LOG_INCLUDE_LOCATION` | `false` | add file and line to each event |
//!
//! `RUST_LOG`, when set, replaces the level.

use crate::config::parse_bool;
use anyhow::{Context, Result};
use std::env;
use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Log format: JSON for production, pretty-print for development
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Pretty,
}

impl LogFormat {
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "pretty" => LogFormat::Pretty,
            _ => LogFormat::Json,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// trace/debug/info/warn/error
    pub log_level: String,
    pub format: LogFormat,
    /// Extra filter directives, comma-separated
    pub target_filter: Option<String>,
    /// Include file:line location
    pub include_location: bool,
}

impl LogConfig {
    pub fn from_env() -> Self {
        let var = |name: &str| env::var(name).ok().filter(|v| !v.trim().is_empty());
        Self {
            log_level: var("OASB_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            format: var("OASB_LOG_FORMAT").map_or(LogFormat::Json, |f| LogFormat::parse(&f)),
            target_filter: var("OASB_LOG_TARGET_FILTER"),
            include_location: var("OASB_LOG_INCLUDE_LOCATION")
                .and_then(|v| parse_bool(&v))
                .unwrap_or(false),
        }
    }

    pub fn default_dev() -> Self {
        Self {
            log_level: "debug".to_string(),
            format: LogFormat::Pretty,
            target_filter: None,
            include_location: true,
        }
    }

    pub fn default_prod() -> Self {
        Self {
            log_level: "info".to_string(),
            format: LogFormat::Json,
            target_filter: None,
            include_location: false,
        }
    }

    fn level(&self) -> Level {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        }
    }

    fn env_filter(&self) -> Result<EnvFilter> {
        let base = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.level().as_str()));
        let mut directives = self
            .target_filter
            .iter()
            .flat_map(|f| f.split(','))
            .map(str::trim)
            .filter(|d| !d.is_empty());
        directives.try_fold(base, |filter, directive| {
            let parsed = directive
                .parse()
                .with_context(|| format!("invalid log filter directive '{directive}'"))?;
            Ok(filter.add_directive(parsed))
        })
    }
}

/// Install the global subscriber.
///
/// # Errors
///
/// Fails on an unparsable `target_filter` directive, or when a global
/// subscriber is already installed.
pub fn init_logging_with_config(config: &LogConfig) -> Result<()> {
    let fmt_layer = match config.format {
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_current_span(true)
            .with_target(true)
            .with_thread_ids(true)
            .with_file(config.include_location)
            .with_line_number(config.include_location)
            .boxed(),
        LogFormat::Pretty => tracing_subscriber::fmt::layer()
            .pretty()
            .with_target(true)
            .with_file(config.include_location)
            .with_line_number(config.include_location)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(config.env_filter()?)
        .with(fmt_layer)
        .try_init()
        .context("a global tracing subscriber is already installed")
}
